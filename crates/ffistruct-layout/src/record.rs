use crate::error::{LayoutError, LayoutResult};
use crate::field::Field;
use crate::helpers::{checked_align_to, clamp_align};
use crate::{FieldOffset, Layout, LayoutComputer};
use indexmap::IndexMap;

impl LayoutComputer {
    /// Computes layout for a struct or union.
    ///
    /// Struct members are placed in declaration order, each at the next
    /// offset satisfying its (pack-clamped) alignment. Union members all sit
    /// at offset 0. The record's alignment is the largest member alignment,
    /// never less than 1, and its size is rounded up to that alignment.
    pub(crate) fn compute_record_layout(
        &self,
        members: &IndexMap<String, Field>,
        is_union: bool,
    ) -> LayoutResult<Layout> {
        let overflow = LayoutError::SizeOverflow {
            kind: if is_union { "union" } else { "struct" },
        };
        let mut cursor = 0usize;
        let mut max_align = 1usize;
        let mut max_size = 0usize;
        let mut fields = Vec::with_capacity(members.len());

        for member in members.values() {
            let member_layout = self.compute(member)?;
            let align = clamp_align(member_layout.align, self.pack);
            max_align = max_align.max(align);

            if is_union {
                max_size = max_size.max(member_layout.size);
                fields.push(FieldOffset {
                    offset: 0,
                    size: member_layout.size,
                });
            } else {
                let offset = checked_align_to(cursor, align).ok_or_else(|| overflow.clone())?;
                fields.push(FieldOffset {
                    offset,
                    size: member_layout.size,
                });
                cursor = offset
                    .checked_add(member_layout.size)
                    .ok_or_else(|| overflow.clone())?;
            }
        }

        let raw_size = if is_union { max_size } else { cursor };
        Ok(Layout {
            size: checked_align_to(raw_size, max_align).ok_or(overflow)?,
            align: max_align,
            fields: Some(fields.into_boxed_slice()),
        })
    }
}
