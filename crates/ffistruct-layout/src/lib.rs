//! C-style memory layout for declaratively described records.
//!
//! A schema is a tree of [`Field`]s. [`compute_layout`] turns a node plus a
//! [`PackWidth`] into its size, alignment and member offsets, following the
//! usual C rules with every alignment clamped to the pack width (like
//! `#pragma pack(N)`). Strings, opaque pointers, dynamic arrays and
//! pointer-flagged fields are all stored as one pointer of pack width.

mod array;
pub mod codec;
pub mod error;
pub mod field;
pub mod helpers;
mod record;
pub mod value;

pub use codec::{configure, current, current_pack, CodecConfig, FnCodec, PackWidth, StringCodec};
pub use error::{LayoutError, LayoutResult};
pub use field::{
    array, bool, dynamic_array, f32, f64, i16, i32, i64, i8, opaque, pointer, string, structure,
    u16, u32, u64, u8, union, Field, FieldKind, Primitive,
};
pub use helpers::align_to;
pub use value::Value;

/// Placement of one record member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffset {
    pub offset: usize,
    pub size: usize,
}

/// Computed size and alignment of a schema node.
///
/// `fields` is present for records only and runs parallel to the record's
/// members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub size: usize,
    pub align: usize,
    pub fields: Option<Box<[FieldOffset]>>,
}

impl Layout {
    pub(crate) fn scalar(size: usize, align: usize) -> Self {
        Layout {
            size,
            align,
            fields: None,
        }
    }

    /// Offset of the `index`-th record member.
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        self.fields
            .as_ref()
            .and_then(|fields| fields.get(index))
            .map(|f| f.offset)
    }
}

/// Recursive layout computation for a fixed pack width.
#[derive(Debug, Clone, Copy)]
pub struct LayoutComputer {
    pack: PackWidth,
}

impl LayoutComputer {
    pub fn new(pack: PackWidth) -> Self {
        LayoutComputer { pack }
    }

    pub fn pack(&self) -> PackWidth {
        self.pack
    }

    /// Computes the layout of `field`.
    ///
    /// Fails with [`LayoutError::SizeOverflow`] when the layout does not fit
    /// in the address space.
    pub fn compute(&self, field: &Field) -> LayoutResult<Layout> {
        if field.force_pointer {
            return Ok(helpers::pointer_layout(self.pack));
        }
        match &field.kind {
            FieldKind::Primitive(p) => Ok(Layout::scalar(
                p.size(),
                helpers::clamp_align(p.size(), self.pack),
            )),
            FieldKind::String | FieldKind::Pointer => Ok(helpers::pointer_layout(self.pack)),
            FieldKind::Array {
                element,
                length: Some(length),
            } => self.compute_array_layout(element, *length),
            FieldKind::Array { length: None, .. } => Ok(helpers::pointer_layout(self.pack)),
            FieldKind::Record { members, is_union } => {
                self.compute_record_layout(members, *is_union)
            }
        }
    }
}

/// Computes size, alignment and member offsets of `field` under `pack`.
pub fn compute_layout(field: &Field, pack: PackWidth) -> LayoutResult<Layout> {
    LayoutComputer::new(pack).compute(field)
}

/// Size of `field` under the configured default pack width.
///
/// Fails with [`LayoutError::NotConfigured`] before [`configure`] has run.
pub fn size_of(field: &Field) -> LayoutResult<usize> {
    size_of_with(field, current_pack()?)
}

/// Size of `field` under an explicit pack width.
pub fn size_of_with(field: &Field, pack: PackWidth) -> LayoutResult<usize> {
    Ok(compute_layout(field, pack)?.size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(layout: &Layout) -> Vec<usize> {
        layout
            .fields
            .as_ref()
            .expect("record layout")
            .iter()
            .map(|f| f.offset)
            .collect()
    }

    #[test]
    fn test_byte_then_word_pads_one_byte() {
        let s = structure([("byte", u8()), ("word", u16())]);
        let layout = compute_layout(&s, PackWidth::Eight).unwrap();
        assert_eq!(layout.size, 4);
        assert_eq!(layout.align, 2);
        assert_eq!(offsets(&layout), [0, 2]);
    }

    #[test]
    fn test_string_then_byte_pads_to_pointer() {
        let s = structure([("name", string()), ("age", u8())]);
        let layout = compute_layout(&s, PackWidth::Eight).unwrap();
        assert_eq!(layout.size, 16);
        assert_eq!(layout.align, 8);
        assert_eq!(offsets(&layout), [0, 8]);
    }

    #[test]
    fn test_pointer_width_follows_pack() {
        let s = structure([("name", string()), ("age", u8())]);
        let layout = compute_layout(&s, PackWidth::Four).unwrap();
        assert_eq!(layout.size, 8);
        assert_eq!(offsets(&layout), [0, 4]);
    }

    #[test]
    fn test_pack_clamps_alignment() {
        let s = structure([("a", u8()), ("b", f64()), ("c", u8())]);
        assert_eq!(compute_layout(&s, PackWidth::Eight).unwrap().size, 24);

        let packed = compute_layout(&s, PackWidth::Two).unwrap();
        assert_eq!(offsets(&packed), [0, 2, 10]);
        assert_eq!(packed.size, 12);
        assert_eq!(packed.align, 2);

        let tight = compute_layout(&s, PackWidth::One).unwrap();
        assert_eq!(offsets(&tight), [0, 1, 9]);
        assert_eq!(tight.size, 10);
    }

    #[test]
    fn test_union_overlays_members() {
        let u = union([("small", u8()), ("medium", u16()), ("big", u32())]);
        let layout = compute_layout(&u, PackWidth::Eight).unwrap();
        assert_eq!(offsets(&layout), [0, 0, 0]);
        assert_eq!(layout.size, 4);
        assert_eq!(layout.align, 4);
    }

    #[test]
    fn test_union_size_rounds_to_alignment() {
        let u = union([("bytes", array(u8(), Some(5))), ("word", u16())]);
        let layout = compute_layout(&u, PackWidth::Eight).unwrap();
        assert_eq!(layout.size, 6);
        assert_eq!(layout.align, 2);
    }

    #[test]
    fn test_empty_records() {
        let s = structure(Vec::<(String, Field)>::new());
        let layout = compute_layout(&s, PackWidth::Eight).unwrap();
        assert_eq!((layout.size, layout.align), (0, 1));
        assert_eq!(layout.fields.as_deref(), Some(&[][..]));

        let u = union(Vec::<(String, Field)>::new());
        let layout = compute_layout(&u, PackWidth::Eight).unwrap();
        assert_eq!((layout.size, layout.align), (0, 1));
    }

    #[test]
    fn test_pointer_flag_wins_over_kind() {
        let big = structure([("a", u64()), ("b", u64()), ("c", u64())]);
        let layout = compute_layout(&pointer(big), PackWidth::Eight).unwrap();
        assert_eq!((layout.size, layout.align), (8, 8));
        assert!(layout.fields.is_none());

        let layout = compute_layout(&pointer(u8()), PackWidth::Four).unwrap();
        assert_eq!((layout.size, layout.align), (4, 4));
    }

    #[test]
    fn test_arrays() {
        let fixed = array(u16(), Some(3));
        let layout = compute_layout(&fixed, PackWidth::Eight).unwrap();
        assert_eq!((layout.size, layout.align), (6, 2));

        let dynamic = dynamic_array(u16());
        let layout = compute_layout(&dynamic, PackWidth::Eight).unwrap();
        assert_eq!((layout.size, layout.align), (8, 8));
    }

    #[test]
    fn test_array_of_records_uses_padded_stride() {
        let element = structure([("x", u32()), ("tag", u8())]);
        let layout = compute_layout(&array(element, Some(3)), PackWidth::Eight).unwrap();
        assert_eq!(layout.size, 24);
        assert_eq!(layout.align, 4);
    }

    #[test]
    fn test_nested_records() {
        let inner = structure([("a", u8()), ("b", u32())]);
        let outer = structure([("flag", bool()), ("inner", inner), ("tail", u16())]);
        let layout = compute_layout(&outer, PackWidth::Eight).unwrap();
        assert_eq!(offsets(&layout), [0, 4, 12]);
        assert_eq!(layout.size, 16);
        assert_eq!(layout.align, 4);
    }

    #[test]
    fn test_deep_nesting() {
        let mut field = structure([("leaf", u16())]);
        for _ in 0..64 {
            field = structure([("pad", u8()), ("next", field)]);
        }
        let layout = compute_layout(&field, PackWidth::Eight).unwrap();
        assert_eq!(layout.align, 2);
        assert_eq!(layout.size, 2 * 64 + 2);
    }

    #[test]
    fn test_size_of_with_matches_compute() {
        let s = structure([("a", i32()), ("b", string()), ("c", array(f32(), Some(2)))]);
        let size = size_of_with(&s, PackWidth::Eight).unwrap();
        assert_eq!(size, compute_layout(&s, PackWidth::Eight).unwrap().size);
        assert_eq!(size, 24);
    }

    #[test]
    fn test_oversized_arrays_are_rejected() {
        let huge = array(u64(), Some(usize::MAX / 4));
        assert_eq!(
            compute_layout(&huge, PackWidth::Eight),
            Err(LayoutError::SizeOverflow { kind: "array" })
        );

        let wide = array(u8(), Some(usize::MAX));
        let s = structure([("tag", u8()), ("bytes", wide)]);
        assert_eq!(
            size_of_with(&s, PackWidth::Eight),
            Err(LayoutError::SizeOverflow { kind: "struct" })
        );
    }
}
