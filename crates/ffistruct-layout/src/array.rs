use crate::error::{LayoutError, LayoutResult};
use crate::field::Field;
use crate::helpers::{clamp_align, stride};
use crate::{Layout, LayoutComputer};

impl LayoutComputer {
    /// Computes layout for an inline (fixed-length) array.
    ///
    /// Elements are contiguous; each occupies one stride, the element size
    /// rounded up to the element's clamped alignment.
    pub(crate) fn compute_array_layout(&self, element: &Field, length: usize) -> LayoutResult<Layout> {
        let element_layout = self.compute(element)?;
        let size = stride(&element_layout, self.pack)
            .and_then(|element_stride| element_stride.checked_mul(length))
            .ok_or(LayoutError::SizeOverflow { kind: "array" })?;
        Ok(Layout::scalar(
            size,
            clamp_align(element_layout.align, self.pack),
        ))
    }
}
