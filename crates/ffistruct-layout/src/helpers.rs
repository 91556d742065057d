use crate::codec::PackWidth;
use crate::Layout;

/// Rounds `offset` up to the next multiple of `align` (a power of two).
pub fn align_to(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two(), "alignment {} is not a power of two", align);
    let mask = align - 1;
    (offset + mask) & !mask
}

/// Like [`align_to`], but `None` when the result does not fit in `usize`.
pub fn checked_align_to(offset: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    offset.checked_add(mask).map(|end| end & !mask)
}

/// Clamps a natural alignment to the pack width.
pub fn clamp_align(natural: usize, pack: PackWidth) -> usize {
    natural.min(pack.bytes()).max(1)
}

/// Distance between consecutive elements of an inline array, or `None` if
/// padding the element overflows.
pub fn stride(element: &Layout, pack: PackWidth) -> Option<usize> {
    checked_align_to(element.size, clamp_align(element.align, pack))
}

/// Layout of anything stored as an address.
pub fn pointer_layout(pack: PackWidth) -> Layout {
    Layout::scalar(pack.bytes(), pack.bytes())
}
