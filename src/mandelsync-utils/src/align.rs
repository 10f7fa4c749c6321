//! Alignment helpers for padded binary layouts.

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Computes the number of padding bytes needed to bring `value`
/// to the next multiple of `align`.
#[inline]
pub const fn padding(value: usize, align: usize) -> usize {
    align_up(value, align) - value
}
