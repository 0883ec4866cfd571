//! Power-of-two alignment helpers used when sizing stream storage.

/// Native word size; stream lengths are rounded to this.
pub const WORD_SIZE: usize = core::mem::size_of::<usize>();

/// Generate `align_down_$suffix`, `align_up_$suffix` and `is_aligned_$suffix`.
///
/// `alignment` must be a power of two; zero is treated as "no alignment".
/// `align_up` saturates instead of wrapping.
macro_rules! impl_align_fns {
    ($ty:ty, $suffix:ident) => {
        paste::paste! {
            #[inline(always)]
            pub const fn [<align_down_ $suffix>](value: $ty, alignment: $ty) -> $ty {
                if alignment == 0 {
                    return value;
                }
                value & !(alignment - 1)
            }

            #[inline(always)]
            pub const fn [<align_up_ $suffix>](value: $ty, alignment: $ty) -> $ty {
                if alignment == 0 {
                    return value;
                }
                value.saturating_add(alignment - 1) & !(alignment - 1)
            }

            #[inline(always)]
            pub const fn [<is_aligned_ $suffix>](value: $ty, alignment: $ty) -> bool {
                alignment == 0 || value & (alignment - 1) == 0
            }
        }
    };
}

impl_align_fns!(u32, u32);
impl_align_fns!(usize, usize);

/// Round `value` up to the next multiple of [`WORD_SIZE`].
#[inline(always)]
pub const fn align_up_word(value: usize) -> usize {
    align_up_usize(value, WORD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_usize() {
        assert_eq!(align_up_usize(13, 8), 16);
        assert_eq!(align_up_usize(16, 8), 16);
        assert_eq!(align_down_usize(13, 8), 8);
        assert_eq!(align_up_usize(7, 0), 7);
        assert!(is_aligned_usize(4096, 4096));
        assert!(!is_aligned_usize(4097, 4096));
    }

    #[test]
    fn test_align_saturates() {
        assert_eq!(align_up_u32(u32::MAX, 4), u32::MAX & !3);
    }

    #[test]
    fn test_align_word() {
        assert_eq!(align_up_word(1), WORD_SIZE);
        assert_eq!(align_up_word(WORD_SIZE + 1), 2 * WORD_SIZE);
        assert!(is_aligned_usize(align_up_word(5841), WORD_SIZE));
    }
}
