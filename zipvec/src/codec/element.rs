//! Integer element types that a [`crate::PagedVec`] can hold.

use std::fmt::Debug;
use std::fmt::Display;

use super::Width;

/// A fixed-width integer stored in a paged vector.
///
/// All arithmetic the codecs perform on elements wraps, so the deltas of
/// any sequence of values are representable and decoding restores the
/// exact input.
pub trait Element:
    bytemuck::Pod + Default + Eq + Ord + Debug + Display + Send + Sync + 'static
{
    /// Number of bits in the type.
    const BITS: u32;
    /// Number of bytes in the type.
    const BYTES: usize;
    /// Whether the type is signed.
    const SIGNED: bool;
    /// The stored width of an uncompressed page of this type.
    const NATIVE: Width;
    /// The smallest value of the type.
    const MIN: Self;
    /// The largest value of the type.
    const MAX: Self;

    /// Raw bits of the value, sign-extended to 64 bits for signed types.
    fn to_bits(self) -> u64;

    /// Builds a value from the low `BITS` bits of `bits`.
    fn from_bits(bits: u64) -> Self;

    /// Wrapping addition.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Wrapping subtraction.
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// The wrapping difference `self - prev`, read as a signed value of
    /// the element's width and widened to `i64`.
    fn delta(self, prev: Self) -> i64;

    /// The value as an `i128`, for range checks that must not overflow.
    fn to_i128(self) -> i128;

    /// Reads a value stored little-endian at the start of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Writes the value little-endian at the start of `bytes`.
    fn write_le(self, bytes: &mut [u8]);
}

/// Sign-extends the low `width` bits of `bits`.
#[inline]
pub fn sign_extend(bits: u64, width: u32) -> i64 {
    match width {
        0 => 0,
        64.. => bits as i64,
        w => ((bits << (64 - w)) as i64) >> (64 - w),
    }
}

/// Mask for the low `width` bits.
#[inline]
pub const fn low_mask(width: u32) -> u64 {
    match width {
        0 => 0,
        64.. => u64::MAX,
        w => (1u64 << w) - 1,
    }
}

macro_rules! impl_element {
    ($t:ty, $signed:ty, $is_signed:expr, $native:expr) => {
        impl Element for $t {
            const BITS: u32 = <$t>::BITS;
            const BYTES: usize = std::mem::size_of::<$t>();
            const SIGNED: bool = $is_signed;
            const NATIVE: Width = $native;
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;

            #[inline]
            fn to_bits(self) -> u64 {
                // Widening through the signed counterpart sign-extends
                // signed types; unsigned types go straight to u64.
                if $is_signed {
                    self as $signed as i64 as u64
                } else {
                    self as u64
                }
            }

            #[inline]
            fn from_bits(bits: u64) -> Self {
                bits as $t
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn delta(self, prev: Self) -> i64 {
                <$t>::wrapping_sub(self, prev) as $signed as i64
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(raw)
            }

            #[inline]
            fn write_le(self, bytes: &mut [u8]) {
                bytes[..std::mem::size_of::<$t>()].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_element!(i32, i32, true, Width::W32);
impl_element!(u32, i32, false, Width::W32);
impl_element!(i64, i64, true, Width::W64);
impl_element!(u64, i64, false, Width::W64);
