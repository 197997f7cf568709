//! Element-at-a-time kernels.
//!
//! These are the reference implementations: every width the bit buffer
//! can express is handled, one value at a time. The [`super::wide`]
//! kernels fall back to these for page tails.

use super::bit_buffer::BitReader;
use super::bit_buffer::BitWriter;
use super::element::low_mask;
use super::sign_extend;
use super::Element;
use super::ScanMode;
use super::Stats;
use super::Width;

/// The smallest and largest value in `values`, if any.
pub(super) fn value_range<T: Element>(values: &[T]) -> Option<(T, T)> {
    let (&first, rest) = values.split_first()?;
    Some(rest.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// The smallest and largest delta between consecutive values, or `(0, 0)`
/// for fewer than two values.
pub(super) fn delta_range<T: Element>(values: &[T]) -> (i64, i64) {
    let mut pairs = values.windows(2).map(|pair| pair[1].delta(pair[0]));
    match pairs.next() {
        Some(first) => pairs.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))),
        None => (0, 0),
    }
}

/// The initial value of a page given its delta range: one step before
/// `x[0]` when all deltas are equal, `x[0]` otherwise.
pub(super) fn initial_value<T: Element>(page: &[T], dmin: i64, dmax: i64) -> T {
    match page {
        [x0, x1, ..] if dmin == dmax => x0.wrapping_sub(x1.wrapping_sub(*x0)),
        [x0, ..] => *x0,
        [] => T::default(),
    }
}

pub(super) fn absolute_stats<T: Element>(page: &[T], range: Option<(T, T)>) -> Stats<T> {
    let (amin, amax) = range.unwrap_or_default();
    let iv = match page.first() {
        Some(&x0) if amin == amax => x0,
        _ => T::default(),
    };
    Stats { mode: ScanMode::Absolute, amin, amax, iv, ..Stats::default() }
}

pub(super) fn delta_stats<T: Element>(page: &[T], (dmin, dmax): (i64, i64)) -> Stats<T> {
    let iv = initial_value(page, dmin, dmax);
    Stats { mode: ScanMode::Delta, dmin, dmax, iv, ..Stats::default() }
}

pub(super) fn combined_stats<T: Element>(
    page: &[T],
    range: Option<(T, T)>,
    (dmin, dmax): (i64, i64),
) -> Stats<T> {
    let (amin, amax) = range.unwrap_or_default();
    let iv = initial_value(page, dmin, dmax);
    Stats { mode: ScanMode::Combined, amin, amax, dmin, dmax, iv }
}

/// Absolute range of a page.
pub fn scan_absolute<T: Element>(page: &[T]) -> Stats<T> {
    absolute_stats(page, value_range(page))
}

/// Delta range of a page.
pub fn scan_delta<T: Element>(page: &[T]) -> Stats<T> {
    delta_stats(page, delta_range(page))
}

/// Absolute and delta ranges of a page.
pub fn scan_combined<T: Element>(page: &[T]) -> Stats<T> {
    combined_stats(page, value_range(page), delta_range(page))
}

/// Packs the low `width` bits of each value into `out`.
///
/// ## Returns
/// The number of bytes written
pub fn encode_absolute<T: Element>(values: &[T], width: Width, out: &mut [u8]) -> usize {
    let bits = width.bits();
    let mask = low_mask(bits);
    let mut writer = BitWriter::new(out);
    for value in values {
        writer.append(value.to_bits() & mask, bits);
    }
    writer.finish()
}

/// Unpacks values written by [`encode_absolute`]. Signed types are
/// sign-extended, unsigned types zero-extended.
pub fn decode_absolute<T: Element>(bytes: &[u8], width: Width, values: &mut [T]) {
    let bits = width.bits();
    let mut reader = BitReader::new(bytes);
    for slot in values.iter_mut() {
        let raw = reader.extract(bits);
        *slot = if T::SIGNED {
            T::from_bits(sign_extend(raw, bits) as u64)
        } else {
            T::from_bits(raw)
        };
    }
}

/// Packs the low `width` bits of each delta into `out`. The first delta
/// is taken from `prev`.
///
/// ## Returns
/// The last value encoded, or `prev` if `values` is empty
pub fn encode_delta<T: Element>(values: &[T], width: Width, mut prev: T, out: &mut [u8]) -> T {
    let bits = width.bits();
    let mask = low_mask(bits);
    let mut writer = BitWriter::new(out);
    for &value in values {
        writer.append(value.wrapping_sub(prev).to_bits() & mask, bits);
        prev = value;
    }
    writer.finish();
    prev
}

/// Unpacks values written by [`encode_delta`] with the same `prev`.
pub fn decode_delta<T: Element>(bytes: &[u8], width: Width, mut prev: T, values: &mut [T]) {
    let bits = width.bits();
    let mut reader = BitReader::new(bytes);
    for slot in values.iter_mut() {
        let delta = sign_extend(reader.extract(bits), bits);
        prev = prev.wrapping_add(T::from_bits(delta as u64));
        *slot = prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn scans_an_arithmetic_progression() {
        let page: Vec<i64> = (100..164).collect();
        let stats = scan_combined(&page);
        assert_eq!((stats.amin, stats.amax), (100, 163));
        assert_eq!((stats.dmin, stats.dmax), (1, 1));
        assert_eq!(stats.iv, 99);
    }

    #[test]
    fn scans_a_constant_page() {
        let page = [-7i32; 64];
        let stats = scan_combined(&page);
        assert_eq!((stats.dmin, stats.dmax), (0, 0));
        assert_eq!(stats.iv, -7);

        let stats = scan_absolute(&page);
        assert_eq!((stats.amin, stats.amax, stats.iv), (-7, -7, -7));
    }

    #[test]
    fn absolute_scan_zeroes_iv_for_varied_pages() {
        let stats = scan_absolute(&[3u64, 1, 4, 1, 5]);
        assert_eq!((stats.amin, stats.amax, stats.iv), (1, 5, 0));
    }

    #[test]
    fn unsigned_deltas_wrap_to_signed() {
        let stats = scan_delta(&[5u32, 3, 4, 0]);
        assert_eq!((stats.dmin, stats.dmax), (-4, 1));
        assert_eq!(stats.iv, 5);
    }

    #[test]
    fn single_value_pages() {
        let stats = scan_combined(&[42i64]);
        assert_eq!((stats.dmin, stats.dmax, stats.iv), (0, 0, 42));
    }

    #[test_case(Width::W3; "three bits")]
    #[test_case(Width::W8; "one byte")]
    #[test_case(Width::W12; "twelve bits")]
    #[test_case(Width::W24; "three bytes")]
    fn signed_absolute_values_sign_extend(width: Width) {
        let values = [-4i64, -1, 0, 1, 3];
        let mut out = vec![0u8; width.payload_bytes(values.len())];
        assert_eq!(encode_absolute(&values, width, &mut out), out.len());

        let mut decoded = [0i64; 5];
        decode_absolute(&out, width, &mut decoded);
        assert_eq!(decoded, values);
    }

    #[test]
    fn unsigned_absolute_values_zero_extend() {
        let values = [0u32, 200, 255, 17];
        let mut out = [0u8; 4];
        encode_absolute(&values, Width::W8, &mut out);
        assert_eq!(out, [0, 200, 255, 17]);

        let mut decoded = [0u32; 4];
        decode_absolute(&out, Width::W8, &mut decoded);
        assert_eq!(decoded, values);
    }

    #[test]
    fn deltas_restore_wrapping_sequences() {
        let values = [u64::MAX - 1, u64::MAX, 0, 1, u64::MAX];
        let mut out = [0u8; 5];
        let last = encode_delta(&values, Width::W8, values[0], &mut out);
        assert_eq!(last, u64::MAX);
        assert_eq!(out, [0, 1, 1, 1, 0xfe]);

        let mut decoded = [0u64; 5];
        decode_delta(&out, Width::W8, values[0], &mut decoded);
        assert_eq!(decoded, values);
    }
}
