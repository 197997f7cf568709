//! Lane-chunked kernels.
//!
//! Pages are processed eight values at a time. Scans keep one min/max
//! accumulator per lane and reduce at the end; packing assembles whole
//! machine words per chunk instead of pushing bytes through a bit buffer.
//! The loops are written so the compiler can vectorize them on targets
//! with wide registers. Odd widths pack in small groups:
//!
//! - 24 bits: four values in three `u32` words
//! - 48 bits: four values in three `u64` words
//!
//! The byte layout is identical to [`super::generic`]. Tails shorter than
//! a chunk, and widths that are not a whole number of bytes, go through
//! the generic kernels.

use super::element::low_mask;
use super::generic;
use super::sign_extend;
use super::Element;
use super::Stats;
use super::Width;

/// Values per chunk.
pub const LANES: usize = 8;

fn value_range<T: Element>(values: &[T]) -> Option<(T, T)> {
    let split = values.len() / LANES * LANES;
    let (head, tail) = values.split_at(split);

    let mut lo = [T::MAX; LANES];
    let mut hi = [T::MIN; LANES];
    for chunk in head.chunks_exact(LANES) {
        for lane in 0..LANES {
            lo[lane] = lo[lane].min(chunk[lane]);
            hi[lane] = hi[lane].max(chunk[lane]);
        }
    }

    let lanes = if head.is_empty() { None } else { Some((lo, hi)) };
    let reduced = lanes.map(|(lo, hi)| {
        let min = lo.into_iter().fold(T::MAX, T::min);
        let max = hi.into_iter().fold(T::MIN, T::max);
        (min, max)
    });

    match (reduced, generic::value_range(tail)) {
        (Some((a, b)), Some((c, d))) => Some((a.min(c), b.max(d))),
        (range, None) | (None, range) => range,
    }
}

fn delta_range<T: Element>(values: &[T]) -> (i64, i64) {
    if values.len() < 2 {
        return (0, 0);
    }
    let current = &values[1..];
    let previous = &values[..values.len() - 1];
    let split = current.len() / LANES * LANES;

    let mut lo = [i64::MAX; LANES];
    let mut hi = [i64::MIN; LANES];
    let chunks = current[..split].chunks_exact(LANES).zip(previous[..split].chunks_exact(LANES));
    for (cur, prev) in chunks {
        for lane in 0..LANES {
            let delta = cur[lane].delta(prev[lane]);
            lo[lane] = lo[lane].min(delta);
            hi[lane] = hi[lane].max(delta);
        }
    }

    // The tail starts one value early so its first delta is included.
    let (tail_lo, tail_hi) = if split < current.len() {
        generic::delta_range(&values[split..])
    } else {
        (i64::MAX, i64::MIN)
    };
    let dmin = lo.into_iter().fold(tail_lo, i64::min);
    let dmax = hi.into_iter().fold(tail_hi, i64::max);
    (dmin, dmax)
}

/// Absolute range of a page.
pub fn scan_absolute<T: Element>(page: &[T]) -> Stats<T> {
    generic::absolute_stats(page, value_range(page))
}

/// Delta range of a page.
pub fn scan_delta<T: Element>(page: &[T]) -> Stats<T> {
    generic::delta_stats(page, delta_range(page))
}

/// Absolute and delta ranges of a page.
pub fn scan_combined<T: Element>(page: &[T]) -> Stats<T> {
    generic::combined_stats(page, value_range(page), delta_range(page))
}

/// Whether `width` has a word-packing kernel here.
fn has_kernel(width: Width) -> bool {
    matches!(width.bits(), 8 | 16 | 24 | 32 | 48 | 64)
}

/// Packs one chunk of masked lanes into `bits` bytes of `out`.
#[inline]
fn pack_lanes(lanes: &[u64; LANES], bits: u32, out: &mut [u8]) {
    match bits {
        24 => {
            for (group, dst) in lanes.chunks_exact(4).zip(out.chunks_exact_mut(12)) {
                let [a, b, c, d] = [group[0], group[1], group[2], group[3]].map(|v| v as u32);
                let words = [a | b << 24, b >> 8 | c << 16, c >> 16 | d << 8];
                for (word, dst) in words.iter().zip(dst.chunks_exact_mut(4)) {
                    dst.copy_from_slice(&word.to_le_bytes());
                }
            }
        }
        48 => {
            for (group, dst) in lanes.chunks_exact(4).zip(out.chunks_exact_mut(24)) {
                let [a, b, c, d] = [group[0], group[1], group[2], group[3]];
                let words = [a | b << 48, b >> 16 | c << 32, c >> 32 | d << 16];
                for (word, dst) in words.iter().zip(dst.chunks_exact_mut(8)) {
                    dst.copy_from_slice(&word.to_le_bytes());
                }
            }
        }
        _ => {
            let per_word = (64 / bits) as usize;
            for (group, dst) in lanes.chunks_exact(per_word).zip(out.chunks_exact_mut(8)) {
                let word = group
                    .iter()
                    .enumerate()
                    .fold(0u64, |word, (k, &v)| word | v << (bits * k as u32));
                dst.copy_from_slice(&word.to_le_bytes());
            }
        }
    }
}

/// Unpacks one chunk of `bits` bytes into zero-extended lanes.
#[inline]
fn unpack_lanes(bytes: &[u8], bits: u32, lanes: &mut [u64; LANES]) {
    match bits {
        24 => {
            for (group, src) in lanes.chunks_exact_mut(4).zip(bytes.chunks_exact(12)) {
                let [w0, w1, w2] = read_words::<3, 4>(src).map(|w| w as u32);
                group[0] = (w0 & 0xff_ffff) as u64;
                group[1] = (w0 >> 24 | (w1 & 0xffff) << 8) as u64;
                group[2] = (w1 >> 16 | (w2 & 0xff) << 16) as u64;
                group[3] = (w2 >> 8) as u64;
            }
        }
        48 => {
            for (group, src) in lanes.chunks_exact_mut(4).zip(bytes.chunks_exact(24)) {
                let [w0, w1, w2] = read_words::<3, 8>(src);
                group[0] = w0 & 0xffff_ffff_ffff;
                group[1] = w0 >> 48 | (w1 & 0xffff_ffff) << 16;
                group[2] = w1 >> 32 | (w2 & 0xffff) << 32;
                group[3] = w2 >> 16;
            }
        }
        _ => {
            let per_word = (64 / bits) as usize;
            let mask = low_mask(bits);
            for (group, src) in lanes.chunks_exact_mut(per_word).zip(bytes.chunks_exact(8)) {
                let [word] = read_words::<1, 8>(src);
                for (k, lane) in group.iter_mut().enumerate() {
                    *lane = (word >> (bits * k as u32)) & mask;
                }
            }
        }
    }
}

/// Reads `N` little-endian words of `B` bytes each.
#[inline]
fn read_words<const N: usize, const B: usize>(src: &[u8]) -> [u64; N] {
    let mut words = [0u64; N];
    for (word, chunk) in words.iter_mut().zip(src.chunks_exact(B)) {
        let mut raw = [0u8; 8];
        raw[..B].copy_from_slice(chunk);
        *word = u64::from_le_bytes(raw);
    }
    words
}

/// Packs the low `width` bits of each value into `out`.
///
/// ## Returns
/// The number of bytes written
pub fn encode_absolute<T: Element>(values: &[T], width: Width, out: &mut [u8]) -> usize {
    if !has_kernel(width) {
        return generic::encode_absolute(values, width, out);
    }
    let bits = width.bits();
    let mask = low_mask(bits);
    let split = values.len() / LANES * LANES;
    let (head, tail) = values.split_at(split);

    let mut lanes = [0u64; LANES];
    for (chunk, dst) in head.chunks_exact(LANES).zip(out.chunks_exact_mut(bits as usize)) {
        for (lane, value) in lanes.iter_mut().zip(chunk) {
            *lane = value.to_bits() & mask;
        }
        pack_lanes(&lanes, bits, dst);
    }

    let done = split / LANES * bits as usize;
    done + generic::encode_absolute(tail, width, &mut out[done..])
}

/// Unpacks values written by [`encode_absolute`].
pub fn decode_absolute<T: Element>(bytes: &[u8], width: Width, values: &mut [T]) {
    if !has_kernel(width) {
        return generic::decode_absolute(bytes, width, values);
    }
    let bits = width.bits();
    let split = values.len() / LANES * LANES;
    let (head, tail) = values.split_at_mut(split);

    let mut lanes = [0u64; LANES];
    for (chunk, src) in head.chunks_exact_mut(LANES).zip(bytes.chunks_exact(bits as usize)) {
        unpack_lanes(src, bits, &mut lanes);
        for (slot, &raw) in chunk.iter_mut().zip(&lanes) {
            *slot = if T::SIGNED {
                T::from_bits(sign_extend(raw, bits) as u64)
            } else {
                T::from_bits(raw)
            };
        }
    }

    let done = split / LANES * bits as usize;
    generic::decode_absolute(&bytes[done..], width, tail);
}

/// Packs the low `width` bits of each delta into `out`. The first delta
/// is taken from `prev`.
///
/// ## Returns
/// The last value encoded, or `prev` if `values` is empty
pub fn encode_delta<T: Element>(values: &[T], width: Width, mut prev: T, out: &mut [u8]) -> T {
    if !has_kernel(width) {
        return generic::encode_delta(values, width, prev, out);
    }
    let bits = width.bits();
    let mask = low_mask(bits);
    let split = values.len() / LANES * LANES;
    let (head, tail) = values.split_at(split);

    let mut lanes = [0u64; LANES];
    for (chunk, dst) in head.chunks_exact(LANES).zip(out.chunks_exact_mut(bits as usize)) {
        for (lane, &value) in lanes.iter_mut().zip(chunk) {
            *lane = value.wrapping_sub(prev).to_bits() & mask;
            prev = value;
        }
        pack_lanes(&lanes, bits, dst);
    }

    let done = split / LANES * bits as usize;
    generic::encode_delta(tail, width, prev, &mut out[done..])
}

/// Unpacks values written by [`encode_delta`] with the same `prev`.
pub fn decode_delta<T: Element>(bytes: &[u8], width: Width, mut prev: T, values: &mut [T]) {
    if !has_kernel(width) {
        return generic::decode_delta(bytes, width, prev, values);
    }
    let bits = width.bits();
    let split = values.len() / LANES * LANES;
    let (head, tail) = values.split_at_mut(split);

    let mut lanes = [0u64; LANES];
    for (chunk, src) in head.chunks_exact_mut(LANES).zip(bytes.chunks_exact(bits as usize)) {
        unpack_lanes(src, bits, &mut lanes);
        for (slot, &raw) in chunk.iter_mut().zip(&lanes) {
            prev = prev.wrapping_add(T::from_bits(sign_extend(raw, bits) as u64));
            *slot = prev;
        }
    }

    let done = split / LANES * bits as usize;
    generic::decode_delta(&bytes[done..], width, prev, tail);
}
