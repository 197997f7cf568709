//! Format selection from page statistics.
//!
//! The rules, in order of precedence:
//!
//! 1. Equal deltas need no storage. A zero delta is `const-abs` with
//!    `iv = x[0]`; any other delta is `const-rel` with `dv` the delta and
//!    `iv` one step before `x[0]`.
//! 2. Otherwise the narrowest absolute width and the narrowest delta width
//!    are found among 8, 16, 24, 32, 48 bits and the native width.
//! 3. The narrower wins; ties go to absolute.
//!
//! A scan restricted to one range ([`ScanMode::Absolute`] or
//! [`ScanMode::Delta`]) can only pick formats of that kind.

use super::Codec;
use super::Element;
use super::Format;
use super::Meta;
use super::ScanMode;
use super::Stats;
use super::Width;

/// The narrowest width that holds every value in `[amin, amax]`.
///
/// Signed types need the range to fit the two's complement range of the
/// width; unsigned types only need `amax` to fit.
pub fn absolute_width<T: Element>(amin: T, amax: T) -> Width {
    if amin == amax {
        return Width::W0;
    }
    let (min, max) = (amin.to_i128(), amax.to_i128());
    Width::CANDIDATES
        .into_iter()
        .filter(|width| width.bits() < T::BITS)
        .find(|width| {
            let bits = width.bits();
            if T::SIGNED {
                -(1i128 << (bits - 1)) <= min && max < (1i128 << (bits - 1))
            } else {
                max < (1i128 << bits)
            }
        })
        .unwrap_or(T::NATIVE)
}

/// The narrowest width that holds every signed delta in `[dmin, dmax]`.
pub fn delta_width<T: Element>(dmin: i64, dmax: i64) -> Width {
    if dmin == dmax {
        return Width::W0;
    }
    Width::CANDIDATES
        .into_iter()
        .filter(|width| width.bits() < T::BITS)
        .find(|width| {
            let bits = width.bits();
            -(1i64 << (bits - 1)) <= dmin && dmax < (1i64 << (bits - 1))
        })
        .unwrap_or(T::NATIVE)
}

/// Picks the cheapest lossless format for a page.
pub fn select_format<T: Element>(stats: &Stats<T>) -> Format {
    match stats.mode {
        ScanMode::Absolute => {
            if stats.amin == stats.amax {
                Format::new(Codec::ConstantAbsolute, Width::W0)
            } else {
                Format::new(Codec::Absolute, absolute_width(stats.amin, stats.amax))
            }
        }
        ScanMode::Delta => match constant(stats) {
            Some(format) => format,
            None => Format::new(Codec::Delta, delta_width::<T>(stats.dmin, stats.dmax)),
        },
        ScanMode::Combined => {
            if let Some(format) = constant(stats) {
                return format;
            }
            let abs = absolute_width(stats.amin, stats.amax);
            let rel = delta_width::<T>(stats.dmin, stats.dmax);
            if abs <= rel {
                Format::new(Codec::Absolute, abs)
            } else {
                Format::new(Codec::Delta, rel)
            }
        }
    }
}

fn constant<T: Element>(stats: &Stats<T>) -> Option<Format> {
    match (stats.dmin == stats.dmax, stats.dmin) {
        (false, _) => None,
        (true, 0) => Some(Format::new(Codec::ConstantAbsolute, Width::W0)),
        (true, _) => Some(Format::new(Codec::ConstantDelta, Width::W0)),
    }
}

/// The metadata stored alongside `format`.
pub fn metadata<T: Element>(stats: &Stats<T>, format: Format) -> Meta<T> {
    match format.codec {
        Codec::None | Codec::Absolute => Meta::default(),
        Codec::Delta | Codec::ConstantAbsolute => Meta { iv: stats.iv, dv: T::default() },
        Codec::ConstantDelta => Meta { iv: stats.iv, dv: T::from_bits(stats.dmin as u64) },
    }
}
