//! Page-at-a-time timing of the scan, encode and decode kernels of each
//! kernel set.

use std::hint::black_box;
use std::time::Instant;

use strum::IntoEnumIterator;
use zipvec::testing::BlockRandom;
use zipvec::testing::Pattern;
use zipvec::Arch;
use zipvec::Backend;
use zipvec::Codec;
use zipvec::CodecBackend;
use zipvec::Format;
use zipvec::Width;

use crate::bench::best_of;
use crate::bench::BenchResult;
use crate::config::BenchSettings;
use crate::error::Error;

/// Widths the kernels are timed at: every candidate plus native.
pub const WIDTHS: [Width; 6] = [Width::W8, Width::W16, Width::W24, Width::W32, Width::W48, Width::W64];

/// Values that just fit `width`.
fn pattern_for(width: Width) -> Pattern {
    match width {
        Width::W8 => Pattern::AbsI7,
        Width::W16 => Pattern::AbsI15,
        Width::W24 => Pattern::AbsI23,
        Width::W32 => Pattern::AbsI31,
        Width::W48 => Pattern::AbsI47,
        _ => Pattern::AbsI63,
    }
}

fn sum(values: &[i64]) -> i64 {
    values.iter().fold(0i64, |sum, v| sum.wrapping_add(*v))
}

/// Times one width on one kernel set, `pages` pages per run.
#[tracing::instrument(skip(backend, settings), fields(arch = %backend.arch()))]
pub fn run_width(
    backend: &Backend,
    width: Width,
    settings: &BenchSettings,
    pages: usize,
) -> Result<Vec<BenchResult>, Error> {
    let page_len = settings.page_len;
    let mut generator = BlockRandom::with_seed(page_len, settings.seed);
    let pattern = pattern_for(width);
    let page: Vec<i64> = (0..page_len).map(|_| generator.sample(pattern)).collect();

    let format = Format::new(Codec::Absolute, width);
    let meta = backend.metadata(&backend.scan_absolute(&page), format);
    let mut block = vec![0u8; width.block_bytes(page_len)];
    let mut decoded = vec![0i64; page_len];

    let prefix = format!("{}_w{}", backend.arch(), width);
    let (words, runs, bytes) = (pages * page_len, settings.runs, std::mem::size_of::<i64>());

    let scan = best_of(format!("{prefix}_scan"), runs, words, bytes, || {
        let start = Instant::now();
        for _ in 0..pages {
            black_box(backend.scan_combined(black_box(&page)));
        }
        Ok(start.elapsed())
    })?;

    let encode = best_of(format!("{prefix}_encode"), runs, words, bytes, || {
        let start = Instant::now();
        for _ in 0..pages {
            backend.encode(black_box(&page), format, meta, &mut block)?;
        }
        Ok(start.elapsed())
    })?;

    let name = format!("{prefix}_decode");
    let decode = best_of(name.clone(), runs, words, bytes, || {
        let start = Instant::now();
        for _ in 0..pages {
            backend.decode(black_box(&block), format, meta, &mut decoded)?;
        }
        Ok(start.elapsed())
    })?;

    if decoded != page {
        return Err(Error::Checksum { name, expected: sum(&page), actual: sum(&decoded) });
    }

    Ok(vec![scan, encode, decode])
}

/// Times every width on every kernel set over roughly `settings.size`
/// elements.
pub fn run(settings: &BenchSettings) -> Result<Vec<BenchResult>, Error> {
    let pages = (settings.size / settings.page_len).max(1);
    let mut results = Vec::new();
    for arch in Arch::iter() {
        let backend = Backend::new(arch);
        for width in WIDTHS {
            results.extend(run_width(&backend, width, settings, pages)?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchSetting;

    #[test]
    fn every_arch_and_width_round_trips() {
        let settings = BenchSettings {
            size: 256,
            runs: 1,
            page_len: 64,
            arch: ArchSetting::Auto,
            seed: 9,
        };
        let results = run(&settings).unwrap();
        assert_eq!(results.len(), 2 * WIDTHS.len() * 3);
        assert_eq!(results[0].name, "generic_w8_scan");
        assert_eq!(results.last().unwrap().name, "wide_w64_decode");
        assert!(results.iter().all(|r| r.words == 256));
    }
}
