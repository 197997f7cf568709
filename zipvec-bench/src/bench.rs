//! Timed write, indexed-read and iteration passes over paged vectors.

use std::hint::black_box;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use zipvec::testing::BlockRandom;
use zipvec::testing::Pattern;
use zipvec::IndexReport;
use zipvec::PagedVec;

use crate::config::BenchSettings;
use crate::error::Error;
use crate::format::format_binary;
use crate::format::format_comma;

/// Name of the input that mixes every pattern, one per page.
pub const MIXED: &str = "block_random";

/// The fastest of several runs of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchResult {
    /// Benchmark name
    pub name: String,
    /// Elements touched per run
    pub words: usize,
    /// Wall time of the fastest run
    pub time_ns: u64,
    /// Nanoseconds per element
    pub ns_word: f64,
    /// Elements per second
    pub word_sec: f64,
    /// MiB of native elements per second
    pub mib_sec: f64,
}

impl BenchResult {
    /// Derives the rates of a run over `words` elements of `word_bytes`
    /// each that took `elapsed`.
    pub fn new(name: String, words: usize, word_bytes: usize, elapsed: Duration) -> Self {
        let time_ns = elapsed.as_nanos().max(1) as u64;
        let nanos = time_ns as f64;
        let word_sec = words as f64 * (1e9 / nanos);
        Self {
            name,
            words,
            time_ns,
            ns_word: nanos / words.max(1) as f64,
            word_sec,
            mib_sec: word_sec * word_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

/// Runs `pass` `runs` times and keeps the fastest.
pub fn best_of<F>(name: String, runs: usize, words: usize, word_bytes: usize, mut pass: F) -> Result<BenchResult, Error>
where
    F: FnMut() -> Result<Duration, Error>,
{
    let mut best = Duration::MAX;
    for _ in 0..runs {
        best = best.min(pass()?);
    }
    let result = BenchResult::new(name, words, word_bytes, best);
    tracing::debug!(name = %result.name, time_ns = result.time_ns, "benchmark finished");
    Ok(result)
}

/// The values of one benchmark input.
pub fn generate(settings: &BenchSettings, pattern: Option<Pattern>, size: usize) -> Vec<i64> {
    let generator = match pattern {
        Some(pattern) => BlockRandom::with_pattern(settings.page_len, settings.seed, pattern),
        None => BlockRandom::with_seed(settings.page_len, settings.seed),
    };
    generator.take(size).collect()
}

fn fill(settings: &BenchSettings, values: &[i64]) -> Result<PagedVec<i64>, Error> {
    let mut vec = PagedVec::<i64>::with_config(values.len(), &settings.vec_config())?;
    for (i, value) in values.iter().enumerate() {
        vec.try_set(i, *value)?;
    }
    vec.try_sync()?;
    Ok(vec)
}

fn check(name: &str, expected: i64, actual: i64) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::Checksum { name: name.to_string(), expected, actual });
    }
    Ok(())
}

/// Benchmarks one input: a plain `Vec` baseline, then writing, indexed
/// reads and iteration of a paged vector.
#[tracing::instrument(skip(settings))]
pub fn run_input(settings: &BenchSettings, pattern: Option<Pattern>) -> Result<Vec<BenchResult>, Error> {
    let suffix = pattern.map_or_else(|| MIXED.to_string(), |p| p.to_string());
    let values = generate(settings, pattern, settings.size);
    let expected = values.iter().fold(0i64, |sum, v| sum.wrapping_add(*v));
    let (size, runs, bytes) = (values.len(), settings.runs, std::mem::size_of::<i64>());

    let mut results = Vec::with_capacity(4);

    let name = format!("std_vec_iter_{suffix}");
    results.push(best_of(name.clone(), runs, size, bytes, || {
        let start = Instant::now();
        let sum = black_box(&values).iter().fold(0i64, |sum, v| sum.wrapping_add(*v));
        let elapsed = start.elapsed();
        check(&name, expected, sum)?;
        Ok(elapsed)
    })?);

    let name = format!("zipvec_write_{suffix}");
    results.push(best_of(name, runs, size, bytes, || {
        let start = Instant::now();
        let vec = fill(settings, black_box(&values))?;
        let elapsed = start.elapsed();
        black_box(vec);
        Ok(elapsed)
    })?);

    let mut vec = fill(settings, &values)?;

    let name = format!("zipvec_index_{suffix}");
    results.push(best_of(name.clone(), runs, size, bytes, || {
        let start = Instant::now();
        let mut sum = 0i64;
        for i in 0..size {
            sum = sum.wrapping_add(vec.try_get(i)?);
        }
        let elapsed = start.elapsed();
        check(&name, expected, black_box(sum))?;
        Ok(elapsed)
    })?);

    let name = format!("zipvec_iter_{suffix}");
    results.push(best_of(name.clone(), runs, size, bytes, || {
        let start = Instant::now();
        let sum = vec.iter().fold(0i64, |sum, v| sum.wrapping_add(v));
        let elapsed = start.elapsed();
        check(&name, expected, black_box(sum))?;
        Ok(elapsed)
    })?);

    let report = vec.report();
    tracing::info!(
        input = %suffix,
        page_ratio = report.page_ratio(),
        total_ratio = report.total_ratio(),
        "benchmarked input"
    );

    Ok(results)
}

/// Benchmarks every pattern and then the mixed input.
pub fn run(settings: &BenchSettings) -> Result<Vec<BenchResult>, Error> {
    let mut results = Vec::new();
    for pattern in Pattern::ALL.into_iter().map(Some).chain([None]) {
        results.extend(run_input(settings, pattern)?);
    }
    Ok(results)
}

/// Fills a vector with `size` values of `pattern` (every pattern when
/// `None`) and reports its index.
pub fn dump(settings: &BenchSettings, pattern: Option<Pattern>, size: usize) -> Result<IndexReport, Error> {
    let values = generate(settings, pattern, size);
    let vec = fill(settings, &values)?;
    Ok(vec.report())
}

/// Renders results as a table.
pub fn render_table(results: &[BenchResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<30} {:>8} {:>8} {:>16} {:>10}\n",
        "benchmark", "size(W)", "time(ns)", "word/sec", "MiB/s"
    ));
    out.push_str(&format!(
        "{:<30} {:>8} {:>8} {:>16} {:>10}\n",
        "-".repeat(30),
        "-".repeat(8),
        "-".repeat(8),
        "-".repeat(16),
        "-".repeat(10)
    ));
    for r in results {
        out.push_str(&format!(
            "{:<30} {:>8} {:>8.3} {:>16} {:>10.3}\n",
            r.name,
            format!("{}W", format_binary(r.words as u64)),
            r.ns_word,
            format_comma(r.word_sec as u64),
            r.mib_sec,
        ));
    }
    out
}
