//! Deterministic values that change character every page.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// The kind of values a page of [`BlockRandom`] output holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString)]
pub enum Pattern {
    /// Uniform in ±2^6.
    #[strum(serialize = "abs_i7")]
    AbsI7,
    /// Uniform in ±2^14.
    #[strum(serialize = "abs_i15")]
    AbsI15,
    /// Uniform in ±2^22.
    #[strum(serialize = "abs_i23")]
    AbsI23,
    /// Uniform in ±2^30.
    #[strum(serialize = "abs_i31")]
    AbsI31,
    /// Uniform in ±2^46.
    #[strum(serialize = "abs_i47")]
    AbsI47,
    /// A random baseline plus uniform ±2^6.
    #[strum(serialize = "rel_i7")]
    RelI7,
    /// A random baseline plus uniform ±2^14.
    #[strum(serialize = "rel_i15")]
    RelI15,
    /// A random baseline plus uniform ±2^22.
    #[strum(serialize = "rel_i23")]
    RelI23,
    /// A random baseline plus uniform ±2^30.
    #[strum(serialize = "rel_i31")]
    RelI31,
    /// A random baseline plus uniform ±2^46.
    #[strum(serialize = "rel_i47")]
    RelI47,
    /// Uniform in ±2^62.
    #[strum(serialize = "abs_i63")]
    AbsI63,
    /// The baseline, repeated.
    #[strum(serialize = "con_i63")]
    Constant,
    /// An arithmetic progression from the baseline.
    #[strum(serialize = "seq_i63")]
    Sequence,
}

impl Pattern {
    /// Every pattern, in the order the generator numbers them.
    pub const ALL: [Pattern; 13] = [
        Pattern::AbsI7,
        Pattern::AbsI15,
        Pattern::AbsI23,
        Pattern::AbsI31,
        Pattern::AbsI47,
        Pattern::RelI7,
        Pattern::RelI15,
        Pattern::RelI23,
        Pattern::RelI31,
        Pattern::RelI47,
        Pattern::AbsI63,
        Pattern::Constant,
        Pattern::Sequence,
    ];
}

/// Seed used by [`BlockRandom::new`].
pub const DEFAULT_SEED: u64 = 2;

/// A seeded generator of `i64` values that picks a new [`Pattern`], a new
/// baseline and a new step every `page_len` values, so that each page of a
/// vector filled from it exercises a different format.
#[derive(Debug, Clone)]
pub struct BlockRandom {
    rng: StdRng,
    page_len: usize,
    counter: usize,
    fixed: Option<Pattern>,
    pattern: Option<Pattern>,
    value: i64,
    delta: i64,
}

impl BlockRandom {
    /// A generator with the default seed.
    pub fn new(page_len: usize) -> Self {
        Self::with_seed(page_len, DEFAULT_SEED)
    }

    /// A generator with an explicit seed.
    pub fn with_seed(page_len: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            page_len,
            counter: 0,
            fixed: None,
            pattern: None,
            value: 0,
            delta: 0,
        }
    }

    /// A generator that keeps drawing new baselines and steps every page
    /// but always uses `pattern`.
    pub fn with_pattern(page_len: usize, seed: u64, pattern: Pattern) -> Self {
        Self { fixed: Some(pattern), ..Self::with_seed(page_len, seed) }
    }

    /// The pattern of the current page, once the first value was drawn.
    pub fn pattern(&self) -> Option<Pattern> {
        self.pattern
    }

    /// Uniform in `±(2^(bits-1) - 1)`.
    fn signed(&mut self, bits: u32) -> i64 {
        let bound = (1i64 << (bits - 1)) - 1;
        self.rng.gen_range(-bound..=bound)
    }

    /// One value of `pattern`, using the current baseline and step.
    pub fn sample(&mut self, pattern: Pattern) -> i64 {
        match pattern {
            Pattern::AbsI7 => self.signed(7),
            Pattern::AbsI15 => self.signed(15),
            Pattern::AbsI23 => self.signed(23),
            Pattern::AbsI31 => self.signed(31),
            Pattern::AbsI47 => self.signed(47),
            Pattern::RelI7 => self.value.wrapping_add(self.signed(7)),
            Pattern::RelI15 => self.value.wrapping_add(self.signed(15)),
            Pattern::RelI23 => self.value.wrapping_add(self.signed(23)),
            Pattern::RelI31 => self.value.wrapping_add(self.signed(31)),
            Pattern::RelI47 => self.value.wrapping_add(self.signed(47)),
            Pattern::AbsI63 => self.signed(63),
            Pattern::Constant => self.value,
            Pattern::Sequence => {
                self.value = self.value.wrapping_add(self.delta);
                self.value
            }
        }
    }

    /// Draws a new pattern, baseline and step.
    fn reset(&mut self) -> Pattern {
        let pattern = match self.fixed {
            Some(pattern) => pattern,
            None => Pattern::ALL[self.rng.gen_range(0..Pattern::ALL.len())],
        };
        self.pattern = Some(pattern);
        self.value = self.signed(63);
        self.delta = self.signed(47);
        self.counter = 0;
        pattern
    }

    /// The next value.
    pub fn next_value(&mut self) -> i64 {
        self.counter += 1;
        let pattern = match self.pattern {
            Some(pattern) if self.counter < self.page_len => pattern,
            _ => self.reset(),
        };
        self.sample(pattern)
    }
}

impl Iterator for BlockRandom {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        Some(self.next_value())
    }
}
