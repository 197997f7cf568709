//! Top-level error type for the benchmark harness.

/// Errors that stop a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The settings could not be loaded or failed validation.
    #[error("could not load settings: {0}")]
    Config(#[from] config::ConfigError),

    /// The vector could not be built or reported a codec failure.
    #[error(transparent)]
    Vector(#[from] zipvec::Error),

    /// A kernel rejected its input.
    #[error("codec kernel failed: {0}")]
    Codec(#[from] zipvec::codec::CodecError),

    /// A benchmark read back a different sum than it wrote.
    #[error("{name}: checksum mismatch, expected {expected}, got {actual}")]
    Checksum {
        /// Benchmark name
        name: String,
        /// Sum of the written values
        expected: i64,
        /// Sum of the values read back
        actual: i64,
    },

    /// Results could not be rendered as JSON.
    #[error("could not serialize results: {0}")]
    Json(#[from] serde_json::Error),
}
