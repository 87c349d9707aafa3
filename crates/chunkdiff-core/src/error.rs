//! Error types for the diff engine's fallible edges.
//!
//! Diffing itself never fails. Errors only arise when validating chunking
//! parameters or parsing source hunks produced by an external differ.

use std::io;

/// Errors from validating chunking parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The rolling window must span at least one byte.
    #[error("window size must be at least 1")]
    ZeroWindow,

    /// The boundary mask width is outside the supported range.
    #[error("mask bits must be in 1..=32, got {0}")]
    MaskBitsOutOfRange(u32),

    /// Samples must be at least one byte wide.
    #[error("sample size must be at least 1")]
    ZeroSampleSize,

    /// A target average chunk size that is not a power of two cannot be
    /// expressed as a low-bit mask.
    #[error("target chunk size must be a power of two >= 2, got {0}")]
    TargetNotPowerOfTwo(usize),
}

/// Errors from parsing `start_a end_a start_b end_b` hunk lines.
#[derive(Debug, thiserror::Error)]
pub enum HunkParseError {
    /// The line did not hold exactly four fields.
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    /// A field was not an unsigned integer.
    #[error("field {field} is not an unsigned integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    /// A range ended before it started.
    #[error("side {side} range is reversed: {start} > {end}")]
    ReversedRange { side: char, start: usize, end: usize },

    /// A line of a hunk stream failed to parse.
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number.
        line: usize,
        #[source]
        source: Box<HunkParseError>,
    },

    /// Reading the hunk stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
