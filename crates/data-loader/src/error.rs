//! Error types for the data-loader crate.
//!
//! Every variant here is a configuration error: the input tables are missing,
//! malformed, or inconsistent with the node-count record. None of them are
//! recoverable, so callers propagate them up to the binary and abort.

use crate::types::NodeType;
use thiserror::Error;

/// Errors that can occur while loading the graph or building it in memory
///
/// The `#[derive(Error)]` macro from thiserror implements
/// `std::error::Error` and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line} of {file}")]
    FieldCountMismatch {
        file: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    /// The per-type counts don't add up to the declared total
    #[error("Node counts sum to {sum} but the declared total is {declared}")]
    CountMismatch { sum: u64, declared: u64 },

    /// A global id fell outside the range reserved for its node type
    #[error("Global id {id} is not a {expected:?} node")]
    OutOfRange { expected: NodeType, id: u64 },

    /// A local index is past the end of its node type's range
    #[error("{kind:?} index {index} out of bounds (count {count})")]
    IndexOutOfBounds {
        kind: NodeType,
        index: u32,
        count: u32,
    },

    /// A rating value is unusable as a similarity signal
    #[error("Invalid rating {value} for user {user}, movie {movie}")]
    InvalidRating { user: u32, movie: u32, value: f64 },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
