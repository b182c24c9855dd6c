//! Error types for walk generation.
//!
//! Sparse graph structure met during a walk is handled by the detour fallback
//! and never shows up here. What remains are caller precondition violations,
//! defensive sampling failures, and I/O errors on the output stream.

use data_loader::LocalIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalkError {
    /// The start user has no rated movies
    #[error("User {0} has no rated movies")]
    IsolatedUser(LocalIndex),

    /// The start user is outside the user range
    #[error("User {user} out of range ({count} users)")]
    UnknownUser { user: LocalIndex, count: u32 },

    /// A choice was requested over an empty option set
    #[error("Cannot choose from an empty set of {0}")]
    EmptyChoice(&'static str),

    /// Weights are negative, NaN, or don't sum to a positive finite value
    #[error("Weights must have a positive finite sum, got {sum}")]
    DegenerateWeights { sum: f64 },

    /// Invalid batch configuration
    #[error("Invalid walk configuration: {0}")]
    InvalidConfig(String),

    /// Writing walks failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WalkError>;
