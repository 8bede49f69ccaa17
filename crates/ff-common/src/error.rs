//! Error types for the shared flash-flood types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Grid shapes differ: expected {expected} points, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Field has {actual} values but its grid has {expected} points")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Year out of range: {0}")]
    InvalidYear(i32),
}
