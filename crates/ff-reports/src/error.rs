//! Error types for the report pipelines.

use std::path::PathBuf;

use ff_common::CommonError;
use grib2_parser::Grib2Error;
use renderer::RenderError;
use thiserror::Error;

pub type ReportsResult<T> = Result<T, ReportsError>;

#[derive(Debug, Error)]
pub enum ReportsError {
    #[error("Required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Failed to read grid {}: {source}", .path.display())]
    Grid {
        path: PathBuf,
        #[source]
        source: Grib2Error,
    },

    #[error("Failed to read report table {}: {reason}", .path.display())]
    Table { path: PathBuf, reason: String },

    #[error("Grid shapes differ: mask has {expected} points, reports have {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid field: {0}")]
    Field(CommonError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Viewer '{command}' failed: {reason}")]
    Viewer { command: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CommonError> for ReportsError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::ShapeMismatch { expected, actual } => {
                ReportsError::ShapeMismatch { expected, actual }
            }
            other => ReportsError::Field(other),
        }
    }
}
