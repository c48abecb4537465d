use std::path::PathBuf;

use thiserror::Error;

/// Rejection of raw form input before a [`FeatureRow`](crate::FeatureRow) exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be one of {allowed} (got \"{value}\")")]
    UnknownOption {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::UnknownOption { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::NotFinite { field } => field,
        }
    }
}

/// Hard failures of a single prediction.
///
/// A negative estimate is not listed here: it is reported through
/// [`Estimate::Implausible`](crate::Estimate::Implausible).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("model file not found at {}", .path.display())]
    ModelNotFound { path: PathBuf },

    #[error("{0}")]
    InferenceFailure(String),
}

impl PredictionError {
    pub(crate) fn inference(err: impl std::fmt::Display) -> Self {
        PredictionError::InferenceFailure(err.to_string())
    }
}
