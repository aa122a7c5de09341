// Feature extraction and classification errors

use std::fmt;

/// Errors from the sub-band extractor and the nearest-mean classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed input: empty frame, zero frame length, zero band count.
    InvalidInput { reason: String },

    /// Classification was attempted against a model with no labels.
    EmptyModel,

    /// Feature vector length does not match the model's band count.
    ConfigMismatch { expected: usize, found: usize },

    /// Audio sample rate does not match the rate the model was trained at.
    SampleRateMismatch { expected: u32, found: u32 },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput { reason } => {
                write!(f, "invalid input: {}", reason)
            }
            AnalysisError::EmptyModel => {
                write!(f, "model contains no command labels")
            }
            AnalysisError::ConfigMismatch { expected, found } => {
                write!(
                    f,
                    "feature vector has {} bands but the model expects {}",
                    found, expected
                )
            }
            AnalysisError::SampleRateMismatch { expected, found } => {
                write!(
                    f,
                    "audio sample rate is {} Hz but the model was trained at {} Hz",
                    found, expected
                )
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
