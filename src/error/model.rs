// Model persistence and training errors

use std::fmt;

use super::{AnalysisError, AudioError};

/// Errors from saving or loading a persisted command model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Io { path: String, reason: String },
    Format { path: String, reason: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io { path, reason } => {
                write!(f, "model file '{}': {}", path, reason)
            }
            ModelError::Format { path, reason } => {
                write!(f, "model file '{}' is not valid: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Errors from training a command model from recorded clips.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    /// A label's folder holds fewer recordings than required.
    InsufficientData {
        label: String,
        folder: String,
        found: usize,
        required: usize,
    },

    /// A recording was made at a different sample rate than configured.
    SampleRateMismatch {
        path: String,
        expected: u32,
        found: u32,
    },

    /// A label folder could not be listed.
    Io { path: String, reason: String },

    Audio(AudioError),
    Analysis(AnalysisError),
    Model(ModelError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainError::InsufficientData {
                label,
                folder,
                found,
                required,
            } => {
                write!(
                    f,
                    "label '{}' needs at least {} recordings in {} (found {})",
                    label, required, folder, found
                )
            }
            TrainError::SampleRateMismatch {
                path,
                expected,
                found,
            } => {
                write!(
                    f,
                    "recording '{}' has sample rate {} Hz, expected {} Hz",
                    path, found, expected
                )
            }
            TrainError::Io { path, reason } => {
                write!(f, "cannot list recordings in '{}': {}", path, reason)
            }
            TrainError::Audio(e) => write!(f, "{}", e),
            TrainError::Analysis(e) => write!(f, "{}", e),
            TrainError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TrainError {}

impl From<AudioError> for TrainError {
    fn from(err: AudioError) -> Self {
        TrainError::Audio(err)
    }
}

impl From<AnalysisError> for TrainError {
    fn from(err: AnalysisError) -> Self {
        TrainError::Analysis(err)
    }
}

impl From<ModelError> for TrainError {
    fn from(err: ModelError) -> Self {
        TrainError::Model(err)
    }
}
