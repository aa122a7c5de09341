// Error types for the recognition pipeline

mod analysis;
mod audio;
mod model;

pub use analysis::AnalysisError;
pub use audio::AudioError;
pub use model::{ModelError, TrainError};

use std::fmt;

/// Top-level error for operations that can fail across domains,
/// e.g. starting the recognizer (device + model validation).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Audio(AudioError),
    Analysis(AnalysisError),
    Model(ModelError),
    Train(TrainError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Audio(e) => write!(f, "{}", e),
            Error::Analysis(e) => write!(f, "{}", e),
            Error::Model(e) => write!(f, "{}", e),
            Error::Train(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<AudioError> for Error {
    fn from(err: AudioError) -> Self {
        Error::Audio(err)
    }
}

impl From<AnalysisError> for Error {
    fn from(err: AnalysisError) -> Self {
        Error::Analysis(err)
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        Error::Model(err)
    }
}

impl From<TrainError> for Error {
    fn from(err: TrainError) -> Self {
        Error::Train(err)
    }
}
