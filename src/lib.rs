// voiceband - sub-band energy voice-command recognition
//
// A small recognition pipeline: frames of microphone audio are windowed,
// transformed with an FFT, and reduced to K sub-band energies; a trained
// model stores per-label mean vectors and a nearest-mean classifier assigns
// the closest label. The streaming recognizer adds a ring buffer, a silence
// gate and an onset trigger on top of the same extractor.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod recognizer;

pub use analysis::classifier::{classify, Classification};
pub use analysis::features::{
    FeatureScaling, SubbandExtractor, SubbandFeatures, WindowKind,
};
pub use analysis::Prediction;
pub use config::{AppConfig, AudioConfig, FeatureConfig, TrainConfig, TriggerConfig};
pub use error::{AnalysisError, AudioError, Error, ModelError, TrainError};
pub use model::{CommandModel, CommandStats};
pub use recognizer::Recognizer;
