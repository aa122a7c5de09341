// Command model - per-label sub-band energy statistics
//
// The persisted model is a human-readable JSON document:
//
//   { "fs": 16000, "N": 8192, "K": 8, "window": "hamming",
//     "commands": { "left": { "mean": [...], "std": [...], "count": 5 }, ... } }
//
// `scaling` defaults to linear when absent, so older model files still
// load. Labels live in a BTreeMap so
// iteration order is lexicographic, which makes classifier tie-breaking
// deterministic.

pub mod trainer;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureScaling, WindowKind};
use crate::config::FeatureConfig;
use crate::error::ModelError;

/// Aggregated statistics for one command label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStats {
    /// Per-band mean energy over the training recordings.
    pub mean: Vec<f64>,
    /// Per-band population standard deviation. Stored for inspection; the
    /// nearest-mean classifier does not use it.
    pub std: Vec<f64>,
    /// Number of recordings aggregated.
    pub count: usize,
}

/// A trained voice-command model plus the feature configuration every vector
/// in it was computed under. A model is only valid against features computed
/// with the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandModel {
    pub fs: u32,
    #[serde(rename = "N")]
    pub frame_len: usize,
    #[serde(rename = "K")]
    pub num_bands: usize,
    pub window: WindowKind,
    #[serde(default)]
    pub scaling: FeatureScaling,
    pub commands: BTreeMap<String, CommandStats>,
}

impl CommandModel {
    /// The feature configuration this model's vectors were computed under.
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            fs: self.fs,
            frame_len: self.frame_len,
            num_bands: self.num_bands,
            window: self.window,
            scaling: self.scaling,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }

    /// Persist as pretty-printed JSON. Overwrites any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| ModelError::Format {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        log::info!(
            "saved model with {} labels to {}",
            self.commands.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| ModelError::Format {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> CommandModel {
        let mut commands = BTreeMap::new();
        commands.insert(
            "down".to_string(),
            CommandStats {
                mean: vec![0.125, 3.5e-7, 42.0],
                std: vec![0.01, 1.0e-9, 0.5],
                count: 5,
            },
        );
        commands.insert(
            "up".to_string(),
            CommandStats {
                mean: vec![9.0, 0.0, 1.0 / 3.0],
                std: vec![0.1, 0.0, 0.2],
                count: 5,
            },
        );
        CommandModel {
            fs: 32768,
            frame_len: 4096,
            num_bands: 3,
            window: WindowKind::Hamming,
            scaling: FeatureScaling::Linear,
            commands,
        }
    }

    #[test]
    fn roundtrips_through_file_exactly() {
        let model = sample_model();
        let path = std::env::temp_dir().join(format!(
            "voiceband_model_test_{}.json",
            std::process::id()
        ));

        model.save(&path).unwrap();
        let loaded = CommandModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Same floats, same label set.
        assert_eq!(loaded, model);
    }

    #[test]
    fn serialized_field_names_use_short_keys() {
        let json = serde_json::to_string(&sample_model()).unwrap();
        assert!(json.contains("\"N\":"));
        assert!(json.contains("\"K\":"));
        assert!(json.contains("\"window\":\"hamming\""));
        assert!(json.contains("\"commands\":"));
    }

    #[test]
    fn legacy_file_without_scaling_defaults_to_linear() {
        let json = r#"{
            "fs": 16000, "N": 8192, "K": 4, "window": "hann",
            "commands": {
                "go": { "mean": [1.0, 2.0, 3.0, 4.0],
                        "std": [0.1, 0.2, 0.3, 0.4],
                        "count": 5 }
            }
        }"#;
        let model: CommandModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.scaling, FeatureScaling::Linear);
        assert_eq!(model.num_bands, 4);
        assert_eq!(model.commands["go"].count, 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CommandModel::load("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
