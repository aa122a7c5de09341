//! Runtime configuration
//!
//! JSON-backed configuration with sensible defaults, so parameters can be
//! tuned without recompiling. A missing or invalid config file falls back to
//! defaults with a logged warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureScaling, WindowKind};

/// Feature extraction parameters shared by training and recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Sample rate in Hz.
    pub fs: u32,
    /// Frame / FFT length N in samples.
    pub frame_len: usize,
    /// Number of sub-bands K.
    pub num_bands: usize,
    /// Analysis window applied before the FFT.
    pub window: WindowKind,
    /// Energy post-processing mode.
    pub scaling: FeatureScaling,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fs: 16000,
            frame_len: 8192,
            num_bands: 8,
            window: WindowKind::Hamming,
            scaling: FeatureScaling::Linear,
        }
    }
}

/// Silence gate and trigger tuning for the recognition loop.
///
/// The ratios and timing constants are tuned values; changing them changes
/// recognition behavior, not just latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Below this dBFS level a frame counts as silence.
    pub silence_dbfs: f64,
    /// Sustained silence longer than this publishes the silence state.
    pub silence_min_secs: f64,
    /// Trigger when frame RMS exceeds noise_floor * this ratio.
    pub noise_ratio: f64,
    /// ...or exceeds the smoothed previous level * this ratio.
    pub prev_ratio: f64,
    /// Minimum gap between two classifications.
    pub retrigger_secs: f64,
    /// Warm-up after start during which triggers are ignored.
    pub warmup_secs: f64,
    /// Polling cadence of the loop.
    pub poll_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            silence_dbfs: -50.0,
            silence_min_secs: 1.0,
            noise_ratio: 1.8,
            prev_ratio: 1.25,
            retrigger_secs: 0.25,
            warmup_secs: 0.5,
            poll_ms: 50,
        }
    }
}

/// Streaming capture parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Total audio retained by the ring buffer.
    pub ring_seconds: f64,
    /// Duration of one capture chunk (~100 ms).
    pub chunk_seconds: f64,
    /// Input device name; None selects the default device.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ring_seconds: 5.0,
            chunk_seconds: 0.1,
            device: None,
        }
    }
}

/// Training data layout and requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Root directory holding one sub-folder of WAV clips per label.
    pub recordings_root: PathBuf,
    /// Minimum recordings per label (M); the first M in name order are used.
    pub min_recordings: usize,
    /// Where the trained model is persisted.
    pub model_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            recordings_root: PathBuf::from("recordings"),
            min_recordings: 5,
            model_path: PathBuf::from("voiceband_model.json"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feature: FeatureConfig,
    pub trigger: TriggerConfig,
    pub audio: AudioConfig,
    pub train: TrainConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults if the
    /// file is missing or invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "failed to parse config {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "failed to read config {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trigger_constants() {
        let trigger = TriggerConfig::default();
        assert_eq!(trigger.silence_dbfs, -50.0);
        assert_eq!(trigger.silence_min_secs, 1.0);
        assert_eq!(trigger.noise_ratio, 1.8);
        assert_eq!(trigger.prev_ratio, 1.25);
        assert_eq!(trigger.retrigger_secs, 0.25);
        assert_eq!(trigger.poll_ms, 50);
    }

    #[test]
    fn json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "feature": { "fs": 32768, "frame_len": 4096 } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.feature.fs, 32768);
        assert_eq!(parsed.feature.frame_len, 4096);
        assert_eq!(parsed.feature.num_bands, FeatureConfig::default().num_bands);
        assert_eq!(parsed.trigger, TriggerConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/voiceband.json");
        assert_eq!(config, AppConfig::default());
    }
}
