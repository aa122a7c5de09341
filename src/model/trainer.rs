// Trainer - builds a command model from folders of recorded clips
//
// For each label, the first M WAV files (sorted by name) in its folder are
// read as mono, coerced to the frame length, run through the extractor, and
// aggregated into per-band mean and population standard deviation. Training
// is not incremental: persisting overwrites the previous model, and nothing
// is written unless every label trains successfully.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::features::SubbandExtractor;
use crate::audio::wav;
use crate::config::FeatureConfig;
use crate::error::TrainError;
use crate::model::{CommandModel, CommandStats};

/// Train a model from `recordings_root/<folder>` for each `(label, folder)`
/// pair. Fails without side effects if any label has fewer than
/// `min_recordings` clips.
pub fn train_from_folders(
    labels: &[(String, String)],
    feature: &FeatureConfig,
    min_recordings: usize,
    recordings_root: &Path,
) -> Result<CommandModel, TrainError> {
    let extractor = SubbandExtractor::new(feature)?;
    let mut commands = BTreeMap::new();

    for (label, folder) in labels {
        let dir = recordings_root.join(folder);
        let mut wavs = list_wavs(&dir)?;
        if wavs.len() < min_recordings {
            return Err(TrainError::InsufficientData {
                label: label.clone(),
                folder: dir.display().to_string(),
                found: wavs.len(),
                required: min_recordings,
            });
        }
        wavs.truncate(min_recordings);

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(wavs.len());
        for path in &wavs {
            let (samples, fs) = wav::read_mono(path)?;
            if fs != feature.fs {
                return Err(TrainError::SampleRateMismatch {
                    path: path.display().to_string(),
                    expected: feature.fs,
                    found: fs,
                });
            }
            let features = extractor.extract(&samples)?;
            rows.push(features.energies);
        }

        let stats = aggregate(&rows, feature.num_bands);
        log::info!(
            "trained '{}' from {} recordings in {}",
            label,
            stats.count,
            dir.display()
        );
        commands.insert(label.clone(), stats);
    }

    Ok(CommandModel {
        fs: feature.fs,
        frame_len: feature.frame_len,
        num_bands: feature.num_bands,
        window: feature.window,
        scaling: feature.scaling,
        commands,
    })
}

/// Train and persist in one step. The model is only written after every
/// label has been aggregated.
pub fn train_to_file(
    labels: &[(String, String)],
    feature: &FeatureConfig,
    min_recordings: usize,
    recordings_root: &Path,
    model_path: &Path,
) -> Result<CommandModel, TrainError> {
    let model = train_from_folders(labels, feature, min_recordings, recordings_root)?;
    model.save(model_path)?;
    Ok(model)
}

/// WAV files in `dir`, sorted lexicographically by file name.
fn list_wavs(dir: &Path) -> Result<Vec<PathBuf>, TrainError> {
    let entries = fs::read_dir(dir).map_err(|e| TrainError::Io {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut wavs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .collect();
    wavs.sort();
    Ok(wavs)
}

/// Per-column mean and population standard deviation over an MxK matrix.
fn aggregate(rows: &[Vec<f64>], num_bands: usize) -> CommandStats {
    let count = rows.len();
    let mut mean = vec![0.0; num_bands];
    for row in rows {
        for (m, e) in mean.iter_mut().zip(row) {
            *m += e;
        }
    }
    for m in &mut mean {
        *m /= count as f64;
    }

    let mut std = vec![0.0; num_bands];
    for row in rows {
        for ((s, m), e) in std.iter_mut().zip(&mean).zip(row) {
            let d = e - m;
            *s += d * d;
        }
    }
    for s in &mut std {
        *s = (*s / count as f64).sqrt();
    }

    CommandStats { mean, std, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier;
    use crate::analysis::features::{FeatureScaling, WindowKind};
    use std::f64::consts::TAU;

    const FS: u32 = 32768;
    const N: usize = 4096;
    const K: usize = 3;

    fn feature_config() -> FeatureConfig {
        FeatureConfig {
            fs: FS,
            frame_len: N,
            num_bands: K,
            window: WindowKind::Hamming,
            scaling: FeatureScaling::Linear,
        }
    }

    fn tone(freq: f64, amplitude: f64) -> Vec<f32> {
        (0..N)
            .map(|i| {
                let t = i as f64 / FS as f64;
                (amplitude * (TAU * freq * t).sin()) as f32
            })
            .collect()
    }

    fn write_clip(path: &Path, samples: &[f32]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: FS,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    struct TrainingDir(PathBuf);

    impl TrainingDir {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "voiceband_train_{}_{}",
                name,
                std::process::id()
            ));
            fs::create_dir_all(&root).unwrap();
            Self(root)
        }

        fn populate(&self, label: &str, freq: f64, clips: usize) {
            let dir = self.0.join(label);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..clips {
                // Slight amplitude variation so std is non-degenerate.
                let amplitude = 0.4 + 0.02 * i as f64;
                write_clip(
                    &dir.join(format!("{}_{}.wav", label, i + 1)),
                    &tone(freq, amplitude),
                );
            }
        }
    }

    impl Drop for TrainingDir {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.0).ok();
        }
    }

    fn labels(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| (n.to_string(), n.to_string()))
            .collect()
    }

    #[test]
    fn insufficient_recordings_names_folder_and_counts() {
        let dir = TrainingDir::new("insufficient");
        dir.populate("low", 1000.0, 3);

        let err = train_from_folders(&labels(&["low"]), &feature_config(), 5, &dir.0).unwrap_err();
        match err {
            TrainError::InsufficientData {
                label,
                folder,
                found,
                required,
            } => {
                assert_eq!(label, "low");
                assert!(folder.contains("low"));
                assert_eq!(found, 3);
                assert_eq!(required, 5);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn missing_folder_is_io_error() {
        let dir = TrainingDir::new("missing");
        let err = train_from_folders(&labels(&["ghost"]), &feature_config(), 5, &dir.0).unwrap_err();
        assert!(matches!(err, TrainError::Io { .. }));
    }

    #[test]
    fn trains_and_classifies_two_tones_end_to_end() {
        let dir = TrainingDir::new("e2e");
        // Tones in clearly distinct thirds of the 0..16384 Hz axis.
        dir.populate("low", 2000.0, 5);
        dir.populate("high", 12000.0, 5);

        let model =
            train_from_folders(&labels(&["low", "high"]), &feature_config(), 5, &dir.0).unwrap();

        assert_eq!(model.commands.len(), 2);
        for stats in model.commands.values() {
            assert_eq!(stats.mean.len(), K);
            assert_eq!(stats.std.len(), K);
            assert_eq!(stats.count, 5);
        }

        let extractor = SubbandExtractor::new(&feature_config()).unwrap();
        let probe = extractor.extract(&tone(2000.0, 0.45)).unwrap();
        let result = classifier::classify(&probe.energies, &model).unwrap();

        assert_eq!(result.label, "low");
        assert!(result.distances["low"] < result.distances["high"]);
    }

    #[test]
    fn train_to_file_persists_roundtrippable_model() {
        let dir = TrainingDir::new("persist");
        dir.populate("go", 4000.0, 5);

        let model_path = dir.0.join("model.json");
        let trained = train_to_file(
            &labels(&["go"]),
            &feature_config(),
            5,
            &dir.0,
            &model_path,
        )
        .unwrap();

        let loaded = CommandModel::load(&model_path).unwrap();
        assert_eq!(loaded, trained);
    }

    #[test]
    fn uses_first_m_files_in_name_order() {
        let dir = TrainingDir::new("order");
        dir.populate("cmd", 3000.0, 7);

        let model_all =
            train_from_folders(&labels(&["cmd"]), &feature_config(), 7, &dir.0).unwrap();
        let model_five =
            train_from_folders(&labels(&["cmd"]), &feature_config(), 5, &dir.0).unwrap();

        assert_eq!(model_all.commands["cmd"].count, 7);
        assert_eq!(model_five.commands["cmd"].count, 5);
    }

    #[test]
    fn aggregate_mean_and_population_std() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let stats = aggregate(&rows, 2);
        assert_eq!(stats.mean, vec![2.0, 10.0]);
        assert_eq!(stats.std, vec![1.0, 0.0]);
        assert_eq!(stats.count, 2);
    }
}
