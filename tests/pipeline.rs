// End-to-end pipeline test: record clips to disk, train, persist, reload,
// and classify an unseen recording through the recognizer facade.

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use voiceband::audio::wav;
use voiceband::model::trainer;
use voiceband::{
    AudioConfig, CommandModel, FeatureConfig, FeatureScaling, Recognizer, TriggerConfig,
    WindowKind,
};

const FS: u32 = 32768;
const N: usize = 4096;

struct Workspace(PathBuf);

impl Workspace {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "voiceband_pipeline_{}_{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&root).unwrap();
        Self(root)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.0).ok();
    }
}

fn tone(freq: f64, amplitude: f64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (amplitude * (TAU * freq * i as f64 / FS as f64).sin()) as f32)
        .collect()
}

fn record_clips(root: &Path, label: &str, freq: f64, clips: usize) {
    let dir = root.join(label);
    fs::create_dir_all(&dir).unwrap();
    for i in 0..clips {
        let amplitude = 0.4 + 0.02 * i as f64;
        wav::write_mono(
            &dir.join(format!("{}_{}.wav", label, i + 1)),
            &tone(freq, amplitude, N),
            FS,
        )
        .unwrap();
    }
}

fn feature_config() -> FeatureConfig {
    FeatureConfig {
        fs: FS,
        frame_len: N,
        num_bands: 3,
        window: WindowKind::Hamming,
        scaling: FeatureScaling::Linear,
    }
}

#[test]
fn train_persist_reload_and_recognize() {
    let workspace = Workspace::new("recognize");
    let root = workspace.path();

    // Three commands in clearly separated thirds of the spectrum.
    record_clips(root, "low", 2000.0, 5);
    record_clips(root, "mid", 7000.0, 5);
    record_clips(root, "high", 12000.0, 5);

    let labels: Vec<(String, String)> = ["low", "mid", "high"]
        .iter()
        .map(|l| (l.to_string(), l.to_string()))
        .collect();
    let model_path = root.join("model.json");
    trainer::train_to_file(&labels, &feature_config(), 5, root, &model_path).unwrap();

    // A fresh process would start here: reload from disk.
    let model = CommandModel::load(&model_path).unwrap();
    assert_eq!(model.commands.len(), 3);
    assert_eq!(model.num_bands, 3);

    let recognizer =
        Recognizer::new(model, TriggerConfig::default(), AudioConfig::default()).unwrap();

    // Unseen probes: nearby frequencies, different amplitude, and one clip
    // that is shorter than the frame (zero-padded by the extractor).
    let probes = [
        ("probe_low.wav", tone(2100.0, 0.3, N), "low"),
        ("probe_mid.wav", tone(6900.0, 0.6, N), "mid"),
        ("probe_high.wav", tone(11800.0, 0.5, N - 512), "high"),
    ];
    for (name, samples, expected) in &probes {
        let path = root.join(name);
        wav::write_mono(&path, samples, FS).unwrap();
        let result = recognizer.recognize_file(&path).unwrap();
        assert_eq!(&result.label, expected, "probe {}", name);
        assert_eq!(result.distances.len(), 3);
    }
}

#[test]
fn persisted_model_keeps_the_documented_field_names() {
    let workspace = Workspace::new("fields");
    let root = workspace.path();
    record_clips(root, "go", 4000.0, 5);

    let model_path = root.join("model.json");
    trainer::train_to_file(
        &[("go".to_string(), "go".to_string())],
        &feature_config(),
        5,
        root,
        &model_path,
    )
    .unwrap();

    let raw = fs::read_to_string(&model_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["fs"], FS);
    assert_eq!(value["N"], N);
    assert_eq!(value["K"], 3);
    assert_eq!(value["window"], "hamming");
    assert!(value["commands"]["go"]["mean"].is_array());
    assert!(value["commands"]["go"]["std"].is_array());
    assert_eq!(value["commands"]["go"]["count"], 5);
}
