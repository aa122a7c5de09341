use super::*;
use crate::analysis::features::{FeatureScaling, WindowKind};
use crate::model::CommandStats;
use std::collections::BTreeMap;

fn model_with(means: &[(&str, Vec<f64>)]) -> CommandModel {
    let num_bands = means.first().map(|(_, m)| m.len()).unwrap_or(0);
    let mut commands = BTreeMap::new();
    for (label, mean) in means {
        commands.insert(
            label.to_string(),
            CommandStats {
                std: vec![0.0; mean.len()],
                mean: mean.clone(),
                count: 5,
            },
        );
    }
    CommandModel {
        fs: 16000,
        frame_len: 8192,
        num_bands,
        window: WindowKind::Hamming,
        scaling: FeatureScaling::Linear,
        commands,
    }
}

#[test]
fn picks_nearest_mean_with_exact_distances() {
    let model = model_with(&[("a", vec![0.0, 0.0]), ("b", vec![10.0, 10.0])]);

    let result = classify(&[1.0, 1.0], &model).unwrap();
    assert_eq!(result.label, "a");
    assert!((result.distances["a"] - 2.0f64.sqrt()).abs() < 1e-12);
    assert!((result.distances["b"] - 162.0f64.sqrt()).abs() < 1e-12);
}

#[test]
fn reports_distance_to_every_label() {
    let model = model_with(&[
        ("left", vec![1.0, 0.0, 0.0]),
        ("right", vec![0.0, 1.0, 0.0]),
        ("stop", vec![0.0, 0.0, 1.0]),
    ]);
    let result = classify(&[0.0, 0.9, 0.1], &model).unwrap();
    assert_eq!(result.label, "right");
    assert_eq!(result.distances.len(), 3);
}

#[test]
fn ties_break_lexicographically() {
    // Equidistant means; "alpha" sorts before "beta".
    let model = model_with(&[("beta", vec![2.0, 0.0]), ("alpha", vec![0.0, 2.0])]);
    let result = classify(&[1.0, 1.0], &model).unwrap();
    assert_eq!(result.label, "alpha");
    assert_eq!(result.distances["alpha"], result.distances["beta"]);
}

#[test]
fn std_does_not_influence_the_decision() {
    let mut model = model_with(&[("near", vec![0.0, 0.0]), ("far", vec![5.0, 5.0])]);
    // Give the nearer label a huge spread; nearest-mean must ignore it.
    if let Some(stats) = model.commands.get_mut("near") {
        stats.std = vec![1000.0, 1000.0];
    }
    let result = classify(&[0.5, 0.5], &model).unwrap();
    assert_eq!(result.label, "near");
}

#[test]
fn empty_model_is_rejected() {
    let model = model_with(&[]);
    assert_eq!(classify(&[], &model).unwrap_err(), AnalysisError::EmptyModel);
}

#[test]
fn wrong_vector_length_is_config_mismatch() {
    let model = model_with(&[("a", vec![0.0, 0.0, 0.0])]);
    let err = classify(&[1.0, 2.0], &model).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::ConfigMismatch {
            expected: 3,
            found: 2
        }
    );
}
