// Nearest-mean classifier
//
// Assigns the label whose training-set mean energy vector is closest in
// Euclidean distance. The stored per-band standard deviation is deliberately
// not part of the distance: this is nearest-mean, not Mahalanobis. Labels
// are compared in lexicographic order with a strict less-than, so ties go to
// the first label in sort order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::model::CommandModel;

/// Outcome of one classification: the winning label plus the distance to
/// every label's mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub distances: BTreeMap<String, f64>,
}

/// Classify a feature vector against a trained model.
///
/// The vector length must equal the model's band count.
pub fn classify(
    energies: &[f64],
    model: &CommandModel,
) -> Result<Classification, AnalysisError> {
    if model.commands.is_empty() {
        return Err(AnalysisError::EmptyModel);
    }
    if energies.len() != model.num_bands {
        return Err(AnalysisError::ConfigMismatch {
            expected: model.num_bands,
            found: energies.len(),
        });
    }

    let mut distances = BTreeMap::new();
    let mut best_label: Option<&String> = None;
    let mut best_dist = f64::INFINITY;

    for (label, stats) in &model.commands {
        if stats.mean.len() != energies.len() {
            return Err(AnalysisError::ConfigMismatch {
                expected: energies.len(),
                found: stats.mean.len(),
            });
        }
        let dist = euclidean(energies, &stats.mean);
        if dist < best_dist {
            best_dist = dist;
            best_label = Some(label);
        }
        distances.insert(label.clone(), dist);
    }

    match best_label {
        Some(label) => Ok(Classification {
            label: label.clone(),
            distances,
        }),
        None => Err(AnalysisError::EmptyModel),
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
