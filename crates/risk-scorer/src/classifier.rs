//! Classifier Implementations

use crate::{read_json, ArtifactError, ClassifierError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

/// A trained binary classifier over a fixed-order feature vector
pub trait Classifier: Send + Sync + Debug {
    /// Positive-class (fraud) probability
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ClassifierError>;

    /// Name for diagnostics
    fn name(&self) -> &str;
}

/// On-disk logistic model, weights keyed by feature name
#[derive(Debug, Deserialize)]
struct LogisticArtifact {
    bias: f64,
    #[serde(default)]
    weights: HashMap<String, f64>,
}

/// Logistic regression aligned to the metadata feature schema
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    bias: f64,
    weights: Vec<f64>,
}

impl LogisticClassifier {
    /// Create from weights already in schema order
    pub fn new(bias: f64, weights: Vec<f64>) -> Self {
        Self { bias, weights }
    }

    /// Load from JSON `{"bias": .., "weights": {"V1": .., ...}}`.
    ///
    /// Weights are aligned to `feature_names`; a weight for a feature outside
    /// the schema is rejected, a schema feature without a weight gets 0.
    pub fn load<P: AsRef<Path>>(path: P, feature_names: &[String]) -> Result<Self, ArtifactError> {
        let artifact: LogisticArtifact = read_json(path.as_ref())?;

        if let Some(unknown) = artifact
            .weights
            .keys()
            .find(|name| !feature_names.contains(*name))
        {
            return Err(ArtifactError::Invalid(format!(
                "classifier weight for unknown feature '{}'",
                unknown
            )));
        }
        if !artifact.bias.is_finite() || artifact.weights.values().any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(
                "classifier parameters must be finite".to_string(),
            ));
        }

        let weights = feature_names
            .iter()
            .map(|name| artifact.weights.get(name).copied().unwrap_or(0.0))
            .collect::<Vec<_>>();

        info!(
            path = %path.as_ref().display(),
            features = weights.len(),
            "Logistic classifier loaded"
        );
        Ok(Self::new(artifact.bias, weights))
    }
}

impl Classifier for LogisticClassifier {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        if features.len() != self.weights.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }
        if let Some(index) = features.iter().position(|x| !x.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature(index));
        }

        let logit = self.bias
            + features
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        let probability = 1.0 / (1.0 + (-logit).exp());

        debug!("Logistic logit {:.4} -> probability {:.4}", logit, probability);
        Ok(probability)
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Classifier returning a fixed probability regardless of input (mock mode)
#[derive(Debug, Clone, Copy)]
pub struct FixedProbability(pub f64);

impl Classifier for FixedProbability {
    fn predict_probability(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn schema() -> Vec<String> {
        vec!["V1".to_string(), "V2".to_string(), "Amount".to_string()]
    }

    #[test]
    fn test_zero_logit_is_half() {
        let classifier = LogisticClassifier::new(0.0, vec![1.0, -1.0]);
        let p = classifier.predict_probability(&[2.0, 2.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let classifier = LogisticClassifier::new(0.0, vec![1.0, 1.0]);
        assert!(matches!(
            classifier.predict_probability(&[1.0]),
            Err(ClassifierError::InvalidInputShape {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_non_finite_feature() {
        let classifier = LogisticClassifier::new(0.0, vec![1.0]);
        assert!(matches!(
            classifier.predict_probability(&[f64::NAN]),
            Err(ClassifierError::NonFiniteFeature(0))
        ));
    }

    #[test]
    fn test_load_aligns_weights_to_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"bias": -1.0, "weights": {"V2": 2.0}}"#)
            .unwrap();

        let classifier = LogisticClassifier::load(file.path(), &schema()).unwrap();
        // V2 = 0.5 gives logit 0
        let p = classifier.predict_probability(&[9.0, 0.5, 9.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_unknown_feature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"bias": 0.0, "weights": {"V99": 1.0}}"#)
            .unwrap();
        assert!(matches!(
            LogisticClassifier::load(file.path(), &schema()),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn test_fixed_probability() {
        assert_eq!(FixedProbability(0.85).predict_probability(&[]).unwrap(), 0.85);
    }
}
