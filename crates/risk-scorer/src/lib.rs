//! Risk Scorer
//!
//! Wraps the trained fraud classifier: scales the amount, aligns transaction
//! fields to the model's feature schema, and turns the positive-class
//! probability into a risk assessment with a borderline flag.

mod classifier;
mod metadata;
mod scaler;
mod scorer;

pub use classifier::{Classifier, FixedProbability, LogisticClassifier};
pub use metadata::{ModelInsights, ModelMetadata, TopFeature, TopFeatures};
pub use scaler::{AmountScaler, RobustScaler};
pub use scorer::{BorderlineBand, RiskAssessment, RiskScorer, ScorerConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while scoring a single transaction
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Transaction is missing the Amount field")]
    MissingAmount,
    #[error("Amount {0} cannot be scaled")]
    InvalidAmount(f64),
    #[error("Classifier rejected features: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Classifier returned invalid probability {0}")]
    InvalidProbability(f64),
}

/// Errors raised by a classifier implementation
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Non-finite value at feature index {0}")]
    NonFiniteFeature(usize),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

/// Errors while loading model artifacts. Fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

/// Read and deserialize a JSON artifact
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, ArtifactError> {
    let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
