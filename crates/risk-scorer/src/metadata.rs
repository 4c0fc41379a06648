//! Model Metadata

use crate::{read_json, ArtifactError};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

fn default_model_version() -> String {
    "1.0.0".to_string()
}

fn default_training_date() -> String {
    "unknown".to_string()
}

/// One of the model's globally most important features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFeature {
    pub rank: u32,
    pub feature: String,
    #[serde(default)]
    pub importance: Option<f64>,
}

/// Top features in rank order.
///
/// Deserializes from either a list of `TopFeature` or the column form written
/// by pandas: `{"Feature": {"1": "V14"}, "Importance": {"1": 0.31}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawTopFeatures")]
pub struct TopFeatures(Vec<TopFeature>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTopFeatures {
    List(Vec<TopFeature>),
    Columns {
        #[serde(rename = "Feature")]
        feature: BTreeMap<String, String>,
        #[serde(rename = "Importance", default)]
        importance: BTreeMap<String, f64>,
    },
}

impl TryFrom<RawTopFeatures> for TopFeatures {
    type Error = String;

    fn try_from(raw: RawTopFeatures) -> Result<Self, Self::Error> {
        let mut features = match raw {
            RawTopFeatures::List(list) => list,
            RawTopFeatures::Columns {
                feature,
                importance,
            } => feature
                .into_iter()
                .map(|(rank, name)| {
                    let parsed = rank
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("top feature rank '{}' is not an integer", rank))?;
                    Ok(TopFeature {
                        rank: parsed,
                        importance: importance.get(&rank).copied(),
                        feature: name,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?,
        };

        features.sort_by_key(|f| f.rank);
        Ok(Self(features))
    }
}

impl Serialize for TopFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl TopFeatures {
    pub fn new(mut features: Vec<TopFeature>) -> Self {
        features.sort_by_key(|f| f.rank);
        Self(features)
    }

    /// Features in rank order, most important first
    pub fn iter(&self) -> impl Iterator<Item = &TopFeature> {
        self.0.iter()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.iter().any(|f| f.feature == feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Metadata written alongside the trained model.
///
/// Every key is optional in the file. `optimal_threshold` falls back to the
/// scorer's configured default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default = "default_model_version")]
    pub model_version: String,
    #[serde(default = "default_training_date")]
    pub training_date: String,
    #[serde(default)]
    pub optimal_threshold: Option<f64>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub top_features: TopFeatures,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    #[serde(default)]
    pub auprc: Option<f64>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            model_version: default_model_version(),
            training_date: default_training_date(),
            optimal_threshold: None,
            feature_names: Vec::new(),
            top_features: TopFeatures::default(),
            precision: None,
            recall: None,
            auprc: None,
        }
    }
}

/// Summary shown to operators alongside decisions
#[derive(Debug, Clone, Serialize)]
pub struct ModelInsights {
    pub model_version: String,
    pub training_date: String,
    pub optimal_threshold: Option<f64>,
    pub feature_count: usize,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub auprc: Option<f64>,
    pub top_features: Vec<TopFeature>,
}

impl ModelMetadata {
    /// Load metadata from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let metadata: Self = read_json(path)?;

        if metadata.feature_names.is_empty() {
            warn!("Model metadata at {} lists no feature names", path.display());
        }
        info!(
            version = %metadata.model_version,
            features = metadata.feature_names.len(),
            top_features = metadata.top_features.len(),
            "Model metadata loaded"
        );
        Ok(metadata)
    }

    /// The decision threshold, or `default` when the metadata has none
    pub fn threshold_or(&self, default: f64) -> f64 {
        match self.optimal_threshold {
            Some(threshold) => threshold,
            None => {
                warn!(
                    "Model metadata has no optimal_threshold, using default {:.2}",
                    default
                );
                default
            }
        }
    }

    pub fn insights(&self) -> ModelInsights {
        ModelInsights {
            model_version: self.model_version.clone(),
            training_date: self.training_date.clone(),
            optimal_threshold: self.optimal_threshold,
            feature_count: self.feature_names.len(),
            precision: self.precision,
            recall: self.recall,
            auprc: self.auprc,
            top_features: self.top_features.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PANDAS_METADATA: &str = r#"{
        "optimal_threshold": 0.42,
        "feature_names": ["V1", "V2", "Amount"],
        "top_features": {
            "Feature": {"2": "V2", "1": "V14", "10": "Amount"},
            "Importance": {"1": 0.31, "2": 0.12}
        },
        "precision": 0.91,
        "recall": 0.83,
        "auprc": 0.87
    }"#;

    #[test]
    fn test_pandas_top_features_sorted_by_rank() {
        let metadata: ModelMetadata = serde_json::from_str(PANDAS_METADATA).unwrap();
        let names: Vec<&str> = metadata
            .top_features
            .iter()
            .map(|f| f.feature.as_str())
            .collect();
        assert_eq!(names, vec!["V14", "V2", "Amount"]);
        assert_eq!(metadata.top_features.iter().next().unwrap().importance, Some(0.31));
        assert_eq!(metadata.top_features.iter().last().unwrap().importance, None);
        assert!(metadata.top_features.contains("V2"));
    }

    #[test]
    fn test_list_top_features() {
        let json = r#"{"top_features": [{"rank": 2, "feature": "V4"}, {"rank": 1, "feature": "V17", "importance": 0.2}]}"#;
        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.top_features.iter().next().unwrap().feature, "V17");
    }

    #[test]
    fn test_missing_keys_default() {
        let metadata: ModelMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata.model_version, "1.0.0");
        assert_eq!(metadata.training_date, "unknown");
        assert!(metadata.optimal_threshold.is_none());
        assert!(metadata.feature_names.is_empty());
        assert!(metadata.top_features.is_empty());
        assert_eq!(metadata.threshold_or(0.5), 0.5);
    }

    #[test]
    fn test_bad_rank_rejected() {
        let json = r#"{"top_features": {"Feature": {"first": "V1"}}}"#;
        assert!(serde_json::from_str::<ModelMetadata>(json).is_err());
    }

    #[test]
    fn test_load_and_insights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PANDAS_METADATA.as_bytes()).unwrap();

        let metadata = ModelMetadata::load(file.path()).unwrap();
        assert_eq!(metadata.threshold_or(0.5), 0.42);

        let insights = metadata.insights();
        assert_eq!(insights.feature_count, 3);
        assert_eq!(insights.precision, Some(0.91));
        assert_eq!(insights.top_features.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ModelMetadata::load("/nonexistent/model_metadata.json"),
            Err(ArtifactError::Io { .. })
        ));
    }
}
