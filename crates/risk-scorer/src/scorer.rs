//! Risk Scorer Implementation

use crate::classifier::Classifier;
use crate::metadata::ModelMetadata;
use crate::scaler::AmountScaler;
use crate::{ArtifactError, ScoringError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use transaction::{Transaction, AMOUNT_FIELD};

/// Probability band in which the classifier's own label is not trusted.
/// Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderlineBand {
    pub low: f64,
    pub high: f64,
}

impl Default for BorderlineBand {
    fn default() -> Self {
        Self {
            low: 0.30,
            high: 0.70,
        }
    }
}

impl BorderlineBand {
    pub fn contains(&self, probability: f64) -> bool {
        self.low <= probability && probability <= self.high
    }
}

/// Scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Borderline probability band
    pub borderline: BorderlineBand,
    /// Threshold used when the model metadata has none
    pub default_threshold: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            borderline: BorderlineBand::default(),
            default_threshold: 0.5,
        }
    }
}

/// Classifier output for one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Positive-class probability (0.0 to 1.0)
    pub probability: f64,
    /// Same as `probability`; kept for display
    pub confidence: f64,
    /// Threshold label. `None` when borderline, where the label is deferred.
    pub is_fraud: Option<bool>,
    pub is_borderline: bool,
}

/// Scores transactions with a loaded classifier and scaler.
///
/// Holds only read-only state and is shared across concurrent runs.
#[derive(Debug)]
pub struct RiskScorer {
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn AmountScaler>,
    metadata: Arc<ModelMetadata>,
    band: BorderlineBand,
    threshold: f64,
}

impl RiskScorer {
    /// Create a scorer. Fails on an invalid band or threshold.
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn AmountScaler>,
        metadata: Arc<ModelMetadata>,
        config: ScorerConfig,
    ) -> Result<Self, ArtifactError> {
        let band = config.borderline;
        if !(0.0..=1.0).contains(&band.low) || !(0.0..=1.0).contains(&band.high) || band.low > band.high
        {
            return Err(ArtifactError::Invalid(format!(
                "borderline band [{}, {}] must lie within [0, 1] with low <= high",
                band.low, band.high
            )));
        }

        let threshold = metadata.threshold_or(config.default_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::Invalid(format!(
                "decision threshold {} must lie within [0, 1]",
                threshold
            )));
        }

        info!(
            classifier = classifier.name(),
            threshold,
            borderline_low = band.low,
            borderline_high = band.high,
            "Risk scorer ready"
        );

        Ok(Self {
            classifier,
            scaler,
            metadata,
            band,
            threshold,
        })
    }

    /// Score a transaction
    pub fn score(&self, transaction: &Transaction) -> Result<RiskAssessment, ScoringError> {
        let amount = transaction.amount().ok_or(ScoringError::MissingAmount)?;
        if !amount.is_finite() {
            return Err(ScoringError::InvalidAmount(amount));
        }

        let scaled_amount = self.scaler.transform(amount);
        let features = self.align_features(transaction, scaled_amount);
        let probability = self.classifier.predict_probability(&features)?;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidProbability(probability));
        }

        let assessment = self.assess(probability);
        debug!(
            probability,
            borderline = assessment.is_borderline,
            "Transaction scored"
        );
        Ok(assessment)
    }

    /// Build the fixed-order feature vector.
    ///
    /// Every schema slot starts at 0.0 and is overwritten by a matching field;
    /// the `Amount` slot takes the scaled amount. Unknown fields are ignored.
    pub fn align_features(&self, transaction: &Transaction, scaled_amount: f64) -> Vec<f64> {
        self.metadata
            .feature_names
            .iter()
            .map(|name| {
                if name == AMOUNT_FIELD {
                    scaled_amount
                } else {
                    transaction.get(name).unwrap_or(0.0)
                }
            })
            .collect()
    }

    /// Turn a probability into an assessment
    pub fn assess(&self, probability: f64) -> RiskAssessment {
        let is_borderline = self.band.contains(probability);
        let is_fraud = (!is_borderline).then_some(probability >= self.threshold);

        RiskAssessment {
            probability,
            confidence: probability,
            is_fraud,
            is_borderline,
        }
    }

    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.metadata
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn band(&self) -> BorderlineBand {
        self.band
    }
}
