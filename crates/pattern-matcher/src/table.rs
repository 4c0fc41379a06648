//! Pattern Table Loading

use crate::rule::{Condition, PatternRule, RiskLevel};
use crate::PatternConfigError;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One raw row of the pattern table CSV
#[derive(Debug, Deserialize)]
struct PatternRow {
    fraud_type: String,
    feature: String,
    condition: String,
    risk_level: String,
    description: String,
}

impl PatternRow {
    fn into_rule(self, row: usize) -> Result<PatternRule, PatternConfigError> {
        let feature = self.feature.trim().to_string();
        if feature.is_empty() {
            return Err(PatternConfigError::EmptyFeature { row });
        }

        // Some tables repeat the feature name, e.g. "V2 > 3.0"
        let text = self.condition.trim();
        let text = text.strip_prefix(feature.as_str()).unwrap_or(text);
        let condition =
            Condition::parse(text).map_err(|reason| PatternConfigError::InvalidCondition {
                row,
                condition: self.condition.clone(),
                reason,
            })?;

        let risk_level = self.risk_level.parse::<RiskLevel>().map_err(|_| {
            PatternConfigError::UnknownRiskLevel {
                row,
                value: self.risk_level.clone(),
            }
        })?;

        Ok(PatternRule {
            fraud_type: self.fraud_type,
            feature,
            condition,
            risk_level,
            description: self.description,
        })
    }
}

/// Read-only rule table, in source order
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    rules: Vec<Arc<PatternRule>>,
}

impl PatternTable {
    /// Build a table from already typed rules
    pub fn from_rules(rules: Vec<PatternRule>) -> Self {
        Self {
            rules: rules.into_iter().map(Arc::new).collect(),
        }
    }

    /// Load the table from CSV with columns
    /// `fraud_type, feature, condition, risk_level, description`.
    ///
    /// Any bad row rejects the whole table. Row numbers count data rows from 1.
    pub fn from_reader<R: Read>(source: R) -> Result<Self, PatternConfigError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut rules = Vec::new();
        for (index, row) in reader.deserialize::<PatternRow>().enumerate() {
            let rule = row?.into_rule(index + 1)?;
            rules.push(Arc::new(rule));
        }

        info!("Loaded {} fraud pattern rules", rules.len());
        Ok(Self { rules })
    }

    /// Load the table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PatternConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        info!("Loading fraud patterns from {}", path.as_ref().display());
        Self::from_reader(file)
    }

    /// Rules in table order
    pub fn rules(&self) -> &[Arc<PatternRule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
