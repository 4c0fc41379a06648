//! Fraud Pattern Matching
//!
//! Static threshold rules loaded once from the pattern table and evaluated
//! against each transaction in table order.

mod matcher;
mod rule;
mod table;

pub use matcher::{MatchedPattern, PatternMatcher};
pub use rule::{Comparator, Condition, PatternRule, RiskLevel};
pub use table::PatternTable;

use thiserror::Error;

/// Errors in the pattern table. Always fatal at load time.
#[derive(Debug, Error)]
pub enum PatternConfigError {
    #[error("Failed to read pattern table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to open pattern table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Row {row}: invalid condition '{condition}': {reason}")]
    InvalidCondition {
        row: usize,
        condition: String,
        reason: &'static str,
    },
    #[error("Row {row}: unknown risk level '{value}'")]
    UnknownRiskLevel { row: usize, value: String },
    #[error("Row {row}: empty feature name")]
    EmptyFeature { row: usize },
}

/// Errors while matching a single transaction
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    #[error("Feature {feature} has non-finite value {value}")]
    NonFiniteValue { feature: String, value: f64 },
}
