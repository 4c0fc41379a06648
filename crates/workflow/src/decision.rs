//! Decision Records

use pattern_matcher::MatchedPattern;
use risk_scorer::RiskAssessment;
use serde::Serialize;
use std::fmt;
use transaction::Transaction;

/// Explanation carried by every failed record
pub const FAILURE_EXPLANATION: &str = "Error: Failed to process transaction";

/// Workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scoring,
    PatternRetrieval,
    Explaining,
    /// The run ended without reporting a stage, such as a panicked task
    Unknown,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scoring => "scoring",
            Stage::PatternRetrieval => "pattern_retrieval",
            Stage::Explaining => "explaining",
            Stage::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which component produced the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    /// Threshold label of a confident assessment
    Classifier,
    /// Parsed reply for a borderline assessment
    LanguageModel,
}

/// Successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub transaction: Transaction,
    pub assessment: RiskAssessment,
    pub matched_patterns: Vec<MatchedPattern>,
    pub explanation: String,
    pub final_verdict: bool,
    pub verdict_source: VerdictSource,
}

/// Run that stopped at `stage`.
///
/// Results from the stages before the failure are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDecision {
    pub transaction: Transaction,
    pub stage: Stage,
    pub reason: String,
    pub assessment: Option<RiskAssessment>,
    pub matched_patterns: Option<Vec<MatchedPattern>>,
    pub explanation: String,
}

impl FailedDecision {
    pub fn new(
        transaction: Transaction,
        stage: Stage,
        reason: impl Into<String>,
        assessment: Option<RiskAssessment>,
        matched_patterns: Option<Vec<MatchedPattern>>,
    ) -> Self {
        Self {
            transaction,
            stage,
            reason: reason.into(),
            assessment,
            matched_patterns,
            explanation: FAILURE_EXPLANATION.to_string(),
        }
    }
}

/// Terminal result of one workflow run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionRecord {
    Completed(Decision),
    Failed(FailedDecision),
}

impl DecisionRecord {
    pub fn errored(&self) -> bool {
        matches!(self, DecisionRecord::Failed(_))
    }

    /// Final verdict. Always `None` for failed runs.
    pub fn final_verdict(&self) -> Option<bool> {
        match self {
            DecisionRecord::Completed(decision) => Some(decision.final_verdict),
            DecisionRecord::Failed(_) => None,
        }
    }

    pub fn explanation(&self) -> &str {
        match self {
            DecisionRecord::Completed(decision) => &decision.explanation,
            DecisionRecord::Failed(failed) => &failed.explanation,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        match self {
            DecisionRecord::Completed(decision) => &decision.transaction,
            DecisionRecord::Failed(failed) => &failed.transaction,
        }
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            DecisionRecord::Completed(decision) => Some(&decision.assessment),
            DecisionRecord::Failed(failed) => failed.assessment.as_ref(),
        }
    }

    pub fn matched_patterns(&self) -> &[MatchedPattern] {
        match self {
            DecisionRecord::Completed(decision) => &decision.matched_patterns,
            DecisionRecord::Failed(failed) => failed.matched_patterns.as_deref().unwrap_or(&[]),
        }
    }

    pub fn is_borderline(&self) -> bool {
        self.assessment().is_some_and(|a| a.is_borderline)
    }
}
