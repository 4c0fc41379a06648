//! Decision Pipeline

use crate::decision::{Decision, DecisionRecord, FailedDecision, Stage, VerdictSource};
use explanation::ExplanationEngine;
use pattern_matcher::PatternMatcher;
use risk_scorer::RiskScorer;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};
use transaction::Transaction;

/// Sequences scorer, matcher and explainer for one transaction at a time.
///
/// All collaborators are read-only after construction, so one workflow can be
/// shared behind an `Arc` by any number of concurrent runs.
#[derive(Debug)]
pub struct DecisionWorkflow {
    scorer: RiskScorer,
    matcher: PatternMatcher,
    explainer: ExplanationEngine,
}

impl DecisionWorkflow {
    pub fn new(scorer: RiskScorer, matcher: PatternMatcher, explainer: ExplanationEngine) -> Self {
        info!(
            rules = matcher.table().len(),
            threshold = scorer.threshold(),
            "Decision workflow ready"
        );
        Self {
            scorer,
            matcher,
            explainer,
        }
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    pub fn explainer(&self) -> &ExplanationEngine {
        &self.explainer
    }

    /// Process one transaction. Never fails; errors become `Failed` records.
    pub fn run(&self, transaction: Transaction) -> DecisionRecord {
        let span = info_span!("decision", id = transaction.id().unwrap_or("-"));
        let _guard = span.enter();

        let start = Instant::now();
        let record = self.decide(transaction);
        record_metrics(&record, start.elapsed());

        if let DecisionRecord::Failed(failed) = &record {
            warn!(stage = %failed.stage, reason = %failed.reason, "Transaction failed");
        }
        record
    }

    fn decide(&self, transaction: Transaction) -> DecisionRecord {
        let assessment = match self.scorer.score(&transaction) {
            Ok(assessment) => assessment,
            Err(e) => {
                return DecisionRecord::Failed(FailedDecision::new(
                    transaction,
                    Stage::Scoring,
                    e.to_string(),
                    None,
                    None,
                ))
            }
        };

        let matched = match self.matcher.match_transaction(&transaction) {
            Ok(matched) => matched,
            Err(e) => {
                return DecisionRecord::Failed(FailedDecision::new(
                    transaction,
                    Stage::PatternRetrieval,
                    e.to_string(),
                    Some(assessment),
                    None,
                ))
            }
        };
        debug!(matched = matched.len(), "Patterns retrieved");

        let explanation = match self.explainer.explain(&transaction, &assessment, &matched) {
            Ok(explanation) => explanation,
            Err(e) => {
                return DecisionRecord::Failed(FailedDecision::new(
                    transaction,
                    Stage::Explaining,
                    e.to_string(),
                    Some(assessment),
                    Some(matched),
                ))
            }
        };

        let resolved = if assessment.is_borderline {
            explanation
                .verdict
                .map(|verdict| (verdict, VerdictSource::LanguageModel))
        } else {
            assessment
                .is_fraud
                .map(|verdict| (verdict, VerdictSource::Classifier))
        };
        let Some((final_verdict, verdict_source)) = resolved else {
            return DecisionRecord::Failed(FailedDecision::new(
                transaction,
                Stage::Explaining,
                "no verdict available for assessment",
                Some(assessment),
                Some(matched),
            ));
        };

        debug!(final_verdict, source = ?verdict_source, "Decision complete");
        DecisionRecord::Completed(Decision {
            transaction,
            assessment,
            matched_patterns: matched,
            explanation: explanation.text,
            final_verdict,
            verdict_source,
        })
    }
}

fn record_metrics(record: &DecisionRecord, elapsed: Duration) {
    let outcome = match record.final_verdict() {
        Some(true) => "fraud",
        Some(false) => "legitimate",
        None => "failed",
    };
    metrics::counter!("fraud_decisions_total", "outcome" => outcome).increment(1);

    if let DecisionRecord::Failed(failed) = record {
        metrics::counter!("fraud_decision_failures_total", "stage" => failed.stage.as_str())
            .increment(1);
    }
    if let Some(assessment) = record.assessment() {
        metrics::histogram!("fraud_probability").record(assessment.probability);
    }
    metrics::histogram!("fraud_decision_latency_seconds").record(elapsed.as_secs_f64());
}
