use crate::llm::{GenerationConfig, LanguageModel};
use crate::prompt::borderline_prompt;
use crate::verdict::parse_verdict;
use crate::ExplanationError;
use pattern_matcher::MatchedPattern;
use risk_scorer::{ModelMetadata, RiskAssessment};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use transaction::Transaction;

/// Number of risk factors listed in a local explanation
const MAX_RISK_FACTORS: usize = 3;

/// Reply characters kept in an unparseable-verdict error
const REPLY_SNIPPET_CHARS: usize = 120;

/// Explanation for one decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub text: String,
    /// Language model verdict, only present for borderline assessments
    pub verdict: Option<bool>,
}

/// Explains risk assessments, calling the language model for borderline ones
#[derive(Debug)]
pub struct ExplanationEngine {
    model: Arc<dyn LanguageModel>,
    metadata: Arc<ModelMetadata>,
    generation: GenerationConfig,
}

impl ExplanationEngine {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        metadata: Arc<ModelMetadata>,
        generation: GenerationConfig,
    ) -> Self {
        info!(
            provider = model.name(),
            model = model.model(),
            "Explanation engine ready"
        );
        Self {
            model,
            metadata,
            generation,
        }
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Explain an assessment.
    ///
    /// Confident assessments are explained locally and carry no verdict.
    /// Borderline assessments go to the language model, and the verdict parsed
    /// from its reply is returned.
    pub fn explain(
        &self,
        transaction: &Transaction,
        assessment: &RiskAssessment,
        matched: &[MatchedPattern],
    ) -> Result<Explanation, ExplanationError> {
        if !assessment.is_borderline {
            return Ok(Explanation {
                text: self.local_explanation(transaction, matched),
                verdict: None,
            });
        }

        let prompt = borderline_prompt(transaction, assessment, matched);
        let start = Instant::now();
        let reply = self.model.complete(&prompt, &self.generation)?;
        debug!(
            provider = self.model.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply_chars = reply.len(),
            "Language model replied"
        );

        let text = reply.trim();
        if text.is_empty() {
            return Err(ExplanationError::EmptyReply);
        }

        match parse_verdict(text) {
            Some(verdict) => Ok(Explanation {
                text: text.to_string(),
                verdict: Some(verdict),
            }),
            None => {
                warn!(provider = self.model.name(), "Reply has no verdict line");
                Err(ExplanationError::UnparseableVerdict(
                    text.chars().take(REPLY_SNIPPET_CHARS).collect(),
                ))
            }
        }
    }

    /// Deterministic explanation built from the model's top features and
    /// the matched patterns.
    pub fn local_explanation(&self, transaction: &Transaction, matched: &[MatchedPattern]) -> String {
        let factors: Vec<String> = self
            .metadata
            .top_features
            .iter()
            .filter_map(|top| {
                transaction
                    .get(&top.feature)
                    .map(|value| format!("{} ({:.2})", top.feature, value))
            })
            .take(MAX_RISK_FACTORS)
            .collect();

        let mut text = String::new();
        if factors.is_empty() {
            text.push_str("Risk factors: none identified\n");
        } else {
            let _ = writeln!(text, "Risk factors: {}", factors.join(", "));
        }

        text.push_str("Matching patterns:");
        if matched.is_empty() {
            text.push_str("\n- none");
        }
        for pattern in matched {
            let _ = write!(text, "\n- {}", pattern.summary());
        }
        text
    }
}
