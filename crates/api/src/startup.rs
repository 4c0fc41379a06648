//! Workflow assembly from configuration

use crate::config::{AppConfig, LlmConfig, LlmProvider};
use anyhow::{Context, Result};
use explanation::{ExplanationEngine, LanguageModel, OpenAiCompatible, ScriptedModel};
use pattern_matcher::{PatternMatcher, PatternTable};
use risk_scorer::{LogisticClassifier, ModelMetadata, RiskScorer, RobustScaler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use workflow::DecisionWorkflow;

const GROQ_KEY_VAR: &str = "GROQ_API_KEY";

/// Load every artifact and wire up the decision workflow.
///
/// Any artifact or pattern table problem is fatal here.
pub fn build_workflow(config: &AppConfig) -> Result<DecisionWorkflow> {
    let models = &config.models;

    let metadata = ModelMetadata::load(&models.metadata_path).with_context(|| {
        format!("Failed to load model metadata from {}", models.metadata_path.display())
    })?;
    let metadata = Arc::new(metadata);

    let scaler = RobustScaler::load(&models.scaler_path).with_context(|| {
        format!("Failed to load amount scaler from {}", models.scaler_path.display())
    })?;
    let classifier = LogisticClassifier::load(&models.classifier_path, &metadata.feature_names)
        .with_context(|| {
            format!("Failed to load classifier from {}", models.classifier_path.display())
        })?;

    let scorer = RiskScorer::new(
        Box::new(classifier),
        Box::new(scaler),
        metadata.clone(),
        config.scoring.clone(),
    )
    .context("Invalid scoring configuration")?;

    let table = PatternTable::from_path(&models.patterns_path).with_context(|| {
        format!("Failed to load fraud patterns from {}", models.patterns_path.display())
    })?;
    info!(rules = table.len(), "Fraud patterns loaded");

    let explainer = ExplanationEngine::new(
        language_model(&config.llm),
        metadata,
        config.llm.generation.clone(),
    );

    Ok(DecisionWorkflow::new(scorer, PatternMatcher::new(table), explainer))
}

/// The configured language model client
pub fn language_model(config: &LlmConfig) -> Arc<dyn LanguageModel> {
    match config.provider {
        LlmProvider::Offline => {
            warn!("Language model disabled; borderline transactions will fail");
            Arc::new(ScriptedModel::new())
        }
        LlmProvider::OpenAi => {
            let api_key = if config.api_key.is_empty() {
                std::env::var(GROQ_KEY_VAR).unwrap_or_default()
            } else {
                config.api_key.clone()
            };
            if api_key.is_empty() {
                warn!(base_url = %config.base_url, "No language model API key configured");
            }
            Arc::new(
                OpenAiCompatible::new(&config.base_url, api_key, &config.model)
                    .with_timeout(Duration::from_secs(config.timeout_secs)),
            )
        }
    }
}
