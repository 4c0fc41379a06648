//! Language Model Interface

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Errors from a language model provider
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("LLM not available: {0}")]
    NotAvailable(String),
    #[error("LLM timeout after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
    #[error("Rate limited{}", retry_hint(.retry_after_ms))]
    RateLimited { retry_after_ms: Option<u64> },
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
    #[error("LLM backend error: {0}")]
    Backend(String),
}

fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(", retry after {}ms", ms),
        None => String::new(),
    }
}

/// Sampling settings for a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Optional system message sent before the prompt
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
            top_p: 0.9,
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    /// Greedy decoding
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            ..Default::default()
        }
    }
}

/// Opaque text-completion service.
///
/// One prompt in, one non-streaming reply out. Implementations must be
/// `Send + Sync`; the engine shares one instance across workers.
pub trait LanguageModel: Send + Sync + Debug {
    fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError>;

    /// Provider name for diagnostics
    fn name(&self) -> &'static str;

    /// Model identifier
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_default() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 512);
        assert!((config.temperature - 0.2).abs() < 0.01);
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn test_generation_config_deterministic() {
        let config = GenerationConfig::deterministic();
        assert!(config.temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn test_error_display() {
        let limited = LlmError::RateLimited {
            retry_after_ms: Some(2000),
        };
        assert_eq!(limited.to_string(), "Rate limited, retry after 2000ms");
        let limited = LlmError::RateLimited {
            retry_after_ms: None,
        };
        assert_eq!(limited.to_string(), "Rate limited");
    }
}
