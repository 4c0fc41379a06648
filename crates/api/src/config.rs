//! Service configuration
//!
//! Layered from an optional TOML file and `FRAUD_SHIELD__`-prefixed
//! environment variables, e.g. `FRAUD_SHIELD__LLM__API_KEY`. Every key has a
//! default, so the service starts with neither.

use crate::rate_limit::RateLimitConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use explanation::{GenerationConfig, GROQ_BASE_URL, GROQ_DEFAULT_MODEL};
use risk_scorer::ScorerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/fraud-shield.toml";

const ENV_PREFIX: &str = "FRAUD_SHIELD";
const ENV_SEPARATOR: &str = "__";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub scoring: ScorerConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Model artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub metadata_path: PathBuf,
    pub scaler_path: PathBuf,
    pub classifier_path: PathBuf,
    /// Fraud pattern table (CSV)
    pub patterns_path: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            metadata_path: PathBuf::from("models/model_metadata.json"),
            scaler_path: PathBuf::from("models/amount_scaler.json"),
            classifier_path: PathBuf::from("models/classifier.json"),
            patterns_path: PathBuf::from("models/aligned_fraud_patterns.csv"),
        }
    }
}

/// Which language model backs borderline explanations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any OpenAI-compatible chat completions endpoint
    #[default]
    OpenAi,
    /// No endpoint; borderline transactions fail at the explaining stage
    Offline,
}

/// Language model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    /// Falls back to `GROQ_API_KEY` when empty
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub generation: GenerationConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: GROQ_BASE_URL.to_string(),
            api_key: String::new(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            generation: GenerationConfig::default(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub rate_limit: RateLimitConfig,
    /// Largest accepted batch request
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            rate_limit: RateLimitConfig::default(),
            max_batch_size: 1000,
        }
    }
}

/// Batch processing settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Concurrent decision workers
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific file, if present, and the environment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.scoring.default_threshold, 0.5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.models.patterns_path, PathBuf::from("models/aligned_fraud_patterns.csv"));
        assert_eq!(config.scoring.borderline.low, 0.30);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[scoring]
default_threshold = 0.6

[scoring.borderline]
low = 0.25
high = 0.75

[llm]
provider = "offline"

[llm.generation]
temperature = 0.0

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.scoring.default_threshold, 0.6);
        assert_eq!(config.scoring.borderline.high, 0.75);
        assert_eq!(config.llm.provider, LlmProvider::Offline);
        assert_eq!(config.llm.generation.temperature, 0.0);
        assert_eq!(config.llm.generation.max_tokens, 512);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.addr, "0.0.0.0:8080");
    }
}
