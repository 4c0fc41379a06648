//! OpenAI-compatible chat completions provider
//!
//! Works with any endpoint implementing `POST {base_url}/chat/completions`,
//! including Groq, OpenAI and local vLLM or llama.cpp servers.
//!
//! ```rust,ignore
//! let groq = OpenAiCompatible::new(GROQ_BASE_URL, std::env::var("GROQ_API_KEY")?, GROQ_DEFAULT_MODEL);
//! let local = OpenAiCompatible::new("http://localhost:8000/v1", "", "Qwen/Qwen2.5-7B");
//! ```

use crate::llm::{GenerationConfig, LanguageModel, LlmError};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Groq's OpenAI-compatible endpoint
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Hosted Llama 3.1 8B
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client over blocking HTTP
pub struct OpenAiCompatible {
    base_url: String,
    /// May be empty for local servers
    api_key: String,
    model_name: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl fmt::Debug for OpenAiCompatible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatible")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("timeout", &self.timeout)
            .field("api_key", &if self.api_key.is_empty() { "<none>" } else { "<redacted>" })
            .finish()
    }
}

impl OpenAiCompatible {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let timeout = Duration::from_secs(30);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_name: model.into(),
            timeout,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Set the transport timeout for the whole request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self
    }

    fn map_error(&self, error: ureq::Error) -> LlmError {
        match error {
            ureq::Error::Status(429, response) => LlmError::RateLimited {
                retry_after_ms: response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(|secs| secs * 1000),
            },
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                LlmError::Backend(format!("API error {}: {}", code, body))
            }
            ureq::Error::Transport(transport) => {
                let message = transport.to_string();
                if message.contains("timeout") || message.contains("timed out") {
                    LlmError::Timeout {
                        elapsed_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    LlmError::NotAvailable(format!("Transport error: {}", message))
                }
            }
        }
    }
}

fn first_content(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Missing content in response".to_string()))
}

impl LanguageModel for OpenAiCompatible {
    fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &config.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.model_name,
            "messages": messages,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "max_tokens": config.max_tokens,
            "stream": false,
        });

        let mut request = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            request = request.set("Authorization", &format!("Bearer {}", self.api_key));
        }

        debug!(model = %self.model_name, prompt_chars = prompt.len(), "Sending completion request");
        let response = request.send_json(body).map_err(|e| self.map_error(e))?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        first_content(parsed)
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model_name
    }
}
