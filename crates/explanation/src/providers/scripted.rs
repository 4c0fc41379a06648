//! Scripted language model
//!
//! Replies come from a queue of canned results, then from an optional default
//! reply. With neither, calls fail as `NotAvailable`, which makes this the
//! provider used when the service runs without a configured endpoint.

use crate::llm::{GenerationConfig, LanguageModel, LlmError};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct ScriptedModel {
    /// Queued results, consumed front first
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    /// Reply once the queue is empty
    default_reply: Option<String>,
    /// Every prompt received, in order
    prompts: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedModel {
    /// A model with no replies; every call fails
    pub fn new() -> Self {
        Self::default()
    }

    /// A model that always answers with `reply`
    pub fn with_default_reply(reply: impl Into<String>) -> Self {
        Self {
            default_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Queue a reply for the next call
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.script).push_back(Ok(reply.into()));
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, error: LlmError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());

        if let Some(result) = lock(&self.script).pop_front() {
            return result;
        }
        self.default_reply
            .clone()
            .ok_or_else(|| LlmError::NotAvailable("no language model configured".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_default() {
        let model = ScriptedModel::with_default_reply("default");
        model.push_reply("first");
        model.push_error(LlmError::Timeout { elapsed_ms: 10 });

        let config = GenerationConfig::default();
        assert_eq!(model.complete("a", &config).unwrap(), "first");
        assert!(matches!(
            model.complete("b", &config),
            Err(LlmError::Timeout { elapsed_ms: 10 })
        ));
        assert_eq!(model.complete("c", &config).unwrap(), "default");
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unconfigured_is_not_available() {
        let model = ScriptedModel::new();
        assert!(matches!(
            model.complete("a", &GenerationConfig::default()),
            Err(LlmError::NotAvailable(_))
        ));
        assert_eq!(model.call_count(), 1);
    }
}
