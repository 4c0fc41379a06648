//! Explanation Engine
//!
//! Explains scored transactions. Confident scores get a locally composed
//! summary of risk factors and matched patterns. Borderline scores are sent to
//! a language model whose parsed verdict replaces the classifier's label.

mod engine;
mod llm;
mod prompt;
pub mod providers;
mod verdict;

pub use engine::{Explanation, ExplanationEngine};
pub use llm::{GenerationConfig, LanguageModel, LlmError};
pub use prompt::{borderline_prompt, order_by_relevance};
pub use providers::{OpenAiCompatible, ScriptedModel, GROQ_BASE_URL, GROQ_DEFAULT_MODEL};
pub use verdict::parse_verdict;

use thiserror::Error;

/// Errors while explaining a transaction
#[derive(Debug, Error)]
pub enum ExplanationError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Language model returned an empty reply")]
    EmptyReply,
    #[error("No verdict found in language model reply: {0}")]
    UnparseableVerdict(String),
}
