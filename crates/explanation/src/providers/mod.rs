//! Language Model Providers
//!
//! - `OpenAiCompatible` - any chat-completions endpoint (Groq, OpenAI, vLLM)
//! - `ScriptedModel` - canned replies and injected failures

mod openai;
mod scripted;

pub use openai::{OpenAiCompatible, GROQ_BASE_URL, GROQ_DEFAULT_MODEL};
pub use scripted::ScriptedModel;
