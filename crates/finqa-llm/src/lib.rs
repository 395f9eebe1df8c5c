//! Language-model stages of the pipeline
//!
//! - [`SqlGenerator`]: question → `{"sql", "error"}` under the schema contract
//! - [`AnswerSynthesizer`]: execution result → prose, with a scalar fast path
//!
//! Both talk to a [`ChatBackend`]; [`OpenAiBackend`] speaks the
//! OpenAI-compatible chat-completions protocol.

use async_openai::error::OpenAIError;
use thiserror::Error;

pub mod answer;
pub mod backend;
pub mod schema;
pub mod sql;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use answer::{format_number, format_scalar, AnswerSynthesizer, MODEL_NO_ANSWER, NO_ANSWER};
pub use backend::{ChatBackend, ChatRequest, OpenAiBackend};
pub use sql::{parse_generation, SqlGeneration, SqlGenerator};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Language model request failed: {0}")]
    Backend(#[from] OpenAIError),

    #[error("Language model backend unavailable: {0}")]
    Unavailable(String),

    #[error("Language model returned an empty response")]
    EmptyResponse,

    #[error("No valid JSON found in LLM response: {0}")]
    MalformedGenerationOutput(String),
}
