//! Question-answering pipeline
//!
//! [`Orchestrator::answer`] runs cache lookup → SQL generation → guarded
//! execution → answer synthesis → cache store for one question.

use finqa_llm::LlmError;
use thiserror::Error;

pub mod cache;
pub mod pipeline;

pub use cache::{CacheEntry, ResponseCache, DEFAULT_TTL_SECS};
pub use pipeline::Orchestrator;

/// Failures that escape the pipeline; everything else becomes the apology answer
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("SQL generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(#[source] LlmError),

    #[error("Query worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
