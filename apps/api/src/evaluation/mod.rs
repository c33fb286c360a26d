// The evaluation pipeline: scoring utilities, the two evaluator backends,
// and the orchestrator that drives a job through its six stages.

pub mod handlers;
pub mod heuristic;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod repo;
pub mod scoring;
pub mod strategy;

use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::rag::embeddings::EmbeddingError;

/// Everything that can abort a pipeline run. Input errors and malformed
/// model responses fail the job outright; transient backend errors have
/// already exhausted their in-client retries by the time they surface
/// here; the queue layer owns any further (outer) retry.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{0} is empty or could not be parsed")]
    EmptyDocument(&'static str),

    #[error("file {0} not found")]
    MissingFile(Uuid),

    #[error("LLM client not available. Please configure ANTHROPIC_API_KEY.")]
    LlmUnavailable,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
