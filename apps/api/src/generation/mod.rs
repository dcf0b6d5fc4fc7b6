// Interview generation and transcript parsing pipeline.
// Prompt building → LLM call → response interpretation, with generation jobs
// tracked in the process-wide JobStore.
// All LLM calls go through llm_client, never direct HTTP calls.

use thiserror::Error;

pub mod generator;
pub mod handlers;
pub mod interpreter;
pub mod jobs;
pub mod names;
pub mod prompts;

/// Failure kinds of the generation/parsing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller input out of range or malformed. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The LLM transport or service failed. Carries the underlying message verbatim.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The LLM replied, but not in the shape the prompt asked for.
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}
