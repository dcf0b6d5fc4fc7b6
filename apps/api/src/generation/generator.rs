//! Interview Generator: orchestrates the generation and parsing pipelines.
//!
//! Generate flow: validate → resolve participant names (once) → build prompts →
//!                one LLM call → interpret → Transcript.
//! Parse flow:    validate length → build parsing prompt → one LLM call →
//!                interpret → ParsedContent.
//!
//! No retries here. State changes (job records, stored content) are the
//! caller's job; this module only talks to the LLM.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::generation::interpreter::{interpret_parsed_content, interpret_transcript};
use crate::generation::names::{resolve_participants, ParticipantNames};
use crate::generation::prompts::{build_generation_prompts, build_parsing_prompt};
use crate::generation::PipelineError;
use crate::llm_client::CompletionClient;
use crate::models::interview::{GenerationRequest, Transcript};
use crate::models::parsed::ParsedContent;

pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const GENERATION_MAX_TOKENS: u32 = 4000;
pub const PARSING_TEMPERATURE: f32 = 0.3;
pub const PARSING_MAX_TOKENS: u32 = 2000;

/// Transcripts shorter than this (after trimming) are rejected before any LLM call.
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

#[derive(Clone)]
pub struct Generator {
    llm: Arc<dyn CompletionClient>,
}

impl Generator {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Generates a synthetic interview. Names the request leaves blank are drawn at random.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Transcript, PipelineError> {
        request.validate()?;
        let names = resolve_participants(request, &mut rand::thread_rng());
        self.generate_with_names(request, &names).await
    }

    /// Same as `generate` with participant names already resolved.
    pub async fn generate_with_names(
        &self,
        request: &GenerationRequest,
        names: &ParticipantNames,
    ) -> Result<Transcript, PipelineError> {
        request.validate()?;
        info!(
            "Generating {} {} interview ({} min) between {} and {}",
            request.difficulty, request.topic, request.duration_minutes, names.interviewer, names.interviewee
        );

        let prompts = build_generation_prompts(request, names);
        let raw = self
            .llm
            .complete(
                &prompts.system,
                &prompts.user,
                GENERATION_TEMPERATURE,
                GENERATION_MAX_TOKENS,
            )
            .await
            .map_err(|e| {
                error!("Interview generation LLM call failed: {e}");
                PipelineError::Generation(e.to_string())
            })?;
        debug!("Generation response: {} chars", raw.len());

        let transcript = interpret_transcript(&raw, request, names, self.model())
            .inspect_err(|e| warn!("Generation response violated the prompt contract: {e}"))?;

        info!(
            "Generated interview with {} chapters, {} exchanges",
            transcript.chapters.len(),
            transcript.chapters.iter().map(|c| c.exchanges.len()).sum::<usize>()
        );
        Ok(transcript)
    }

    /// Extracts summary, highlights, entities and tasks from a real transcript.
    pub async fn parse_transcript(&self, text: &str) -> Result<ParsedContent, PipelineError> {
        if text.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
            return Err(PipelineError::Validation(format!(
                "Transcript text is too short or empty (minimum {MIN_TRANSCRIPT_CHARS} characters)"
            )));
        }

        let prompts = build_parsing_prompt(text);
        let raw = self
            .llm
            .complete(
                &prompts.system,
                &prompts.user,
                PARSING_TEMPERATURE,
                PARSING_MAX_TOKENS,
            )
            .await
            .map_err(|e| {
                error!("Transcript parsing LLM call failed: {e}");
                PipelineError::Generation(e.to_string())
            })?;

        let parsed = interpret_parsed_content(&raw)
            .inspect_err(|e| warn!("Parsing response violated the prompt contract: {e}"))?;

        info!(
            "Parsed transcript: {} highlights, {} lowlights, {} tasks",
            parsed.highlights.len(),
            parsed.lowlights.len(),
            parsed.executable_tasks.len()
        );
        Ok(parsed)
    }
}
