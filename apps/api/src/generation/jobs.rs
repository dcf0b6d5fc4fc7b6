//! Job Status Store: process-wide, in-memory record of generation jobs.
//!
//! Lifecycle: `create` → `generating`, then exactly one of `complete` / `fail`.
//! Terminal records are never rewritten. Jobs live until deleted or until the
//! process exits; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::generation::generator::Generator;
use crate::generation::PipelineError;
use crate::models::interview::{GenerationRequest, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Generating,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Generating)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationJob {
    #[serde(rename = "interview_id")]
    pub id: Uuid,
    pub status: JobStatus,
    pub interview: Option<Transcript>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub interview_id: Uuid,
    pub status: JobStatus,
    pub topic: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&GenerationJob> for JobSummary {
    fn from(job: &GenerationJob) -> Self {
        Self {
            interview_id: job.id,
            status: job.status,
            topic: job.interview.as_ref().map(|t| t.topic.clone()),
            completed_at: job.completed_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Interview {0} not found")]
    NotFound(Uuid),

    #[error("Interview {0} already exists")]
    AlreadyExists(Uuid),

    #[error("Interview {0} has already finished")]
    AlreadyTerminal(Uuid),
}

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, GenerationJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, id: Uuid) -> Result<GenerationJob, JobError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&id) {
            return Err(JobError::AlreadyExists(id));
        }
        let job = GenerationJob {
            id,
            status: JobStatus::Generating,
            interview: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        jobs.insert(id, job.clone());
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<GenerationJob, JobError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }

    pub async fn complete(
        &self,
        id: Uuid,
        transcript: Transcript,
        at: DateTime<Utc>,
    ) -> Result<(), JobError> {
        self.finish(id, JobStatus::Completed, Some(transcript), None, at)
            .await
    }

    pub async fn fail(&self, id: Uuid, message: String, at: DateTime<Utc>) -> Result<(), JobError> {
        self.finish(id, JobStatus::Failed, None, Some(message), at)
            .await
    }

    /// Replaces the whole record under the write lock so readers never see a partial update.
    async fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        interview: Option<Transcript>,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
        if job.status.is_terminal() {
            return Err(JobError::AlreadyTerminal(id));
        }
        *job = GenerationJob {
            id,
            status,
            interview,
            error_message,
            created_at: job.created_at,
            completed_at: Some(at),
        };
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), JobError> {
        self.jobs
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(JobError::NotFound(id))
    }

    /// Summaries in creation order.
    pub async fn list(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<&GenerationJob> = jobs.values().collect();
        all.sort_by_key(|j| (j.created_at, j.id));
        all.into_iter().map(JobSummary::from).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Background execution
// ────────────────────────────────────────────────────────────────────────────

/// Runs one generation and records its terminal state.
///
/// Every outcome ends in `complete` or `fail`, including a panic inside the
/// pipeline, which is caught at the inner task's `JoinHandle`.
pub async fn run_generation_job(
    generator: Generator,
    jobs: JobStore,
    id: Uuid,
    request: GenerationRequest,
) {
    let outcome = tokio::spawn(async move { generator.generate(&request).await }).await;

    let recorded = match outcome {
        Ok(Ok(transcript)) => {
            info!("Interview {id} completed");
            jobs.complete(id, transcript, Utc::now()).await
        }
        Ok(Err(e)) => {
            match &e {
                PipelineError::MalformedResponse(_) => {
                    warn!("Interview {id} failed on a malformed LLM response: {e}")
                }
                _ => error!("Interview {id} failed: {e}"),
            }
            jobs.fail(id, e.to_string(), Utc::now()).await
        }
        Err(join_error) => {
            error!("Interview {id} generation task aborted: {join_error}");
            jobs.fail(
                id,
                format!("Generation task aborted: {join_error}"),
                Utc::now(),
            )
            .await
        }
    };

    if let Err(e) = recorded {
        // Deleted while generating; the result has nowhere to go.
        warn!("Dropping result for interview {id}: {e}");
    }
}
