//! Axum route handlers for the generation job API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::jobs::{run_generation_job, GenerationJob, JobSummary};
use crate::models::interview::GenerationRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub interviews: Vec<JobSummary>,
}

/// POST /api/v1/generate-interview
///
/// Validates the request, registers a `generating` job and schedules the
/// pipeline in the background. Returns immediately with the job record.
pub async fn handle_generate_interview(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationJob>, AppError> {
    request.validate()?;

    let id = Uuid::new_v4();
    let job = state.jobs.create(id).await?;
    info!(
        "Interview {id} queued: {} / {} / {} min",
        request.topic, request.difficulty, request.duration_minutes
    );

    tokio::spawn(run_generation_job(
        state.generator.clone(),
        state.jobs.clone(),
        id,
        request,
    ));

    Ok(Json(job))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationJob>, AppError> {
    Ok(Json(state.jobs.get(id).await?))
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        interviews: state.jobs.list().await,
    })
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.jobs.delete(id).await?;
    info!("Interview {id} deleted");
    Ok(Json(json!({ "message": "Interview deleted successfully" })))
}
