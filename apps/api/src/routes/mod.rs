pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::handlers as jobs;
use crate::state::AppState;
use crate::tasks::handlers as tasks;
use crate::transcripts::handlers as transcripts;

pub const DEFAULT_PAGE_LIMIT: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Shared query parameters
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Rejects negative paging values, which Postgres refuses in OFFSET/LIMIT.
pub fn check_page(skip: i64, limit: i64) -> Result<(), AppError> {
    if skip < 0 || limit < 0 {
        return Err(AppError::Validation(format!(
            "skip and limit must be non-negative, got skip={skip} limit={limit}"
        )));
    }
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Generated interviews
        .route(
            "/api/v1/generate-interview",
            post(jobs::handle_generate_interview),
        )
        .route("/api/v1/interviews", get(jobs::handle_list_interviews))
        .route(
            "/api/v1/interviews/:id",
            get(jobs::handle_get_interview).delete(jobs::handle_delete_interview),
        )
        // Uploaded transcripts
        .route("/api/v1/transcripts", get(transcripts::handle_list))
        .route("/api/v1/transcripts/upload", post(transcripts::handle_upload))
        .route(
            "/api/v1/transcripts/:id",
            get(transcripts::handle_get).delete(transcripts::handle_delete),
        )
        .route(
            "/api/v1/transcripts/:id/process",
            post(transcripts::handle_process),
        )
        // Tasks
        .route(
            "/api/v1/tasks",
            get(tasks::handle_list).post(tasks::handle_create),
        )
        .route(
            "/api/v1/tasks/:id",
            get(tasks::handle_get)
                .put(tasks::handle_update)
                .delete(tasks::handle_delete),
        )
        .with_state(state)
}
