use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Interview Transcript API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/health"
    }))
}

/// GET /health
/// Reports liveness and the LLM model generation runs against.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model": state.config.openai_model
    }))
}
