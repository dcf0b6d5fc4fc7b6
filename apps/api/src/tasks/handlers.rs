//! Axum route handlers for tasks.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::task::{Task, TaskCreate, TaskStatus, TaskUpdate};
use crate::routes::{check_page, UserIdQuery, DEFAULT_PAGE_LIMIT};
use crate::state::AppState;
use crate::tasks;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub user_id: Uuid,
    pub interview_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TaskCreateQuery {
    pub user_id: Uuid,
    pub interview_id: Uuid,
}

/// GET /api/v1/tasks
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    check_page(params.skip, limit)?;
    let tasks = tasks::list_tasks(
        state.records.as_ref(),
        params.user_id,
        params.interview_id,
        params.status,
        params.skip,
        limit,
    )
    .await?;
    Ok(Json(tasks))
}

/// GET /api/v1/tasks/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(
        tasks::get_task(state.records.as_ref(), params.user_id, id).await?,
    ))
}

/// POST /api/v1/tasks?interview_id=…
pub async fn handle_create(
    State(state): State<AppState>,
    Query(params): Query<TaskCreateQuery>,
    Json(body): Json<TaskCreate>,
) -> Result<Json<Task>, AppError> {
    let task = tasks::create_task(
        state.records.as_ref(),
        params.user_id,
        params.interview_id,
        body,
    )
    .await?;
    Ok(Json(task))
}

/// PUT /api/v1/tasks/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(body): Json<TaskUpdate>,
) -> Result<Json<Task>, AppError> {
    let task = tasks::update_task(state.records.as_ref(), params.user_id, id, body).await?;
    Ok(Json(task))
}

/// DELETE /api/v1/tasks/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    tasks::delete_task(state.records.as_ref(), params.user_id, id).await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}
