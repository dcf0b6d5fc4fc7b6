//! Axum route handlers for uploaded transcripts.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upload::{
    InterviewDetail, InterviewFields, InterviewRecord, InterviewStatus, InterviewSummary,
};
use crate::routes::{check_page, PageQuery, UserIdQuery};
use crate::state::AppState;
use crate::transcripts;

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

/// POST /api/v1/transcripts/upload
///
/// Multipart fields: `file` (required, `.json`), `title`, `youtube_url`.
/// The title falls back to the uploaded file name.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<Json<InterviewRecord>, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut title: Option<String> = None;
    let mut youtube_url: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            Some("title") => title = Some(field.text().await.map_err(multipart_error)?),
            Some("youtube_url") => {
                youtube_url = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if !filename.ends_with(".json") {
        return Err(AppError::Validation("File must be a JSON file".to_string()));
    }
    let raw_transcript: Value = serde_json::from_slice(&data)
        .map_err(|_| AppError::Validation("Invalid JSON file".to_string()))?;

    let fields = InterviewFields {
        title: title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(filename),
        youtube_url: youtube_url.filter(|u| !u.trim().is_empty()),
        raw_transcript,
        status: InterviewStatus::Pending,
        processed_at: None,
        error_message: None,
    };
    let record =
        transcripts::create_interview(state.records.as_ref(), params.user_id, fields).await?;
    Ok(Json(record))
}

/// GET /api/v1/transcripts
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<InterviewSummary>>, AppError> {
    check_page(params.skip, params.limit)?;
    let interviews = transcripts::list_interviews(
        state.records.as_ref(),
        params.user_id,
        params.skip,
        params.limit,
    )
    .await?;
    Ok(Json(interviews))
}

/// GET /api/v1/transcripts/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InterviewDetail>, AppError> {
    let detail =
        transcripts::get_interview_detail(state.records.as_ref(), params.user_id, id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/transcripts/:id/process
///
/// Marks the interview `processing` and parses it in the background.
pub async fn handle_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    transcripts::begin_processing(state.records.as_ref(), params.user_id, id).await?;
    info!("Interview {id} scheduled for processing");

    tokio::spawn(transcripts::process_interview(
        state.generator.clone(),
        state.records.clone(),
        params.user_id,
        id,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Processing started",
            "interview_id": id,
            "status": "processing"
        })),
    ))
}

/// DELETE /api/v1/transcripts/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    transcripts::delete_interview(state.records.as_ref(), params.user_id, id).await?;
    Ok(Json(json!({ "message": "Interview deleted successfully" })))
}
