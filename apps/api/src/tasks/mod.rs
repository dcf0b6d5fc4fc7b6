// Task CRUD over the record store, scoped to the owning user.

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::task::{Task, TaskCreate, TaskStatus, TaskUpdate};
use crate::store::{encode, Filters, RecordStore, Table};

pub mod handlers;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Task {id} not found"))
}

/// Newest first, optionally narrowed to one interview and/or status.
pub async fn list_tasks(
    records: &dyn RecordStore,
    owner_id: Uuid,
    interview_id: Option<Uuid>,
    status: Option<TaskStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Task>, AppError> {
    let filters = Filters::new()
        .eq_opt("interview_id", interview_id.map(|id| id.to_string()))
        .eq_opt("status", status.map(|s| s.as_str()));
    records
        .select_many(Table::Tasks, owner_id, &filters, skip, limit)
        .await?
        .into_iter()
        .map(|r| r.decode().map_err(AppError::from))
        .collect()
}

pub async fn get_task(records: &dyn RecordStore, owner_id: Uuid, id: Uuid) -> Result<Task, AppError> {
    records
        .select_by_id(Table::Tasks, id, owner_id)
        .await?
        .ok_or_else(|| not_found(id))?
        .decode()
        .map_err(AppError::from)
}

pub async fn create_task(
    records: &dyn RecordStore,
    owner_id: Uuid,
    interview_id: Uuid,
    create: TaskCreate,
) -> Result<Task, AppError> {
    if create.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    let fields = create.into_fields(interview_id);
    let record = records
        .insert(Table::Tasks, owner_id, encode(Table::Tasks, &fields)?)
        .await?;
    info!("Created task {} for interview {interview_id}", record.id);
    Ok(record.decode()?)
}

/// Applies only the fields present in `update`. An empty update returns the task unchanged.
pub async fn update_task(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
    update: TaskUpdate,
) -> Result<Task, AppError> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if update.is_empty() {
        return get_task(records, owner_id, id).await;
    }
    records
        .update(Table::Tasks, id, owner_id, update.to_patch())
        .await?
        .ok_or_else(|| not_found(id))?
        .decode()
        .map_err(AppError::from)
}

pub async fn delete_task(records: &dyn RecordStore, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if !records.delete(Table::Tasks, id, owner_id).await? {
        return Err(not_found(id));
    }
    info!("Deleted task {id}");
    Ok(())
}
