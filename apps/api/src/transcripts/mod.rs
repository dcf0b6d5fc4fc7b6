// Uploaded transcripts: storage, detail assembly and background parsing.
// Every operation is scoped to the owning user; records of other users read as missing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::Generator;
use crate::models::upload::{
    InterviewDetail, InterviewFields, InterviewRecord, InterviewStatus, InterviewSummary,
    ParsedContentFields,
};
use crate::store::{encode, Filters, RecordStore, Table};

pub mod handlers;

/// Page size used for child lookups where every row is wanted.
const ALL_ROWS: i64 = i64::MAX;

pub async fn create_interview(
    records: &dyn RecordStore,
    owner_id: Uuid,
    fields: InterviewFields,
) -> Result<InterviewRecord, AppError> {
    let record = records
        .insert(Table::Interviews, owner_id, encode(Table::Interviews, &fields)?)
        .await?;
    info!("Stored uploaded transcript {} for user {owner_id}", record.id);
    Ok(record.decode()?)
}

/// Newest first.
pub async fn list_interviews(
    records: &dyn RecordStore,
    owner_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<InterviewSummary>, AppError> {
    let rows = records
        .select_many(Table::Interviews, owner_id, &Filters::new(), skip, limit)
        .await?;
    rows.into_iter()
        .map(|r| {
            r.decode::<InterviewRecord>()
                .map(InterviewSummary::from)
                .map_err(AppError::from)
        })
        .collect()
}

pub async fn get_interview(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
) -> Result<InterviewRecord, AppError> {
    records
        .select_by_id(Table::Interviews, id, owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?
        .decode()
        .map_err(AppError::from)
}

pub async fn get_interview_detail(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
) -> Result<InterviewDetail, AppError> {
    let interview = get_interview(records, owner_id, id).await?;
    let parsed = records
        .select_many(
            Table::ParsedContent,
            owner_id,
            &Filters::new().eq("interview_id", id.to_string()),
            0,
            1,
        )
        .await?
        .into_iter()
        .next()
        .map(|r| r.decode::<ParsedContentFields>())
        .transpose()?;
    Ok(InterviewDetail::new(interview, parsed))
}

/// Deletes the interview together with its parsed content and tasks.
pub async fn delete_interview(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    // Existence check first so a missing interview leaves children untouched.
    get_interview(records, owner_id, id).await?;

    let removed_parsed = delete_children(records, Table::ParsedContent, owner_id, id).await?;
    let removed_tasks = delete_children(records, Table::Tasks, owner_id, id).await?;
    records.delete(Table::Interviews, id, owner_id).await?;

    info!(
        "Deleted interview {id} ({removed_parsed} parsed content rows, {removed_tasks} tasks)"
    );
    Ok(())
}

async fn delete_children(
    records: &dyn RecordStore,
    table: Table,
    owner_id: Uuid,
    interview_id: Uuid,
) -> Result<usize, AppError> {
    let children = records
        .select_many(
            table,
            owner_id,
            &Filters::new().eq("interview_id", interview_id.to_string()),
            0,
            ALL_ROWS,
        )
        .await?;
    let mut removed = 0;
    for child in children {
        if records.delete(table, child.id, owner_id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

// ────────────────────────────────────────────────────────────────────────────
// Processing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusPatch<'a> {
    status: InterviewStatus,
    processed_at: Option<DateTime<Utc>>,
    error_message: Option<&'a str>,
}

async fn set_status(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
    patch: StatusPatch<'_>,
) -> Result<InterviewRecord, AppError> {
    records
        .update(
            Table::Interviews,
            id,
            owner_id,
            encode(Table::Interviews, &patch)?,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?
        .decode()
        .map_err(AppError::from)
}

/// Moves an interview to `processing`, clearing the previous outcome.
/// A run already in flight is a conflict; the check and the write are one store call.
pub async fn begin_processing(
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
) -> Result<InterviewRecord, AppError> {
    get_interview(records, owner_id, id).await?;
    let patch = StatusPatch {
        status: InterviewStatus::Processing,
        processed_at: None,
        error_message: None,
    };
    records
        .update_unless(
            Table::Interviews,
            id,
            owner_id,
            ("status", Value::from(InterviewStatus::Processing.as_str())),
            encode(Table::Interviews, &patch)?,
        )
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Interview {id} is already being processed")))?
        .decode()
        .map_err(AppError::from)
}

/// Background body of `POST /{id}/process`. Always leaves the interview in
/// `completed` or `failed`, unless it was deleted in the meantime.
pub async fn process_interview(
    generator: Generator,
    records: Arc<dyn RecordStore>,
    owner_id: Uuid,
    id: Uuid,
) {
    let outcome = parse_and_store(&generator, records.as_ref(), owner_id, id).await;
    let message = outcome.as_ref().err().map(ToString::to_string);

    let patch = match outcome {
        Ok(task_count) => {
            info!("Interview {id} processed, {task_count} tasks created");
            StatusPatch {
                status: InterviewStatus::Completed,
                processed_at: Some(Utc::now()),
                error_message: None,
            }
        }
        Err(e) => {
            match &e {
                AppError::MalformedResponse(_) => {
                    warn!("Processing interview {id} failed on a malformed LLM response: {e}")
                }
                _ => error!("Processing interview {id} failed: {e}"),
            }
            StatusPatch {
                status: InterviewStatus::Failed,
                processed_at: None,
                error_message: message.as_deref(),
            }
        }
    };

    if let Err(e) = set_status(records.as_ref(), owner_id, id, patch).await {
        warn!("Could not record processing outcome for interview {id}: {e}");
    }
}

async fn parse_and_store(
    generator: &Generator,
    records: &dyn RecordStore,
    owner_id: Uuid,
    id: Uuid,
) -> Result<usize, AppError> {
    let interview = get_interview(records, owner_id, id).await?;
    let text = flatten_raw_transcript(&interview.fields.raw_transcript)?;
    let parsed = generator.parse_transcript(&text).await?;

    delete_children(records, Table::ParsedContent, owner_id, id).await?;
    let content = ParsedContentFields::from_parsed(id, &parsed);
    records
        .insert(
            Table::ParsedContent,
            owner_id,
            encode(Table::ParsedContent, &content)?,
        )
        .await?;

    let today = Utc::now().date_naive();
    let task_count = parsed.executable_tasks.len();
    for candidate in parsed.executable_tasks {
        let fields = candidate.into_fields(id, today);
        records
            .insert(Table::Tasks, owner_id, encode(Table::Tasks, &fields)?)
            .await?;
    }
    Ok(task_count)
}

/// Renders an uploaded transcript document as plain text for parsing.
///
/// Accepts a bare string, or a list of segments where each segment is a string
/// or an object with `text` and an optional `start` offset in seconds. Segments
/// with a start offset are prefixed `[MM:SS]`.
pub fn flatten_raw_transcript(raw: &Value) -> Result<String, AppError> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Array(segments) => segments
            .iter()
            .filter_map(render_segment)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => render_segment(raw).unwrap_or_default(),
        _ => String::new(),
    };
    if text.is_empty() {
        return Err(AppError::Validation(
            "Uploaded transcript contains no text".to_string(),
        ));
    }
    Ok(text)
}

fn render_segment(segment: &Value) -> Option<String> {
    let (text, start) = match segment {
        Value::String(s) => (s.trim(), None),
        Value::Object(obj) => (
            obj.get("text").and_then(Value::as_str)?.trim(),
            obj.get("start").and_then(Value::as_f64),
        ),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(match start {
        Some(seconds) if seconds >= 0.0 => {
            let whole = seconds as u64;
            format!("[{:02}:{:02}] {text}", whole / 60, whole % 60)
        }
        _ => text.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedLlm;
    use crate::models::task::{Task, TaskStatus};
    use crate::store::MemoryRecordStore;

    pub(crate) const PARSED_REPLY: &str = r#"{
        "intro_summary": "A backend engineer walks through an outage postmortem.",
        "highlights": [{"timestamp": "00:05", "description": "Clear incident timeline"}],
        "lowlights": [{"timestamp": null, "description": "No load testing"}],
        "key_entities": {"technologies": ["Postgres", "Kafka"]},
        "executable_tasks": [
            {"title": "Add load tests", "priority": "high", "estimated_due_days": 7},
            {"title": "Write a runbook", "category": "ops"}
        ]
    }"#;

    fn upload(raw: Value) -> InterviewFields {
        InterviewFields {
            title: "Postmortem talk".to_string(),
            youtube_url: None,
            raw_transcript: raw,
            status: InterviewStatus::Pending,
            processed_at: None,
            error_message: None,
        }
    }

    fn segments() -> Value {
        json!([
            {"text": "Welcome everyone to this walkthrough of our outage.", "start": 5.2},
            {"text": "We lost the primary database for twenty minutes.", "start": 65.0},
            {"text": "  "},
            "Questions at the end."
        ])
    }

    #[test]
    fn test_flatten_segments_with_offsets() {
        let text = flatten_raw_transcript(&segments()).unwrap();
        assert_eq!(
            text,
            "[00:05] Welcome everyone to this walkthrough of our outage.\n\
             [01:05] We lost the primary database for twenty minutes.\n\
             Questions at the end."
        );
    }

    #[test]
    fn test_flatten_rejects_documents_without_text() {
        assert!(matches!(
            flatten_raw_transcript(&json!([])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            flatten_raw_transcript(&json!(42)),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            flatten_raw_transcript(&json!("  plain text  ")).unwrap(),
            "plain text"
        );
    }

    #[tokio::test]
    async fn test_process_stores_content_and_tasks() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let llm = Arc::new(ScriptedLlm::replying(PARSED_REPLY));
        let owner = Uuid::new_v4();
        let interview = create_interview(records.as_ref(), owner, upload(segments()))
            .await
            .unwrap();

        begin_processing(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        process_interview(
            Generator::new(llm.clone()),
            records.clone(),
            owner,
            interview.id,
        )
        .await;

        let detail = get_interview_detail(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(detail.interview.fields.status, InterviewStatus::Completed);
        assert!(detail.interview.fields.processed_at.is_some());
        assert_eq!(detail.key_entities.unwrap()["technologies"].len(), 2);
        assert_eq!(detail.highlights.unwrap().len(), 1);

        let tasks = records
            .select_many(Table::Tasks, owner, &Filters::new(), 0, 10)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        let runbook: Task = tasks[0].clone().decode().unwrap();
        assert_eq!(runbook.fields.title, "Write a runbook");
        assert_eq!(runbook.fields.category.as_deref(), Some("ops"));
        assert_eq!(runbook.fields.status, TaskStatus::Pending);
        assert!(runbook.fields.due_date.is_none());

        let (_, user_prompt) = llm.last_prompts().unwrap();
        assert!(user_prompt.contains("[01:05] We lost the primary database"));
    }

    #[tokio::test]
    async fn test_process_failure_records_error() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let llm = Arc::new(ScriptedLlm::replying("I could not analyze this."));
        let owner = Uuid::new_v4();
        let interview = create_interview(records.as_ref(), owner, upload(segments()))
            .await
            .unwrap();

        process_interview(Generator::new(llm), records.clone(), owner, interview.id).await;

        let stored = get_interview(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(stored.fields.status, InterviewStatus::Failed);
        assert!(stored.fields.processed_at.is_none());
        assert!(stored
            .fields
            .error_message
            .unwrap()
            .starts_with("Malformed LLM response"));
    }

    #[tokio::test]
    async fn test_short_transcript_fails_without_llm_call() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let llm = Arc::new(ScriptedLlm::replying(PARSED_REPLY));
        let owner = Uuid::new_v4();
        let interview = create_interview(records.as_ref(), owner, upload(json!("too short")))
            .await
            .unwrap();

        process_interview(
            Generator::new(llm.clone()),
            records.clone(),
            owner,
            interview.id,
        )
        .await;

        let stored = get_interview(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(stored.fields.status, InterviewStatus::Failed);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_begin_processing_twice_conflicts() {
        let records = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let interview = create_interview(&records, owner, upload(segments()))
            .await
            .unwrap();

        begin_processing(&records, owner, interview.id).await.unwrap();
        assert!(matches!(
            begin_processing(&records, owner, interview.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_reprocess_clears_previous_outcome() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let generator = Generator::new(Arc::new(ScriptedLlm::new(vec![
            Ok(PARSED_REPLY.to_string()),
            Ok("not json at all".to_string()),
        ])));
        let owner = Uuid::new_v4();
        let interview = create_interview(records.as_ref(), owner, upload(segments()))
            .await
            .unwrap();

        begin_processing(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        process_interview(generator.clone(), records.clone(), owner, interview.id).await;
        let first = get_interview(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(first.fields.status, InterviewStatus::Completed);
        assert!(first.fields.processed_at.is_some());

        let restarted = begin_processing(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(restarted.fields.status, InterviewStatus::Processing);
        assert!(restarted.fields.processed_at.is_none());

        process_interview(generator, records.clone(), owner, interview.id).await;
        let second = get_interview(records.as_ref(), owner, interview.id)
            .await
            .unwrap();
        assert_eq!(second.fields.status, InterviewStatus::Failed);
        assert!(second.fields.processed_at.is_none());
        assert!(second.fields.error_message.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_begin_processing_admits_one() {
        let records = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let interview = create_interview(&records, owner, upload(segments()))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            begin_processing(&records, owner, interview.id),
            begin_processing(&records, owner, interview.id)
        );
        let conflicts = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert!(a.is_ok() || b.is_ok());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let owner = Uuid::new_v4();
        let interview = create_interview(records.as_ref(), owner, upload(segments()))
            .await
            .unwrap();
        process_interview(
            Generator::new(Arc::new(ScriptedLlm::replying(PARSED_REPLY))),
            records.clone(),
            owner,
            interview.id,
        )
        .await;

        delete_interview(records.as_ref(), owner, interview.id)
            .await
            .unwrap();

        for table in [Table::Interviews, Table::ParsedContent, Table::Tasks] {
            let rows = records
                .select_many(table, owner, &Filters::new(), 0, 10)
                .await
                .unwrap();
            assert!(rows.is_empty(), "{} not empty", table.name());
        }
        assert!(matches!(
            delete_interview(records.as_ref(), owner, interview.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_interview() {
        let records = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let interview = create_interview(&records, owner, upload(segments()))
            .await
            .unwrap();

        assert!(matches!(
            get_interview_detail(&records, Uuid::new_v4(), interview.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(
            list_interviews(&records, owner, 0, 100).await.unwrap().len(),
            1
        );
    }
}
