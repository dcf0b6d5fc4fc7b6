//! Response Interpreter: turns raw LLM text into the canonical schema.
//!
//! Two steps, always: parse the text as JSON, then validate against explicit
//! required/optional field lists. Nothing is partially accepted; the first
//! missing or mistyped field fails the whole response with `MalformedResponse`.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::generation::names::ParticipantNames;
use crate::generation::PipelineError;
use crate::llm_client::strip_json_fences;
use crate::models::interview::{
    title_case, Chapter, Exchange, GenerationRequest, Participant, Speaker, Transcript,
    INTERVIEWEE_KEY, INTERVIEWER_KEY,
};
use crate::models::parsed::{ParsedContent, TaskCandidate, TimelineNote};
use crate::models::task::TaskPriority;

pub const INTERVIEWER_ROLE: &str = "Senior Hiring Manager";

fn malformed(message: impl Into<String>) -> PipelineError {
    PipelineError::MalformedResponse(message.into())
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, PipelineError> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))
        .map_err(|e| malformed(format!("response is not valid JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(malformed(format!(
            "expected a JSON object at the top level, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_object<'a>(value: &'a Value, at: &str) -> Result<&'a Map<String, Value>, PipelineError> {
    value
        .as_object()
        .ok_or_else(|| malformed(format!("{at} must be an object, got {}", type_name(value))))
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<&'a Value, PipelineError> {
    match obj.get(key) {
        Some(Value::Null) | None => Err(malformed(format!("missing required field '{key}' in {at}"))),
        Some(v) => Ok(v),
    }
}

fn require_str(obj: &Map<String, Value>, key: &str, at: &str) -> Result<String, PipelineError> {
    let value = require(obj, key, at)?;
    value.as_str().map(str::to_string).ok_or_else(|| {
        malformed(format!(
            "field '{key}' in {at} must be a string, got {}",
            type_name(value)
        ))
    })
}

fn require_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<&'a Vec<Value>, PipelineError> {
    let value = require(obj, key, at)?;
    value.as_array().ok_or_else(|| {
        malformed(format!(
            "field '{key}' in {at} must be an array, got {}",
            type_name(value)
        ))
    })
}

fn optional_str(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<String>, PipelineError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(format!(
            "field '{key}' in {at} must be a string, got {}",
            type_name(other)
        ))),
    }
}

/// Accepts `5` and `5.0`; rejects negatives, fractions and out-of-range values.
fn as_whole_u32(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| u32::try_from(n).ok())
}

fn require_u32(obj: &Map<String, Value>, key: &str, at: &str) -> Result<u32, PipelineError> {
    let value = require(obj, key, at)?;
    as_whole_u32(value).ok_or_else(|| {
        malformed(format!(
            "field '{key}' in {at} must be a non-negative integer, got {value}"
        ))
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Transcript
// ────────────────────────────────────────────────────────────────────────────

/// Builds a `Transcript` from a generation response.
///
/// Chapter and exchange order is kept exactly as emitted. Participants and
/// metadata come from the request, the resolved names and `model`, never from
/// the model's output.
pub fn interpret_transcript(
    raw: &str,
    request: &GenerationRequest,
    names: &ParticipantNames,
    model: &str,
) -> Result<Transcript, PipelineError> {
    let root = parse_object(raw)?;
    let raw_chapters = require_array(&root, "chapters", "response")?;
    if raw_chapters.is_empty() {
        return Err(malformed("'chapters' must contain at least one chapter"));
    }

    let chapters = raw_chapters
        .iter()
        .enumerate()
        .map(|(i, value)| interpret_chapter(i, value))
        .collect::<Result<Vec<_>, _>>()?;

    let mut participants = BTreeMap::new();
    participants.insert(
        INTERVIEWER_KEY.to_string(),
        Participant {
            name: names.interviewer.clone(),
            role: INTERVIEWER_ROLE.to_string(),
            company: Some(format!("{} Company", title_case(request.company_type.as_str()))),
        },
    );
    participants.insert(
        INTERVIEWEE_KEY.to_string(),
        Participant {
            name: names.interviewee.clone(),
            role: format!(
                "{} {}",
                title_case(request.difficulty.as_str()),
                request.topic.as_str()
            ),
            company: None,
        },
    );

    let mut metadata = BTreeMap::new();
    metadata.insert("company_type".to_string(), json!(request.company_type.as_str()));
    metadata.insert("focus_areas".to_string(), json!(request.focus_areas));
    metadata.insert("generated_with".to_string(), json!(model));

    Ok(Transcript {
        topic: request.topic.as_str().to_string(),
        difficulty: request.difficulty.as_str().to_string(),
        total_duration_minutes: request.duration_minutes,
        participants,
        chapters,
        metadata,
    })
}

fn interpret_chapter(index: usize, value: &Value) -> Result<Chapter, PipelineError> {
    let at = format!("chapter {index}");
    let obj = as_object(value, &at)?;

    let title = require_str(obj, "title", &at)?;
    let duration_minutes = require_u32(obj, "duration_minutes", &at)?;
    let description = optional_str(obj, "description", &at)?.unwrap_or_default();
    let exchanges = require_array(obj, "exchanges", &at)?
        .iter()
        .enumerate()
        .map(|(j, v)| interpret_exchange(index, j, v))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Chapter {
        title,
        duration_minutes,
        description,
        exchanges,
    })
}

fn interpret_exchange(chapter: usize, index: usize, value: &Value) -> Result<Exchange, PipelineError> {
    let at = format!("chapter {chapter}, exchange {index}");
    let obj = as_object(value, &at)?;

    let raw_speaker = require_str(obj, "speaker", &at)?;
    let speaker = Speaker::parse(&raw_speaker).ok_or_else(|| {
        malformed(format!(
            "unknown speaker '{raw_speaker}' in {at} (expected interviewer or interviewee)"
        ))
    })?;
    let text = require_str(obj, "text", &at)?;
    if text.trim().is_empty() {
        return Err(malformed(format!("empty 'text' in {at}")));
    }
    let timestamp = require_str(obj, "timestamp", &at)?;

    Ok(Exchange {
        speaker,
        text,
        timestamp,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Parsed content
// ────────────────────────────────────────────────────────────────────────────

/// Builds `ParsedContent` from a parsing response.
///
/// `intro_summary`, `highlights`, `lowlights` and `key_entities` are required.
/// `executable_tasks` feeds a secondary side effect and degrades to an empty list
/// when absent.
pub fn interpret_parsed_content(raw: &str) -> Result<ParsedContent, PipelineError> {
    let root = parse_object(raw)?;

    let intro_summary = require_str(&root, "intro_summary", "response")?;
    let highlights = interpret_notes(require_array(&root, "highlights", "response")?, "highlight")?;
    let lowlights = interpret_notes(require_array(&root, "lowlights", "response")?, "lowlight")?;
    let key_entities = interpret_entities(require(&root, "key_entities", "response")?)?;

    let executable_tasks = match root.get("executable_tasks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| interpret_task(i, v))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(malformed(format!(
                "field 'executable_tasks' in response must be an array, got {}",
                type_name(other)
            )))
        }
    };

    Ok(ParsedContent {
        intro_summary,
        highlights,
        lowlights,
        key_entities,
        executable_tasks,
    })
}

fn interpret_notes(items: &[Value], kind: &str) -> Result<Vec<TimelineNote>, PipelineError> {
    items
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let at = format!("{kind} {i}");
            let obj = as_object(value, &at)?;
            let timestamp = match obj.get("timestamp") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(other) => {
                    return Err(malformed(format!(
                        "field 'timestamp' in {at} must be a string, got {}",
                        type_name(other)
                    )))
                }
            };
            Ok(TimelineNote {
                timestamp,
                description: require_str(obj, "description", &at)?,
            })
        })
        .collect()
}

fn interpret_entities(value: &Value) -> Result<BTreeMap<String, Vec<String>>, PipelineError> {
    let obj = as_object(value, "key_entities")?;
    let mut entities = BTreeMap::new();
    for (category, names) in obj {
        let at = format!("key_entities.{category}");
        let list = names.as_array().ok_or_else(|| {
            malformed(format!("{at} must be an array, got {}", type_name(names)))
        })?;
        let names = list
            .iter()
            .map(|n| {
                n.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| malformed(format!("{at} must only contain strings")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        entities.insert(category.clone(), names);
    }
    Ok(entities)
}

fn interpret_task(index: usize, value: &Value) -> Result<TaskCandidate, PipelineError> {
    let at = format!("executable_tasks {index}");
    let obj = as_object(value, &at)?;

    let title = require_str(obj, "title", &at)?;
    if title.trim().is_empty() {
        return Err(malformed(format!("empty 'title' in {at}")));
    }

    let priority = match optional_str(obj, "priority", &at)? {
        None => TaskPriority::default(),
        Some(raw) => TaskPriority::parse(&raw)
            .ok_or_else(|| malformed(format!("unknown priority '{raw}' in {at}")))?,
    };

    let estimated_due_days = match obj.get("estimated_due_days") {
        None | Some(Value::Null) => None,
        Some(v) => Some(as_whole_u32(v).ok_or_else(|| {
            malformed(format!(
                "field 'estimated_due_days' in {at} must be a non-negative integer, got {v}"
            ))
        })?),
    };

    Ok(TaskCandidate {
        title,
        description: optional_str(obj, "description", &at)?,
        priority,
        category: optional_str(obj, "category", &at)?,
        estimated_due_days,
    })
}
