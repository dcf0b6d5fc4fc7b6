use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::parsed::{ParsedContent, TimelineNote};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Columns stored in an uploaded interview's `data` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewFields {
    pub title: String,
    pub youtube_url: Option<String>,
    pub raw_transcript: Value,
    #[serde(default)]
    pub status: InterviewStatus,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: InterviewFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewSummary {
    pub id: Uuid,
    pub title: String,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<InterviewRecord> for InterviewSummary {
    fn from(record: InterviewRecord) -> Self {
        Self {
            id: record.id,
            title: record.fields.title,
            status: record.fields.status,
            created_at: record.created_at,
            processed_at: record.fields.processed_at,
        }
    }
}

/// Stored parsed content for one interview. Tasks live in their own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedContentFields {
    pub interview_id: Uuid,
    pub intro_summary: String,
    pub highlights: Vec<TimelineNote>,
    pub lowlights: Vec<TimelineNote>,
    pub key_entities: BTreeMap<String, Vec<String>>,
}

impl ParsedContentFields {
    pub fn from_parsed(interview_id: Uuid, parsed: &ParsedContent) -> Self {
        Self {
            interview_id,
            intro_summary: parsed.intro_summary.clone(),
            highlights: parsed.highlights.clone(),
            lowlights: parsed.lowlights.clone(),
            key_entities: parsed.key_entities.clone(),
        }
    }
}

/// An interview flattened together with its parsed content, if any.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewDetail {
    #[serde(flatten)]
    pub interview: InterviewRecord,
    pub intro_summary: Option<String>,
    pub highlights: Option<Vec<TimelineNote>>,
    pub lowlights: Option<Vec<TimelineNote>>,
    pub key_entities: Option<BTreeMap<String, Vec<String>>>,
}

impl InterviewDetail {
    pub fn new(interview: InterviewRecord, parsed: Option<ParsedContentFields>) -> Self {
        match parsed {
            Some(p) => Self {
                interview,
                intro_summary: Some(p.intro_summary),
                highlights: Some(p.highlights),
                lowlights: Some(p.lowlights),
                key_entities: Some(p.key_entities),
            },
            None => Self {
                interview,
                intro_summary: None,
                highlights: None,
                lowlights: None,
                key_entities: None,
            },
        }
    }
}
