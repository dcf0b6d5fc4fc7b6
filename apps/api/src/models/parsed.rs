use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::{TaskFields, TaskPriority, TaskStatus};

/// Category applied to extracted tasks that arrive without one.
pub const DEFAULT_TASK_CATEGORY: &str = "general";

/// A highlight or lowlight. Plain-text transcripts carry no timestamps, so it is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNote {
    pub timestamp: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCandidate {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub estimated_due_days: Option<u32>,
}

impl TaskCandidate {
    pub fn into_fields(self, interview_id: Uuid, today: NaiveDate) -> TaskFields {
        TaskFields {
            interview_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: Some(
                self.category
                    .unwrap_or_else(|| DEFAULT_TASK_CATEGORY.to_string()),
            ),
            due_date: self
                .estimated_due_days
                .and_then(|days| today.checked_add_signed(Duration::days(i64::from(days)))),
            status: TaskStatus::Pending,
        }
    }
}

/// Structured extraction from a real transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedContent {
    pub intro_summary: String,
    pub highlights: Vec<TimelineNote>,
    pub lowlights: Vec<TimelineNote>,
    pub key_entities: BTreeMap<String, Vec<String>>,
    pub executable_tasks: Vec<TaskCandidate>,
}
