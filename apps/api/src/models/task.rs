use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// Columns stored in the record's `data` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub interview_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: TaskFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreate {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl TaskCreate {
    pub fn into_fields(self, interview_id: Uuid) -> TaskFields {
        TaskFields {
            interview_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            due_date: self.due_date,
            status: TaskStatus::Pending,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn to_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        let mut set = |key: &str, value: Option<Value>| {
            if let Some(v) = value {
                patch.insert(key.to_string(), v);
            }
        };
        set("title", self.title.clone().map(Value::String));
        set("description", self.description.clone().map(Value::String));
        set("priority", self.priority.and_then(|p| serde_json::to_value(p).ok()));
        set("category", self.category.clone().map(Value::String));
        set(
            "due_date",
            self.due_date.map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        );
        set(
            "status",
            self.status.map(|s| Value::String(s.as_str().to_string())),
        );
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_parse_accepts_any_case() {
        assert_eq!(TaskPriority::parse("HIGH"), Some(TaskPriority::High));
        assert_eq!(TaskPriority::parse(" low"), Some(TaskPriority::Low));
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_status_wire_name() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }

    #[test]
    fn test_update_patch_only_contains_set_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        let patch = update.to_patch();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch["status"], json!("completed"));
        assert_eq!(patch["due_date"], json!("2025-03-01"));
        assert!(!update.is_empty());
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn test_task_flattens_fields() {
        let id = Uuid::new_v4();
        let value = json!({
            "id": id,
            "user_id": Uuid::new_v4(),
            "interview_id": Uuid::new_v4(),
            "title": "Review system design notes",
            "description": null,
            "priority": "high",
            "category": "study",
            "due_date": "2025-01-10",
            "status": "pending",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        });
        let task: Task = serde_json::from_value(value).unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.fields.priority, TaskPriority::High);
        assert_eq!(task.fields.due_date, NaiveDate::from_ymd_opt(2025, 1, 10));
    }
}
