//! Record Store: owner-scoped persistence for uploaded interviews, their parsed
//! content and tasks.
//!
//! Every table has the same shape: identity, owning user, a JSON `data`
//! document and timestamps. Typed models are (de)serialized at the edges with
//! `encode` / `Record::decode`. Every operation takes the owning user id; there is
//! no unscoped access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Interviews,
    ParsedContent,
    Tasks,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interviews => "interviews",
            Self::ParsedContent => "parsed_content",
            Self::Tasks => "tasks",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record in {table}: {message}")]
    Corrupt {
        table: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub user_id: Uuid,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Deserializes identity, timestamps and the data document as one flat object.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let mut flat = self.data;
        flat.insert("id".to_string(), Value::String(self.id.to_string()));
        flat.insert("user_id".to_string(), Value::String(self.user_id.to_string()));
        flat.insert("created_at".to_string(), serde_json::to_value(self.created_at)?);
        flat.insert("updated_at".to_string(), serde_json::to_value(self.updated_at)?);
        Ok(serde_json::from_value(Value::Object(flat))?)
    }
}

/// Serializes a typed row into a `data` document.
pub fn encode<T: Serialize>(table: Table, fields: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corrupt {
            table: table.name(),
            message: format!("expected an object, got {other}"),
        }),
    }
}

/// Equality filters on top-level `data` fields, ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<(String, Value)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.push((field.to_string(), value.into()));
        self
    }

    /// Adds the filter only when `value` is present.
    pub fn eq_opt(self, field: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.0.iter()
    }

    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        self.0
            .iter()
            .all(|(field, value)| data.get(field) == Some(value))
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(
        &self,
        table: Table,
        owner_id: Uuid,
        data: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn select_by_id(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Record>, StoreError>;

    /// Newest first.
    async fn select_many(
        &self,
        table: Table,
        owner_id: Uuid,
        filters: &Filters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Record>, StoreError>;

    /// Shallow-merges `patch` into the record's data and bumps `updated_at`.
    async fn update(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError>;

    /// Like `update`, but only when the data field `guard.0` is not equal to `guard.1`.
    /// Check and write happen atomically. `None` when the record is missing or guarded.
    async fn update_unless(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        guard: (&str, Value),
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError>;

    async fn delete(&self, table: Table, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: Uuid,
        user_id: Uuid,
        title: String,
        created_at: DateTime<Utc>,
    }

    #[test]
    fn test_decode_flattens_identity_into_data() {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            data: encode(Table::Tasks, &json!({"title": "x"})).unwrap(),
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        let row: Row = record.decode().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.title, "x");
        assert_eq!(row.created_at, now);
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(encode(Table::Tasks, &vec![1, 2]).is_err());
    }

    #[test]
    fn test_filters_match_all_fields() {
        let data = encode(Table::Tasks, &json!({"status": "pending", "interview_id": "a"})).unwrap();
        assert!(Filters::new().matches(&data));
        assert!(Filters::new().eq("status", "pending").matches(&data));
        assert!(!Filters::new()
            .eq("status", "pending")
            .eq("interview_id", "b")
            .matches(&data));
        assert!(Filters::new()
            .eq_opt("status", None::<String>)
            .matches(&data));
    }
}
