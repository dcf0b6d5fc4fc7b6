use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{Filters, Record, RecordStore, StoreError, Table};

/// In-process record store. Used by tests and when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct MemoryRecordStore {
    // Insertion order per table; newest last.
    tables: RwLock<HashMap<Table, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_mut(
    tables: &mut HashMap<Table, Vec<Record>>,
    table: Table,
    id: Uuid,
    owner_id: Uuid,
) -> Option<&mut Record> {
    tables
        .get_mut(&table)
        .and_then(|rows| rows.iter_mut().find(|r| r.id == id && r.user_id == owner_id))
}

fn apply(record: &mut Record, patch: Map<String, Value>) -> Record {
    record.data.extend(patch);
    record.updated_at = Utc::now();
    record.clone()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(
        &self,
        table: Table,
        owner_id: Uuid,
        data: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            user_id: owner_id,
            data,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn select_by_id(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Record>, StoreError> {
        Ok(self.tables.read().await.get(&table).and_then(|rows| {
            rows.iter()
                .find(|r| r.id == id && r.user_id == owner_id)
                .cloned()
        }))
    }

    async fn select_many(
        &self,
        table: Table,
        owner_id: Uuid,
        filters: &Filters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(&table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.user_id == owner_id && filters.matches(&r.data))
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(find_mut(&mut tables, table, id, owner_id).map(|record| apply(record, patch)))
    }

    async fn update_unless(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        guard: (&str, Value),
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        let (field, value) = guard;
        Ok(find_mut(&mut tables, table, id, owner_id)
            .filter(|record| record.data.get(field) != Some(&value))
            .map(|record| apply(record, patch)))
    }

    async fn delete(&self, table: Table, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.user_id == owner_id));
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_records_are_owner_scoped() {
        let store = MemoryRecordStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let record = store
            .insert(Table::Tasks, alice, data(json!({"title": "a"})))
            .await
            .unwrap();

        assert!(store
            .select_by_id(Table::Tasks, record.id, alice)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .select_by_id(Table::Tasks, record.id, bob)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .update(Table::Tasks, record.id, bob, Map::new())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(Table::Tasks, record.id, bob).await.unwrap());
        assert!(store.delete(Table::Tasks, record.id, alice).await.unwrap());
        assert!(!store.delete(Table::Tasks, record.id, alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_select_many_newest_first_with_paging_and_filters() {
        let store = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        for i in 0..5 {
            let status = if i % 2 == 0 { "pending" } else { "completed" };
            store
                .insert(Table::Tasks, owner, data(json!({"n": i, "status": status})))
                .await
                .unwrap();
        }

        let all = store
            .select_many(Table::Tasks, owner, &Filters::new(), 0, 100)
            .await
            .unwrap();
        let order: Vec<_> = all.iter().map(|r| r.data["n"].clone()).collect();
        assert_eq!(order, vec![json!(4), json!(3), json!(2), json!(1), json!(0)]);

        let page = store
            .select_many(Table::Tasks, owner, &Filters::new(), 1, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].data["n"], json!(3));

        let pending = store
            .select_many(Table::Tasks, owner, &Filters::new().eq("status", "pending"), 0, 100)
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);

        let other_table = store
            .select_many(Table::Interviews, owner, &Filters::new(), 0, 100)
            .await
            .unwrap();
        assert!(other_table.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let record = store
            .insert(Table::Tasks, owner, data(json!({"title": "a", "status": "pending"})))
            .await
            .unwrap();
        let updated = store
            .update(Table::Tasks, record.id, owner, data(json!({"status": "completed"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.data["title"], json!("a"));
        assert_eq!(updated.data["status"], json!("completed"));
        assert!(updated.updated_at >= record.updated_at);
    }

    #[tokio::test]
    async fn test_update_unless_skips_guarded_records() {
        let store = MemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let record = store
            .insert(Table::Interviews, owner, data(json!({"status": "pending"})))
            .await
            .unwrap();
        let to_processing = || data(json!({"status": "processing"}));

        let first = store
            .update_unless(Table::Interviews, record.id, owner, ("status", json!("processing")), to_processing())
            .await
            .unwrap();
        assert_eq!(first.unwrap().data["status"], json!("processing"));

        let second = store
            .update_unless(Table::Interviews, record.id, owner, ("status", json!("processing")), to_processing())
            .await
            .unwrap();
        assert!(second.is_none());

        let other_owner = store
            .update_unless(Table::Interviews, record.id, Uuid::new_v4(), ("status", json!("x")), to_processing())
            .await
            .unwrap();
        assert!(other_owner.is_none());
    }
}
