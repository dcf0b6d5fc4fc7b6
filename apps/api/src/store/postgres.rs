use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::store::{Filters, Record, RecordStore, StoreError, Table};

const COLUMNS: &str = "id, user_id, data, created_at, updated_at";

#[derive(Debug, FromRow)]
struct RecordRow {
    id: Uuid,
    user_id: Uuid,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self, table: Table) -> Result<Record, StoreError> {
        let Value::Object(data) = self.data else {
            return Err(StoreError::Corrupt {
                table: table.name(),
                message: format!("row {} has a non-object data column", self.id),
            });
        };
        Ok(Record {
            id: self.id,
            user_id: self.user_id,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Postgres-backed record store. Table names come from `Table`, never from input.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(
        &self,
        table: Table,
        owner_id: Uuid,
        data: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "INSERT INTO {} (id, user_id, data) VALUES ($1, $2, $3) RETURNING {COLUMNS}",
            table.name()
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(Json(Value::Object(data)))
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted {} row {}", table.name(), row.id);
        row.into_record(table)
    }

    async fn select_by_id(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Record>, StoreError> {
        sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1 AND user_id = $2",
            table.name()
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.into_record(table))
        .transpose()
    }

    async fn select_many(
        &self,
        table: Table,
        owner_id: Uuid,
        filters: &Filters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Record>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM {} WHERE user_id = ",
            table.name()
        ));
        query.push_bind(owner_id);
        for (field, value) in filters.iter() {
            query
                .push(" AND data -> ")
                .push_bind(field.clone())
                .push("::text = ")
                .push_bind(Json(value.clone()))
                .push("::jsonb");
        }
        query
            .push(" ORDER BY created_at DESC OFFSET ")
            .push_bind(offset)
            .push(" LIMIT ")
            .push_bind(limit);

        query
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_record(table))
            .collect()
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        sqlx::query_as::<_, RecordRow>(&format!(
            "UPDATE {} SET data = data || $1, updated_at = now() \
             WHERE id = $2 AND user_id = $3 RETURNING {COLUMNS}",
            table.name()
        ))
        .bind(Json(Value::Object(patch)))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.into_record(table))
        .transpose()
    }

    async fn update_unless(
        &self,
        table: Table,
        id: Uuid,
        owner_id: Uuid,
        guard: (&str, Value),
        patch: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        let (field, value) = guard;
        sqlx::query_as::<_, RecordRow>(&format!(
            "UPDATE {} SET data = data || $1, updated_at = now() \
             WHERE id = $2 AND user_id = $3 AND (data -> $4::text) IS DISTINCT FROM $5::jsonb \
             RETURNING {COLUMNS}",
            table.name()
        ))
        .bind(Json(Value::Object(patch)))
        .bind(id)
        .bind(owner_id)
        .bind(field)
        .bind(Json(value))
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.into_record(table))
        .transpose()
    }

    async fn delete(&self, table: Table, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
            table.name()
        ))
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
