//! PostgreSQL implementation of CollectionGateway.
//!
//! Each collection lives in its own table. Table and order column names
//! come from [`CollectionKind`] only, and payload keys are checked to be
//! plain identifiers before they reach a statement. Payload columns travel
//! as JSON: rows are read with `to_jsonb` and written with
//! `jsonb_populate_record`, so adding a content column needs no code change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::domain::collection::{
    validate_payload_keys, CollectionKind, Entity, NewEntity, OrderAssignment, Payload,
    PayloadPatch, Scope,
};
use crate::domain::foundation::{DomainError, EntityId, ErrorCode, PublicationStatus, Timestamp};
use crate::ports::CollectionGateway;

/// Columns maintained by the adapter itself; never exposed in a payload.
const ADAPTER_COLUMNS: [&str; 1] = ["updated_at"];

#[derive(Clone)]
pub struct PostgresCollectionGateway {
    pool: PgPool,
}

impl PostgresCollectionGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionGateway for PostgresCollectionGateway {
    async fn fetch_ordered(&self, scope: &Scope) -> Result<Vec<Entity>, DomainError> {
        let rows = sqlx::query(&select_sql(scope.collection))
            .bind(parent_param(scope))
            .bind(hidden_columns(scope.collection))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("fetch collection", e))?;

        rows.into_iter().map(row_to_entity).collect()
    }

    async fn insert(&self, scope: &Scope, entity: &NewEntity) -> Result<EntityId, DomainError> {
        if !scope.contains_parent(entity.parent_id.as_ref()) {
            return Err(DomainError::new(
                ErrorCode::ScopeMismatch,
                format!("Row parent does not match scope {}", scope),
            ));
        }
        let record = insert_record(scope.collection, entity)?;
        let table = scope.collection.table();
        let sql = format!(
            "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1::jsonb) \
             RETURNING id::text AS id"
        );

        let row = sqlx::query(&sql)
            .bind(record.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("insert entity", e))?;
        let id: String = row
            .try_get("id")
            .map_err(|e| malformed(format!("inserted id: {}", e)))?;

        EntityId::new(id).map_err(DomainError::from)
    }

    async fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        patch: &PayloadPatch,
    ) -> Result<(), DomainError> {
        let kind = scope.collection;
        let (columns, record) = update_record(kind, patch)?;
        let sql = update_sql(kind, &columns);

        let result = sqlx::query(&sql)
            .bind(record.to_string())
            .bind(id.as_str())
            .bind(parent_param(scope))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update entity", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, scope: &Scope, id: &EntityId) -> Result<(), DomainError> {
        let sql = format!(
            "DELETE FROM {} t WHERE t.id::text = $1 AND {}",
            scope.collection.table(),
            parent_filter(scope.collection, 2)
        );

        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(parent_param(scope))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete entity", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn update_order_batch(
        &self,
        scope: &Scope,
        assignments: &[OrderAssignment],
    ) -> Result<(), DomainError> {
        if assignments.is_empty() {
            return Ok(());
        }
        let kind = scope.collection;
        let sql = format!(
            "UPDATE {table} t SET {order} = $1, updated_at = NOW() \
             WHERE t.id::text = $2 AND {filter}",
            table = kind.table(),
            order = kind.order_column(),
            filter = parent_filter(kind, 3)
        );

        // Rolled back on drop unless committed
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin order batch", e))?;

        for assignment in assignments {
            let result = sqlx::query(&sql)
                .bind(assignment.order)
                .bind(assignment.id.as_str())
                .bind(parent_param(scope))
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("update order", e))?;

            if result.rows_affected() == 0 {
                return Err(not_found(&assignment.id));
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error("commit order batch", e))?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SQL building
// ════════════════════════════════════════════════════════════════════════════

/// Restricts rows to the scope's parent; binds the parent id (or NULL) at
/// `$param`. Flat collections ignore the parameter.
fn parent_filter(kind: CollectionKind, param: usize) -> String {
    if kind.is_hierarchical() {
        format!("t.parent_id::text IS NOT DISTINCT FROM ${}", param)
    } else {
        format!("${}::text IS NULL", param)
    }
}

fn parent_param(scope: &Scope) -> Option<String> {
    scope.parent.as_ref().map(|p| p.as_str().to_string())
}

/// Columns stripped from `to_jsonb(t)` to leave only the payload.
fn hidden_columns(kind: CollectionKind) -> Vec<String> {
    kind.reserved_fields()
        .iter()
        .chain(ADAPTER_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect()
}

fn select_sql(kind: CollectionKind) -> String {
    let parent = if kind.is_hierarchical() {
        "t.parent_id::text"
    } else {
        "NULL::text"
    };
    let status = if kind.has_status() {
        "t.status"
    } else {
        "NULL::text"
    };
    format!(
        "SELECT t.id::text AS id, t.{order} AS sort_order, {parent} AS parent_id, \
         {status} AS status, t.created_at, (to_jsonb(t) - $2::text[])::text AS payload \
         FROM {table} t WHERE {filter} \
         ORDER BY t.{order}, t.created_at, t.id",
        order = kind.order_column(),
        table = kind.table(),
        filter = parent_filter(kind, 1),
    )
}

fn update_sql(kind: CollectionKind, columns: &[String]) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
    format!(
        "UPDATE {table} t SET {set} \
         FROM jsonb_populate_record(NULL::{table}, $1::jsonb) r \
         WHERE t.id::text = $2 AND {filter}",
        table = kind.table(),
        set = assignments.join(", "),
        filter = parent_filter(kind, 3),
    )
}

/// Full JSON record for a new row, including the columns the ordering
/// layer and this adapter own.
fn insert_record(kind: CollectionKind, entity: &NewEntity) -> Result<Value, DomainError> {
    validate_payload_keys(kind, &entity.payload)?;

    let created_at = entity.created_at.as_datetime().to_rfc3339();
    let mut record: Payload = entity.payload.clone();
    record.insert("id".into(), json!(EntityId::generate().as_str()));
    record.insert(kind.order_column().into(), json!(entity.order));
    if kind.is_hierarchical() {
        record.insert(
            "parent_id".into(),
            json!(entity.parent_id.as_ref().map(|p| p.as_str())),
        );
    }
    if kind.has_status() {
        let status = entity.status.unwrap_or_default();
        record.insert("status".into(), json!(status.as_str()));
    }
    record.insert("created_at".into(), json!(created_at));
    record.insert(
        "updated_at".into(),
        json!(Timestamp::now().as_datetime().to_rfc3339()),
    );
    Ok(Value::Object(record))
}

/// Columns touched by `patch` and the JSON record carrying their values.
fn update_record(
    kind: CollectionKind,
    patch: &PayloadPatch,
) -> Result<(Vec<String>, Value), DomainError> {
    validate_payload_keys(kind, &patch.fields)?;

    let mut columns: Vec<String> = patch.fields.keys().cloned().collect();
    let mut record: Payload = patch.fields.clone();
    if let Some(status) = patch.status {
        if !kind.has_status() {
            return Err(DomainError::validation(
                "status",
                format!("{} entries have no publication status", kind),
            ));
        }
        columns.push("status".into());
        record.insert("status".into(), json!(status.as_str()));
    }
    columns.push("updated_at".into());
    record.insert(
        "updated_at".into(),
        json!(Timestamp::now().as_datetime().to_rfc3339()),
    );
    Ok((columns, Value::Object(record)))
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

fn row_to_entity(row: PgRow) -> Result<Entity, DomainError> {
    let id: String = row.try_get("id").map_err(|e| malformed(e.to_string()))?;
    let order: i32 = row
        .try_get("sort_order")
        .map_err(|e| malformed(e.to_string()))?;
    let parent_id: Option<String> = row
        .try_get("parent_id")
        .map_err(|e| malformed(e.to_string()))?;
    let status: Option<String> = row.try_get("status").map_err(|e| malformed(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| malformed(e.to_string()))?;
    let payload: String = row.try_get("payload").map_err(|e| malformed(e.to_string()))?;

    let payload: Payload = serde_json::from_str(&payload)
        .map_err(|e| malformed(format!("payload of {}: {}", id, e)))?;
    let status = status
        .map(|s| PublicationStatus::from_str(&s))
        .transpose()
        .map_err(|e| malformed(format!("status of {}: {}", id, e)))?;
    let parent_id = parent_id
        .map(EntityId::new)
        .transpose()
        .map_err(|e| malformed(e.to_string()))?;
    let id = EntityId::new(id).map_err(|e| malformed(e.to_string()))?;

    Ok(Entity::reconstitute(
        id,
        order,
        parent_id,
        payload,
        status,
        Timestamp::from_datetime(created_at),
    ))
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    let code = match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ErrorCode::Unreachable,
        _ => ErrorCode::DatabaseError,
    };
    DomainError::new(code, format!("Failed to {}: {}", action, e))
}

fn malformed(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::MalformedData, message)
}

fn not_found(id: &EntityId) -> DomainError {
    DomainError::new(ErrorCode::EntityNotFound, format!("Entity not found: {}", id))
        .with_detail("entity_id", id.as_str())
}
