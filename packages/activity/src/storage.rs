// ABOUTME: Activity log storage layer using SQLite
// ABOUTME: Insert and query only; rows are never updated or deleted

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{ActivityEvent, NewActivity};
use rfpdesk_core::generate_id;
use rfpdesk_storage::{StorageError, StorageResult};

#[derive(Clone)]
pub struct ActivityLogStorage {
    pool: SqlitePool,
}

impl ActivityLogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one event
    pub async fn append(&self, input: NewActivity) -> StorageResult<ActivityEvent> {
        let event = ActivityEvent {
            id: generate_id("act"),
            rfp_id: input.rfp_id,
            user_id: input.user_id,
            event_type: input.event_type,
            payload: input.payload,
            created_at: Utc::now(),
        };

        debug!(
            "Appending activity {:?} for rfp: {:?}",
            event.event_type, event.rfp_id
        );

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, rfp_id, user_id, event_type, payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.rfp_id)
        .bind(&event.user_id)
        .bind(event.event_type)
        .bind(event.payload.as_ref().map(|p| p.to_string()))
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    /// List events for an RFP, newest first
    pub async fn list_for_rfp_paginated(
        &self,
        rfp_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<ActivityEvent>, i64)> {
        debug!(
            "Fetching activity for rfp: {} (limit: {:?}, offset: {:?})",
            rfp_id, limit, offset
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE rfp_id = ?")
            .bind(rfp_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM activity_logs
            WHERE rfp_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(rfp_id)
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .iter()
            .map(row_to_event)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((events, count))
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityEvent, StorageError> {
    Ok(ActivityEvent {
        id: row.try_get("id")?,
        rfp_id: row.try_get("rfp_id")?,
        user_id: row.try_get("user_id")?,
        event_type: row.try_get("event_type")?,
        payload: row
            .try_get::<Option<String>, _>("payload")?
            .and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.try_get("created_at")?,
    })
}
