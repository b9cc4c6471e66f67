// ABOUTME: Append-only timeline event storage
// ABOUTME: Inserts run on a caller-provided executor so they can join the tick transaction

use std::collections::BTreeSet;

use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use super::types::{AppliedAction, TimelineAction, TimelineEvent};
use rfpdesk_core::generate_id;
use rfpdesk_storage::{StorageError, StorageResult};

#[derive(Clone)]
pub struct TimelineEventStorage {
    pool: SqlitePool,
}

impl TimelineEventStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        executor: E,
        rfp_id: &str,
        applied: &AppliedAction,
        triggered_by_user_id: Option<&str>,
        payload: Option<&serde_json::Value>,
    ) -> StorageResult<String>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let id = generate_id("tle");
        debug!("Recording timeline event {} for rfp: {}", applied.action, rfp_id);

        sqlx::query(
            r#"
            INSERT INTO timeline_events (
                id, rfp_id, action, milestone_at, applied_at, triggered_by_user_id, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(rfp_id)
        .bind(applied.action)
        .bind(applied.milestone_at)
        .bind(applied.applied_at)
        .bind(triggered_by_user_id)
        .bind(payload.map(|p| p.to_string()))
        .execute(executor)
        .await?;

        Ok(id)
    }

    /// Distinct actions already applied to an RFP, first firing only, oldest
    /// first
    pub async fn applied_actions(&self, rfp_id: &str) -> StorageResult<Vec<AppliedAction>> {
        debug!("Rebuilding applied timeline actions for rfp: {}", rfp_id);

        let rows = sqlx::query(
            "SELECT action, milestone_at, applied_at FROM timeline_events WHERE rfp_id = ?",
        )
        .bind(rfp_id)
        .fetch_all(&self.pool)
        .await?;

        let mut events = rows
            .iter()
            .map(|row| -> StorageResult<AppliedAction> {
                Ok(AppliedAction {
                    action: row.try_get("action")?,
                    milestone_at: row.try_get("milestone_at")?,
                    applied_at: row.try_get("applied_at")?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        events.sort_by(|a, b| {
            (a.applied_at, a.milestone_at, a.action).cmp(&(b.applied_at, b.milestone_at, b.action))
        });

        let mut seen = BTreeSet::<TimelineAction>::new();
        events.retain(|e| seen.insert(e.action));
        Ok(events)
    }

    /// Events for an RFP, newest first
    pub async fn list_for_rfp_paginated(
        &self,
        rfp_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<TimelineEvent>, i64)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM timeline_events WHERE rfp_id = ?")
            .bind(rfp_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT * FROM timeline_events WHERE rfp_id = ? ORDER BY applied_at DESC, milestone_at DESC, id LIMIT ? OFFSET ?",
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

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<TimelineEvent, StorageError> {
    Ok(TimelineEvent {
        id: row.try_get("id")?,
        rfp_id: row.try_get("rfp_id")?,
        action: row.try_get("action")?,
        milestone_at: row.try_get("milestone_at")?,
        applied_at: row.try_get("applied_at")?,
        triggered_by_user_id: row.try_get("triggered_by_user_id")?,
        payload: row
            .try_get::<Option<String>, _>("payload")?
            .map(|s| serde_json::from_str(&s))
            .transpose()?,
    })
}
