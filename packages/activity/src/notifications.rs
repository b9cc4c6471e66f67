// ABOUTME: Notification inbox storage
// ABOUTME: Timeline-driven notices for RFP owners, with read tracking

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{NewNotification, Notification};
use rfpdesk_core::generate_id;
use rfpdesk_storage::{StorageError, StorageResult};

#[derive(Clone)]
pub struct NotificationStorage {
    pool: SqlitePool,
}

impl NotificationStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewNotification) -> StorageResult<Notification> {
        let notification = Notification {
            id: generate_id("ntf"),
            user_id: input.user_id,
            rfp_id: input.rfp_id,
            kind: input.kind,
            message: input.message,
            read_at: None,
            created_at: Utc::now(),
        };

        debug!(
            "Creating notification {} for user: {}",
            notification.kind, notification.user_id
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, rfp_id, kind, message, read_at, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.rfp_id)
        .bind(&notification.kind)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StorageResult<Vec<Notification>> {
        let query = if unread_only {
            "SELECT * FROM notifications WHERE user_id = ? AND read_at IS NULL ORDER BY created_at DESC"
        } else {
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC"
        };

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Mark one of the user's notifications read. Someone else's id is
    /// reported as not found.
    pub async fn mark_read(&self, id: &str, user_id: &str) -> StorageResult<Notification> {
        sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, ?) WHERE id = ? AND user_id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("notification", id))?;

        row_to_notification(&row)
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, StorageError> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        rfp_id: row.try_get("rfp_id")?,
        kind: row.try_get("kind")?,
        message: row.try_get("message")?,
        read_at: row.try_get("read_at")?,
        created_at: row.try_get("created_at")?,
    })
}
