// ABOUTME: Stage task storage layer using SQLite
// ABOUTME: Checklist CRUD with per-stage title uniqueness enforced by a unique index

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{StageTask, StageTaskUpdateInput};
use rfpdesk_core::{generate_id, normalize_title, validate_required_text, Stage};
use rfpdesk_storage::{StorageError, StorageResult};

/// Maximum checklist item title length
pub const MAX_TASK_TITLE_LENGTH: usize = 300;

#[derive(Clone)]
pub struct StageTaskStorage {
    pool: SqlitePool,
}

impl StageTaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List an RFP's tasks in pipeline order, optionally for one stage only
    pub async fn list_tasks(
        &self,
        rfp_id: &str,
        stage: Option<Stage>,
    ) -> StorageResult<Vec<StageTask>> {
        debug!("Fetching stage tasks for rfp: {} (stage: {:?})", rfp_id, stage);

        let rows = match stage {
            Some(stage) => {
                sqlx::query(
                    "SELECT * FROM stage_tasks WHERE rfp_id = ? AND stage = ? ORDER BY created_at, id",
                )
                .bind(rfp_id)
                .bind(stage)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM stage_tasks WHERE rfp_id = ? ORDER BY created_at, id")
                    .bind(rfp_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut tasks = rows.iter().map(row_to_task).collect::<Result<Vec<_>, _>>()?;
        // Stable sort keeps creation order within a stage
        tasks.sort_by_key(|t| t.stage);
        Ok(tasks)
    }

    pub async fn get_task(&self, task_id: &str) -> StorageResult<StageTask> {
        let row = sqlx::query("SELECT * FROM stage_tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("stage task", task_id))?;

        row_to_task(&row)
    }

    /// Titles already present for a stage, normalized
    pub async fn normalized_titles(&self, rfp_id: &str, stage: Stage) -> StorageResult<Vec<String>> {
        let titles = sqlx::query_scalar(
            "SELECT normalized_title FROM stage_tasks WHERE rfp_id = ? AND stage = ?",
        )
        .bind(rfp_id)
        .bind(stage)
        .fetch_all(&self.pool)
        .await?;

        Ok(titles)
    }

    /// Create a manual task. A title that normalizes to an existing one in the
    /// same stage is rejected as `Duplicate`.
    pub async fn create_task(
        &self,
        rfp_id: &str,
        stage: Stage,
        title: &str,
        created_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> StorageResult<StageTask> {
        let title = validate_required_text(title, "Title", MAX_TASK_TITLE_LENGTH)?;
        let normalized = normalize_title(&title);
        let task_id = generate_id("task");

        debug!("Creating stage task: {} for rfp: {} in {}", task_id, rfp_id, stage);

        sqlx::query(
            r#"
            INSERT INTO stage_tasks (
                id, rfp_id, stage, title, normalized_title,
                completed, auto_created, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)
            "#,
        )
        .bind(&task_id)
        .bind(rfp_id)
        .bind(stage)
        .bind(&title)
        .bind(&normalized)
        .bind(created_by)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "stage task", &title))?;

        self.get_task(&task_id).await
    }

    /// Insert an auto-created task unless the stage already has one with the
    /// same normalized title. Returns `None` when nothing was inserted.
    pub async fn insert_if_absent(
        &self,
        rfp_id: &str,
        stage: Stage,
        title: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<StageTask>> {
        let task_id = generate_id("task");

        let result = sqlx::query(
            r#"
            INSERT INTO stage_tasks (
                id, rfp_id, stage, title, normalized_title,
                completed, auto_created, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, 0, 1, NULL, ?)
            ON CONFLICT (rfp_id, stage, normalized_title) DO NOTHING
            "#,
        )
        .bind(&task_id)
        .bind(rfp_id)
        .bind(stage)
        .bind(title)
        .bind(normalize_title(title))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(&task_id).await.map(Some)
    }

    pub async fn update_task(
        &self,
        task_id: &str,
        input: StageTaskUpdateInput,
        now: DateTime<Utc>,
    ) -> StorageResult<StageTask> {
        debug!("Updating stage task: {}", task_id);

        let current = self.get_task(task_id).await?;

        let title = match input.title.as_deref() {
            Some(t) => validate_required_text(t, "Title", MAX_TASK_TITLE_LENGTH)?,
            None => current.title.clone(),
        };
        let normalized = normalize_title(&title);

        let completed = input.completed.unwrap_or(current.completed);
        let completed_at = match (completed, current.completed) {
            (true, true) => current.completed_at,
            (true, false) => Some(now),
            (false, _) => None,
        };

        sqlx::query(
            r#"
            UPDATE stage_tasks SET
                title = ?,
                normalized_title = ?,
                completed = ?,
                completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&normalized)
        .bind(completed)
        .bind(completed_at)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "stage task", &title))?;

        self.get_task(task_id).await
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<StageTask, StorageError> {
    Ok(StageTask {
        id: row.try_get("id")?,
        rfp_id: row.try_get("rfp_id")?,
        stage: row.try_get("stage")?,
        title: row.try_get("title")?,
        normalized_title: row.try_get("normalized_title")?,
        completed: row.try_get("completed")?,
        completed_at: row.try_get("completed_at")?,
        auto_created: row.try_get("auto_created")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}
