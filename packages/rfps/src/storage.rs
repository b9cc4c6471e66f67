// ABOUTME: RFP storage layer using SQLite
// ABOUTME: CRUD with optimistic versioning; archived rows are never updated

use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use super::types::{Rfp, RfpCreateInput, RfpUpdateInput, StageChange};
use rfpdesk_core::{generate_id, validate_required_text, RfpStatus, Stage, ValidationError};
use rfpdesk_storage::{StorageError, StorageResult};

/// Maximum RFP title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum RFP description length
pub const MAX_DESCRIPTION_LENGTH: usize = 20_000;

#[derive(Clone)]
pub struct RfpStorage {
    pool: SqlitePool,
}

impl RfpStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get_rfp(&self, rfp_id: &str) -> StorageResult<Rfp> {
        debug!("Fetching rfp: {}", rfp_id);

        let row = sqlx::query("SELECT * FROM rfps WHERE id = ?")
            .bind(rfp_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("rfp", rfp_id))?;

        row_to_rfp(&row)
    }

    /// List a company's RFPs, newest first
    pub async fn list_rfps_paginated(
        &self,
        company_id: &str,
        include_archived: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Rfp>, i64)> {
        debug!(
            "Fetching rfps for company: {} (archived: {}, limit: {:?}, offset: {:?})",
            company_id, include_archived, limit, offset
        );

        let archived_clause = if include_archived {
            ""
        } else {
            " AND is_archived = 0"
        };

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM rfps WHERE company_id = ?{}",
            archived_clause
        ))
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM rfps WHERE company_id = ?{} ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
            archived_clause
        ))
        .bind(company_id)
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let rfps = rows.iter().map(row_to_rfp).collect::<Result<Vec<_>, _>>()?;
        Ok((rfps, count))
    }

    /// List active RFPs a supplier company has been invited to
    pub async fn list_invited_rfps_paginated(
        &self,
        supplier_company_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Rfp>, i64)> {
        debug!("Fetching invited rfps for supplier company: {}", supplier_company_id);

        const VISIBLE: &str = r#"
            FROM rfps r
            WHERE r.is_archived = 0
            AND EXISTS (
                SELECT 1 FROM supplier_contacts c
                WHERE c.rfp_id = r.id AND c.supplier_company_id = ?
            )
        "#;

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", VISIBLE))
            .bind(supplier_company_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT r.* {} ORDER BY r.created_at DESC, r.id LIMIT ? OFFSET ?",
            VISIBLE
        ))
        .bind(supplier_company_id)
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let rfps = rows.iter().map(row_to_rfp).collect::<Result<Vec<_>, _>>()?;
        Ok((rfps, count))
    }

    /// Active RFPs with at least one milestone configured
    pub async fn list_timeline_candidates(&self) -> StorageResult<Vec<Rfp>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM rfps
            WHERE is_archived = 0
            AND (
                ask_questions_start IS NOT NULL OR ask_questions_end IS NOT NULL
                OR submission_start IS NOT NULL OR submission_end IS NOT NULL
                OR demo_window_start IS NOT NULL OR demo_window_end IS NOT NULL
                OR award_date IS NOT NULL
            )
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rfp).collect()
    }

    /// Create an RFP in INTAKE, entering the stage at `now`
    pub async fn create_rfp(
        &self,
        company_id: &str,
        user_id: &str,
        input: RfpCreateInput,
        now: DateTime<Utc>,
    ) -> StorageResult<Rfp> {
        let rfp_id = generate_id("rfp");
        let title = validate_required_text(&input.title, "Title", MAX_TITLE_LENGTH)?;
        let description = validate_description(input.description.as_deref())?;
        let status = input.status.unwrap_or_default();

        debug!("Creating rfp: {} for company: {}", rfp_id, company_id);

        let t = &input.timeline;
        sqlx::query(
            r#"
            INSERT INTO rfps (
                id, title, description, stage, status,
                stage_entered_at, stage_sla_days,
                ask_questions_start, ask_questions_end,
                submission_start, submission_end,
                demo_window_start, demo_window_end, award_date,
                is_archived, user_id, company_id, version,
                created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?,
                ?, ?,
                ?, ?,
                ?, ?,
                ?, ?, ?,
                0, ?, ?, 1,
                ?, ?
            )
            "#,
        )
        .bind(&rfp_id)
        .bind(&title)
        .bind(&description)
        .bind(Stage::Intake)
        .bind(status)
        .bind(now)
        .bind(input.stage_sla_days)
        .bind(t.ask_questions_start)
        .bind(t.ask_questions_end)
        .bind(t.submission_start)
        .bind(t.submission_end)
        .bind(t.demo_window_start)
        .bind(t.demo_window_end)
        .bind(t.award_date)
        .bind(user_id)
        .bind(company_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_rfp(&rfp_id).await
    }

    /// Apply the provided fields and reset the cleared ones. Returns
    /// `Conflict` if the row changed since `expected_version` was read or was
    /// archived in the meantime.
    pub async fn update_rfp(
        &self,
        rfp_id: &str,
        expected_version: i64,
        input: RfpUpdateInput,
        now: DateTime<Utc>,
    ) -> StorageResult<Rfp> {
        debug!("Updating rfp: {} (version {})", rfp_id, expected_version);

        if input.is_empty() {
            return self.get_rfp(rfp_id).await;
        }

        if let Some(field) = input.clear.iter().find(|f| input.sets(**f)) {
            return Err(ValidationError::Invalid {
                field: field.column().to_string(),
                message: "cannot be set and cleared in one update".to_string(),
            }
            .into());
        }

        let title = input
            .title
            .as_deref()
            .map(|t| validate_required_text(t, "Title", MAX_TITLE_LENGTH))
            .transpose()?;
        let description = validate_description(input.description.as_deref())?;

        // Build dynamic UPDATE query based on provided fields
        let mut query =
            String::from("UPDATE rfps SET updated_at = ?, version = version + 1");

        if title.is_some() {
            query.push_str(", title = ?");
        }
        if description.is_some() {
            query.push_str(", description = ?");
        }
        if input.status.is_some() {
            query.push_str(", status = ?");
        }
        if input.stage_sla_days.is_some() {
            query.push_str(", stage_sla_days = ?");
        }

        let t = &input.timeline;
        let milestones = [
            ("ask_questions_start", t.ask_questions_start),
            ("ask_questions_end", t.ask_questions_end),
            ("submission_start", t.submission_start),
            ("submission_end", t.submission_end),
            ("demo_window_start", t.demo_window_start),
            ("demo_window_end", t.demo_window_end),
            ("award_date", t.award_date),
        ];
        for (column, value) in &milestones {
            if value.is_some() {
                query.push_str(&format!(", {} = ?", column));
            }
        }

        let mut cleared: Vec<&str> = input.clear.iter().map(|f| f.column()).collect();
        cleared.sort_unstable();
        cleared.dedup();
        for column in cleared {
            query.push_str(&format!(", {} = NULL", column));
        }

        query.push_str(" WHERE id = ? AND version = ? AND is_archived = 0");

        let mut q = sqlx::query(&query).bind(now);

        if let Some(title) = &title {
            q = q.bind(title);
        }
        if let Some(description) = &description {
            q = q.bind(description);
        }
        if let Some(status) = input.status {
            q = q.bind(status);
        }
        if let Some(days) = input.stage_sla_days {
            q = q.bind(days);
        }
        for (_, value) in milestones {
            if let Some(value) = value {
                q = q.bind(value);
            }
        }

        let result = q
            .bind(rfp_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        self.check_written(rfp_id, result.rows_affected()).await?;
        self.get_rfp(rfp_id).await
    }

    /// Move the RFP to a new stage. Entering `Archived` also sets the archive
    /// metadata.
    pub async fn update_stage(&self, rfp_id: &str, change: StageChange) -> StorageResult<Rfp> {
        debug!(
            "Updating stage of rfp: {} to {} (version {})",
            rfp_id, change.stage, change.expected_version
        );

        let archiving = change.stage == Stage::Archived;

        let result = sqlx::query(
            r#"
            UPDATE rfps SET
                stage = ?,
                stage_entered_at = ?,
                is_archived = ?,
                archived_at = CASE WHEN ? THEN ? ELSE archived_at END,
                archived_by = CASE WHEN ? THEN ? ELSE archived_by END,
                updated_at = ?,
                version = version + 1
            WHERE id = ? AND version = ? AND is_archived = 0
            "#,
        )
        .bind(change.stage)
        .bind(change.entered_at)
        .bind(archiving)
        .bind(archiving)
        .bind(change.entered_at)
        .bind(archiving)
        .bind(&change.archived_by)
        .bind(change.entered_at)
        .bind(rfp_id)
        .bind(change.expected_version)
        .execute(&self.pool)
        .await?;

        self.check_written(rfp_id, result.rows_affected()).await?;
        self.get_rfp(rfp_id).await
    }

    /// Persist a timeline snapshot (and optional stage auto-advance) inside a
    /// caller-owned transaction
    pub async fn write_timeline_state<'e, E>(
        executor: E,
        rfp_id: &str,
        expected_version: i64,
        timeline_state: &serde_json::Value,
        advance_to: Option<Stage>,
        now: DateTime<Utc>,
    ) -> StorageResult<()>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        debug!(
            "Writing timeline state for rfp: {} (advance: {:?})",
            rfp_id, advance_to
        );

        let result = sqlx::query(
            r#"
            UPDATE rfps SET
                timeline_state = ?,
                stage = COALESCE(?, stage),
                stage_entered_at = CASE WHEN ? IS NULL THEN stage_entered_at ELSE ? END,
                updated_at = ?,
                version = version + 1
            WHERE id = ? AND version = ? AND is_archived = 0
            "#,
        )
        .bind(timeline_state.to_string())
        .bind(advance_to)
        .bind(advance_to)
        .bind(now)
        .bind(now)
        .bind(rfp_id)
        .bind(expected_version)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::conflict("rfp", rfp_id));
        }
        Ok(())
    }

    /// Distinguish "row missing" from "version mismatch" after a guarded write
    async fn check_written(&self, rfp_id: &str, rows_affected: u64) -> StorageResult<()> {
        if rows_affected > 0 {
            return Ok(());
        }
        // Surfaces NotFound when the row does not exist at all
        self.get_rfp(rfp_id).await?;
        Err(StorageError::conflict("rfp", rfp_id))
    }
}

fn validate_description(description: Option<&str>) -> StorageResult<Option<String>> {
    match description.map(str::trim) {
        Some("") | None => Ok(None),
        Some(d) => Ok(Some(validate_required_text(
            d,
            "Description",
            MAX_DESCRIPTION_LENGTH,
        )?)),
    }
}

fn row_to_rfp(row: &sqlx::sqlite::SqliteRow) -> Result<Rfp, StorageError> {
    use super::types::RfpTimeline;

    Ok(Rfp {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        stage: row.try_get("stage")?,
        status: row.try_get::<RfpStatus, _>("status")?,
        stage_entered_at: row.try_get("stage_entered_at")?,
        stage_sla_days: row.try_get("stage_sla_days")?,
        timeline: RfpTimeline {
            ask_questions_start: row.try_get("ask_questions_start")?,
            ask_questions_end: row.try_get("ask_questions_end")?,
            submission_start: row.try_get("submission_start")?,
            submission_end: row.try_get("submission_end")?,
            demo_window_start: row.try_get("demo_window_start")?,
            demo_window_end: row.try_get("demo_window_end")?,
            award_date: row.try_get("award_date")?,
        },
        timeline_state: row.try_get("timeline_state")?,
        is_archived: row.try_get("is_archived")?,
        archived_at: row.try_get("archived_at")?,
        archived_by: row.try_get("archived_by")?,
        user_id: row.try_get("user_id")?,
        company_id: row.try_get("company_id")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
