// ABOUTME: Supplier contact and response storage using SQLite
// ABOUTME: Versioned JSON columns are decoded on read and tagged on write

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{
    ContactInviteInput, ContactStatus, ExtractedPricing, ReadinessBreakdown, ResponseInput,
    ResponseStatus, SupplierContact, SupplierResponse,
};
use rfpdesk_core::{generate_id, validate_percentage, validate_required_text, ValidationError};
use rfpdesk_storage::{StorageError, StorageResult};

const MAX_EMAIL_LENGTH: usize = 320;
const MAX_NAME_LENGTH: usize = 200;

#[derive(Clone)]
pub struct ContactStorage {
    pool: SqlitePool,
}

impl ContactStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn invite(
        &self,
        rfp_id: &str,
        input: ContactInviteInput,
        now: DateTime<Utc>,
    ) -> StorageResult<SupplierContact> {
        let email = validate_required_text(&input.email, "Email", MAX_EMAIL_LENGTH)?.to_lowercase();
        if !email.contains('@') {
            return Err(ValidationError::Invalid {
                field: "Email".to_string(),
                message: "must be an email address".to_string(),
            }
            .into());
        }
        let name = input
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| validate_required_text(n, "Name", MAX_NAME_LENGTH))
            .transpose()?;

        let contact_id = generate_id("sc");
        debug!("Inviting supplier contact {} to rfp: {}", contact_id, rfp_id);

        sqlx::query(
            r#"
            INSERT INTO supplier_contacts (id, rfp_id, supplier_company_id, email, name, status, invited_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact_id)
        .bind(rfp_id)
        .bind(&input.supplier_company_id)
        .bind(&email)
        .bind(&name)
        .bind(ContactStatus::Invited)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "supplier contact", &email))?;

        self.get_contact(&contact_id).await
    }

    pub async fn get_contact(&self, contact_id: &str) -> StorageResult<SupplierContact> {
        let row = sqlx::query("SELECT * FROM supplier_contacts WHERE id = ?")
            .bind(contact_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("supplier contact", contact_id))?;

        row_to_contact(&row)
    }

    pub async fn list_contacts(&self, rfp_id: &str) -> StorageResult<Vec<SupplierContact>> {
        let rows = sqlx::query("SELECT * FROM supplier_contacts WHERE rfp_id = ? ORDER BY invited_at, id")
            .bind(rfp_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_contact).collect()
    }

    /// Contacts on `rfp_id` that belong to a supplier company
    pub async fn list_for_company(
        &self,
        rfp_id: &str,
        supplier_company_id: &str,
    ) -> StorageResult<Vec<SupplierContact>> {
        let rows = sqlx::query(
            "SELECT * FROM supplier_contacts WHERE rfp_id = ? AND supplier_company_id = ? ORDER BY invited_at, id",
        )
        .bind(rfp_id)
        .bind(supplier_company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_contact).collect()
    }

    /// Contacts across all of a buying company's active RFPs
    pub async fn list_for_buyer(&self, company_id: &str) -> StorageResult<Vec<SupplierContact>> {
        let rows = sqlx::query(
            r#"
            SELECT c.* FROM supplier_contacts c
            JOIN rfps r ON r.id = c.rfp_id
            WHERE r.company_id = ? AND r.is_archived = 0
            ORDER BY c.invited_at, c.id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_contact).collect()
    }

    /// Supplier companies invited to an RFP
    pub async fn invited_companies(&self, rfp_id: &str) -> StorageResult<Vec<String>> {
        let ids = sqlx::query_scalar(
            "SELECT DISTINCT supplier_company_id FROM supplier_contacts WHERE rfp_id = ? AND supplier_company_id IS NOT NULL",
        )
        .bind(rfp_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn set_status(&self, contact_id: &str, status: ContactStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE supplier_contacts SET status = ? WHERE id = ?")
            .bind(status)
            .bind(contact_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("supplier contact", contact_id));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ResponseStorage {
    pool: SqlitePool,
}

impl ResponseStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_response(&self, response_id: &str) -> StorageResult<SupplierResponse> {
        let row = sqlx::query("SELECT * FROM supplier_responses WHERE id = ?")
            .bind(response_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("supplier response", response_id))?;

        row_to_response(&row)
    }

    pub async fn list_for_rfp(&self, rfp_id: &str) -> StorageResult<Vec<SupplierResponse>> {
        let rows = sqlx::query(
            "SELECT * FROM supplier_responses WHERE rfp_id = ? ORDER BY created_at, id",
        )
        .bind(rfp_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_response).collect()
    }

    /// Responses across all of a company's active RFPs
    pub async fn list_for_company(&self, company_id: &str) -> StorageResult<Vec<SupplierResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT sr.* FROM supplier_responses sr
            JOIN rfps r ON r.id = sr.rfp_id
            WHERE r.company_id = ? AND r.is_archived = 0
            ORDER BY sr.created_at, sr.id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_response).collect()
    }

    pub async fn create_response(
        &self,
        rfp_id: &str,
        contact_id: &str,
        input: ResponseInput,
        now: DateTime<Utc>,
    ) -> StorageResult<SupplierResponse> {
        let answers_total = input.answers_total.unwrap_or(0);
        let answers_completed = input.answers_completed.unwrap_or(0);
        validate_answers(answers_total, answers_completed)?;
        let coverage = input
            .compliance_coverage
            .map(|c| validate_percentage(c, "Compliance coverage"))
            .transpose()?;
        let pricing = input
            .extracted_pricing
            .as_ref()
            .map(|p| p.to_stored().map(|v| v.to_string()))
            .transpose()?;

        let response_id = generate_id("resp");
        debug!("Creating supplier response {} for rfp: {}", response_id, rfp_id);

        sqlx::query(
            r#"
            INSERT INTO supplier_responses (
                id, rfp_id, supplier_contact_id, status,
                answers_total, answers_completed, compliance_coverage, extracted_pricing,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&response_id)
        .bind(rfp_id)
        .bind(contact_id)
        .bind(ResponseStatus::Draft)
        .bind(answers_total)
        .bind(answers_completed)
        .bind(coverage)
        .bind(pricing)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "supplier response", contact_id))?;

        self.get_response(&response_id).await
    }

    /// Update a draft response. Submitted responses are frozen.
    pub async fn update_response(
        &self,
        response_id: &str,
        input: ResponseInput,
        now: DateTime<Utc>,
    ) -> StorageResult<SupplierResponse> {
        let current = self.get_response(response_id).await?;
        if current.status == ResponseStatus::Submitted {
            return Err(ValidationError::Invalid {
                field: "Response".to_string(),
                message: "already submitted".to_string(),
            }
            .into());
        }

        let answers_total = input.answers_total.unwrap_or(current.answers_total);
        let answers_completed = input.answers_completed.unwrap_or(current.answers_completed);
        validate_answers(answers_total, answers_completed)?;
        let coverage = match input.compliance_coverage {
            Some(c) => Some(validate_percentage(c, "Compliance coverage")?),
            None => current.compliance_coverage,
        };
        let pricing = input
            .extracted_pricing
            .or(current.extracted_pricing)
            .map(|p| p.to_stored().map(|v| v.to_string()))
            .transpose()?;

        debug!("Updating supplier response: {}", response_id);

        sqlx::query(
            r#"
            UPDATE supplier_responses SET
                answers_total = ?,
                answers_completed = ?,
                compliance_coverage = ?,
                extracted_pricing = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(answers_total)
        .bind(answers_completed)
        .bind(coverage)
        .bind(pricing)
        .bind(now)
        .bind(response_id)
        .execute(&self.pool)
        .await?;

        self.get_response(response_id).await
    }

    pub async fn mark_submitted(
        &self,
        response_id: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<SupplierResponse> {
        let result = sqlx::query(
            "UPDATE supplier_responses SET status = ?, submitted_at = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(ResponseStatus::Submitted)
        .bind(now)
        .bind(now)
        .bind(response_id)
        .bind(ResponseStatus::Draft)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // NotFound if missing, otherwise it was already submitted
            self.get_response(response_id).await?;
            return Err(ValidationError::Invalid {
                field: "Response".to_string(),
                message: "already submitted".to_string(),
            }
            .into());
        }

        self.get_response(response_id).await
    }

    /// Persist derived readiness fields
    pub async fn write_readiness(
        &self,
        response_id: &str,
        breakdown: &ReadinessBreakdown,
    ) -> StorageResult<SupplierResponse> {
        let result = sqlx::query(
            r#"
            UPDATE supplier_responses SET
                readiness_score = ?,
                readiness_breakdown = ?,
                compliance_flags = ?,
                readiness_updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(breakdown.score)
        .bind(breakdown.to_stored()?.to_string())
        .bind(serde_json::to_string(&breakdown.flags)?)
        .bind(breakdown.computed_at)
        .bind(response_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("supplier response", response_id));
        }
        self.get_response(response_id).await
    }
}

fn validate_answers(total: i64, completed: i64) -> Result<(), ValidationError> {
    if total < 0 || completed < 0 {
        return Err(ValidationError::Invalid {
            field: "Answers".to_string(),
            message: "counts cannot be negative".to_string(),
        });
    }
    if completed > total {
        return Err(ValidationError::Invalid {
            field: "Answers".to_string(),
            message: format!("{} completed exceeds {} total", completed, total),
        });
    }
    Ok(())
}

fn row_to_contact(row: &sqlx::sqlite::SqliteRow) -> Result<SupplierContact, StorageError> {
    Ok(SupplierContact {
        id: row.try_get("id")?,
        rfp_id: row.try_get("rfp_id")?,
        supplier_company_id: row.try_get("supplier_company_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        status: row.try_get("status")?,
        invited_at: row.try_get("invited_at")?,
    })
}

/// Decode a versioned JSON column. A row this build cannot read is a data
/// integrity problem, not a request error.
fn decode_column<T>(
    raw: Option<String>,
    parse: impl FnOnce(serde_json::Value) -> Result<T, rfpdesk_core::VersionedError>,
) -> Result<Option<T>, StorageError> {
    raw.map(|s| {
        let value: serde_json::Value = serde_json::from_str(&s)?;
        parse(value).map_err(|e| StorageError::Database(e.to_string()))
    })
    .transpose()
}

fn row_to_response(row: &sqlx::sqlite::SqliteRow) -> Result<SupplierResponse, StorageError> {
    let flags: Option<String> = row.try_get("compliance_flags")?;

    Ok(SupplierResponse {
        id: row.try_get("id")?,
        rfp_id: row.try_get("rfp_id")?,
        supplier_contact_id: row.try_get("supplier_contact_id")?,
        status: row.try_get("status")?,
        answers_total: row.try_get("answers_total")?,
        answers_completed: row.try_get("answers_completed")?,
        compliance_coverage: row.try_get("compliance_coverage")?,
        extracted_pricing: decode_column(
            row.try_get("extracted_pricing")?,
            ExtractedPricing::from_stored,
        )?,
        submitted_at: row.try_get("submitted_at")?,
        readiness_score: row.try_get("readiness_score")?,
        readiness_breakdown: decode_column(
            row.try_get("readiness_breakdown")?,
            ReadinessBreakdown::from_stored,
        )?,
        compliance_flags: flags
            .map(|f| serde_json::from_str(&f))
            .transpose()?
            .unwrap_or_default(),
        readiness_updated_at: row.try_get("readiness_updated_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
