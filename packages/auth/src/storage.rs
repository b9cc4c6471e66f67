// ABOUTME: Database storage for companies, users, and bearer sessions
// ABOUTME: Sessions are stored by token hash and checked for expiry on every lookup

use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::token::{generate_token, hash_token};
use crate::types::{Company, IssuedSession, NewUser, Session, User};
use rfpdesk_core::{generate_id, validate_required_text, ValidationError};
use rfpdesk_storage::{StorageError, StorageResult};

const MAX_NAME_LENGTH: usize = 200;
const MAX_EMAIL_LENGTH: usize = 320;

#[derive(Clone)]
pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_company(&self, name: &str, now: DateTime<Utc>) -> StorageResult<Company> {
        let name = validate_required_text(name, "Company name", MAX_NAME_LENGTH)?;
        let company_id = generate_id("co");
        debug!("Creating company: {}", company_id);

        sqlx::query("INSERT INTO companies (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&company_id)
            .bind(&name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(Company {
            id: company_id,
            name,
            created_at: now,
        })
    }

    pub async fn get_company(&self, company_id: &str) -> StorageResult<Company> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = ?")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("company", company_id))?;

        Ok(Company {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub async fn create_user(&self, input: NewUser, now: DateTime<Utc>) -> StorageResult<User> {
        let email = normalize_email(&input.email)?;
        let name = validate_required_text(&input.name, "Name", MAX_NAME_LENGTH)?;
        self.get_company(&input.company_id).await?;

        let user_id = generate_id("usr");
        debug!("Creating user: {} in company: {}", user_id, input.company_id);

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, company_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(&email)
        .bind(&name)
        .bind(input.role)
        .bind(&input.company_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "user", &email))?;

        self.get_user(&user_id).await
    }

    pub async fn get_user(&self, user_id: &str) -> StorageResult<User> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("user", user_id))?;

        row_to_user(&row)
    }

    pub async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = normalize_email(email)?;
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[derive(Clone)]
pub struct SessionStorage {
    pool: SqlitePool,
}

impl SessionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a session for `user_id` valid for `ttl`. The plaintext token is
    /// only available in the returned value.
    pub async fn issue(
        &self,
        user_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedSession> {
        let token = generate_token();
        let expires_at = now + ttl;

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!("Issued session for user: {} (expires {})", user_id, expires_at);

        Ok(IssuedSession {
            token,
            user_id: user_id.to_string(),
            expires_at,
        })
    }

    /// Resolve a bearer token to its session. Unknown tokens are
    /// `Unauthenticated`; a session is expired once `now >= expires_at`.
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Session> {
        let row = sqlx::query(
            r#"
            SELECT s.user_id, s.expires_at, u.role, u.company_id
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ?
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

        let session = Session {
            user_id: row.try_get("user_id")?,
            role: row.try_get("role")?,
            company_id: row.try_get("company_id")?,
            expires_at: row.try_get("expires_at")?,
        };

        if now >= session.expires_at {
            debug!("Rejected expired session for user: {}", session.user_id);
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    pub async fn revoke(&self, token: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a user's sessions that have expired by `now`
    pub async fn purge_expired(&self, user_id: &str, now: DateTime<Utc>) -> AuthResult<u64> {
        let rows = sqlx::query("SELECT token_hash, expires_at FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut purged = 0;
        for row in rows {
            let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
            if now < expires_at {
                continue;
            }
            let token_hash: String = row.try_get("token_hash")?;
            purged += sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }

        Ok(purged)
    }
}

fn normalize_email(email: &str) -> StorageResult<String> {
    let email = validate_required_text(email, "Email", MAX_EMAIL_LENGTH)?.to_lowercase();
    if !email.contains('@') {
        return Err(ValidationError::Invalid {
            field: "Email".to_string(),
            message: "must be an email address".to_string(),
        }
        .into());
    }
    Ok(email)
}

fn row_to_user(row: &SqliteRow) -> StorageResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: row.try_get("role")?,
        company_id: row.try_get("company_id")?,
        created_at: row.try_get("created_at")?,
    })
}
