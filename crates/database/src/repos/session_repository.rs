//! Repository for bearer-session validation.
//!
//! Session issuance lives in the auth collaborator; this layer resolves a
//! presented token to an authenticated user id.

use crate::entities::Session;
use crate::types::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer token to the session's user id.
    pub async fn validate(&self, token: &str) -> AuthResult<i64> {
        let row = sqlx::query(
            "SELECT id, token, user_id, expires_at, created_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let row = row.ok_or(AuthError::SessionNotFound)?;

        let expires_str: String = row
            .try_get("expires_at")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let expires_at = DateTime::parse_from_rfc3339(&expires_str)
            .map_err(|e| AuthError::DatabaseError(format!("invalid expires_at: {e}")))?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        row.try_get("user_id")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    /// Store a session row. Exists for bootstrap and tests; real issuance
    /// belongs to the auth collaborator.
    pub async fn insert(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<Session> {
        let created_at = Utc::now().to_rfc3339();
        let expires = expires_at.to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(&expires)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(Session {
            id: result.last_insert_rowid(),
            token: token.to_string(),
            user_id,
            expires_at: expires,
            created_at,
        })
    }
}
