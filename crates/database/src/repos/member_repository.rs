//! Repository for chat membership lookups.

use crate::entities::ChatMember;
use crate::types::{ChatError, ChatResult};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for member database operations
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Create a new member repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// User ids of every member of a chat
    pub async fn find_member_ids(&self, chat_id: i64) -> ChatResult<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT user_id FROM chat_members WHERE chat_id = ? ORDER BY joined_at ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                row.try_get("user_id")
                    .map_err(|e| ChatError::DatabaseError(e.to_string()))
            })
            .collect()
    }

    /// Whether a user belongs to a chat
    pub async fn is_member(&self, chat_id: i64, user_id: i64) -> ChatResult<bool> {
        let row = sqlx::query("SELECT id FROM chat_members WHERE chat_id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Add a user to a chat. Membership CRUD belongs to an external
    /// collaborator; this insert exists for bootstrap and tests.
    pub async fn add_member(&self, chat_id: i64, user_id: i64) -> ChatResult<ChatMember> {
        let joined_at = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO chat_members (chat_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(&joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        info!(chat_id = chat_id, user_id = user_id, "member added to chat");

        Ok(ChatMember {
            id: result.last_insert_rowid(),
            chat_id,
            user_id,
            joined_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_members.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let config = parley_config::DatabaseConfig {
            url: db_url,
            max_connections: 1,
        };

        let pool = crate::connection::prepare_database(&config).await.unwrap();
        crate::migrations::run_migrations(&pool).await.unwrap();

        (pool, temp_dir)
    }

    #[tokio::test]
    async fn test_membership_lookup() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = MemberRepository::new(pool);

        repo.add_member(1, 10).await.unwrap();
        repo.add_member(1, 20).await.unwrap();
        repo.add_member(2, 30).await.unwrap();

        let members = repo.find_member_ids(1).await.unwrap();
        assert_eq!(members, vec![10, 20]);

        assert!(repo.is_member(1, 10).await.unwrap());
        assert!(!repo.is_member(1, 30).await.unwrap());
        assert!(repo.find_member_ids(42).await.unwrap().is_empty());
    }
}
