//! Repository for live-message data access operations.

use crate::entities::{ChatMessage, CreateMessageRequest};
use crate::types::{ChatError, ChatResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for message database operations
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new message to a chat
    pub async fn create(
        &self,
        sender_id: i64,
        request: &CreateMessageRequest,
    ) -> ChatResult<ChatMessage> {
        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();
        let message_type = request.message_type.as_deref().unwrap_or("text");

        let result = sqlx::query(
            "INSERT INTO messages (public_id, chat_id, sender_id, content, message_type, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(request.chat_id)
        .bind(sender_id)
        .bind(&request.content)
        .bind(message_type)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let message_id = result.last_insert_rowid();

        info!(
            message_id = message_id,
            public_id = %public_id,
            chat_id = request.chat_id,
            sender_id = sender_id,
            "created new message"
        );

        Ok(ChatMessage {
            id: message_id,
            public_id,
            chat_id: request.chat_id,
            sender_id,
            content: request.content.clone(),
            message_type: message_type.to_string(),
            created_at: now,
        })
    }

    /// Messages for a chat in insertion order, newest last
    pub async fn find_by_chat_id(&self, chat_id: i64) -> ChatResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, public_id, chat_id, sender_id, content, message_type, created_at \
             FROM messages WHERE chat_id = ? ORDER BY id ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_message_row).collect()
    }

    /// Find a message by its public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> ChatResult<Option<ChatMessage>> {
        let row = sqlx::query(
            "SELECT id, public_id, chat_id, sender_id, content, message_type, created_at \
             FROM messages WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        row.as_ref().map(map_message_row).transpose()
    }

    /// Count messages for a chat
    pub async fn count_for_chat(&self, chat_id: i64) -> ChatResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM messages WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        row.try_get("count")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))
    }
}

fn map_message_row(row: &SqliteRow) -> ChatResult<ChatMessage> {
    Ok(ChatMessage {
        id: row
            .try_get("id")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        public_id: row
            .try_get("public_id")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        chat_id: row
            .try_get("chat_id")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        sender_id: row
            .try_get("sender_id")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        content: row
            .try_get("content")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        message_type: row
            .try_get("message_type")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?,
    })
}
