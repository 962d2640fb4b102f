//! Live message entity definitions

use serde::{Deserialize, Serialize};

/// A message persisted to a chat. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub public_id: String,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub message_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub chat_id: i64,
    pub content: String,
    pub message_type: Option<String>,
}
