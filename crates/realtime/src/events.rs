//! Wire events exchanged over the chat WebSocket

use parley_database::ChatMessage;
use serde::{Deserialize, Serialize};

/// Client events received from WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat to keep connection alive
    Ping,
    /// Identity handshake; registers the connection for delivery
    Setup,
    /// Join a chat room
    JoinChat { chat_id: i64 },
    /// Started typing in a chat
    Typing { chat_id: i64 },
    /// Stopped typing in a chat
    StopTyping { chat_id: i64 },
}

/// Server events sent to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges a successful setup
    Connected { user_id: i64 },
    /// Heartbeat response
    Pong,
    /// Room join confirmation
    Joined { chat_id: i64 },
    /// Another member started typing
    Typing { chat_id: i64, user_id: i64 },
    /// Another member stopped typing
    StopTyping { chat_id: i64, user_id: i64 },
    /// A new message was delivered to one of the caller's chats
    MessageReceived { message: MessagePayload },
    /// Error response
    Error { error: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub message_type: String,
    pub created_at: String,
}

impl From<&ChatMessage> for MessagePayload {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.public_id.clone(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            message_type: message.message_type.clone(),
            created_at: message.created_at.clone(),
        }
    }
}
