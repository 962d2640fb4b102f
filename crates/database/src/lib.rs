//! Persistence layer for the Parley backend: connection management,
//! embedded migrations, entities and repositories.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use entities::{
    ChatMember, ChatMessage, CreateMessageRequest, CreateScheduledMessageRequest, Location,
    RecurringPattern, ScheduleStatus, ScheduledMessage, ScheduledMessageType, Session,
};
pub use migrations::run_migrations;
pub use repos::{
    MemberRepository, MessageRepository, ScheduledMessageRepository, SessionRepository,
};
pub use types::{
    AuthError, AuthResult, ChatError, ChatResult, ScheduleError, ScheduleResult,
};
