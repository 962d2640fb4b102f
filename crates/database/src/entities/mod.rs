//! Entity definitions for the database layer

pub mod member;
pub mod message;
pub mod scheduled_message;
pub mod session;

pub use member::ChatMember;
pub use message::{ChatMessage, CreateMessageRequest};
pub use scheduled_message::{
    CreateScheduledMessageRequest, Location, RecurringPattern, ScheduleStatus, ScheduledMessage,
    ScheduledMessageType,
};
pub use session::Session;
