//! Data access repositories

pub mod member_repository;
pub mod message_repository;
pub mod scheduled_message_repository;
pub mod session_repository;

pub use member_repository::MemberRepository;
pub use message_repository::MessageRepository;
pub use scheduled_message_repository::ScheduledMessageRepository;
pub use session_repository::SessionRepository;
