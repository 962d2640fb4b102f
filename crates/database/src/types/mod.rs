//! Shared types for the database layer

pub mod errors;

pub use errors::{AuthError, ChatError, ScheduleError};

/// Result type alias for scheduled-message operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Result type alias for message and membership operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Result type alias for session operations
pub type AuthResult<T> = Result<T, AuthError>;
