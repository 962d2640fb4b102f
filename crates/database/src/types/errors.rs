//! Error types for the database layer

use thiserror::Error;

/// Errors raised by the scheduled-message store
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Location payload is required for location messages")]
    MissingLocation,

    #[error("Message content must not be empty")]
    EmptyContent,

    #[error("Entry is not pending")]
    InvalidState,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Scheduled message not found")]
    NotFound,

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Errors raised by the live-message and membership stores
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message not found")]
    MessageNotFound,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Errors raised by the session store
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
