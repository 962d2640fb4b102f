//! Scheduled message entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted request to emit a chat message at a future time, once or repeatedly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMessage {
    pub id: i64,
    pub public_id: String,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub scheduled_time: DateTime<Utc>,
    pub message_type: ScheduledMessageType,
    pub location: Option<Location>,
    pub status: ScheduleStatus,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurringPattern>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledMessageRequest {
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub scheduled_time: DateTime<Utc>,
    pub message_type: ScheduledMessageType,
    pub location: Option<Location>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurringPattern>,
}

/// Geographic payload carried by location messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Sent,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Sent => "sent",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal entries never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScheduleStatus::Pending)
    }
}

impl From<&str> for ScheduleStatus {
    fn from(s: &str) -> Self {
        match s {
            "sent" => ScheduleStatus::Sent,
            "cancelled" => ScheduleStatus::Cancelled,
            _ => ScheduleStatus::Pending,
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledMessageType {
    Text,
    Location,
}

impl ScheduledMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduledMessageType::Text => "text",
            ScheduledMessageType::Location => "location",
        }
    }
}

impl From<&str> for ScheduledMessageType {
    fn from(s: &str) -> Self {
        match s {
            "location" => ScheduledMessageType::Location,
            _ => ScheduledMessageType::Text,
        }
    }
}

impl std::fmt::Display for ScheduledMessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringPattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurringPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringPattern::Daily => "daily",
            RecurringPattern::Weekly => "weekly",
            RecurringPattern::Monthly => "monthly",
        }
    }

    /// Parse a stored pattern. Unknown text yields `None`; callers treat
    /// that as "do not reschedule".
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(RecurringPattern::Daily),
            "weekly" => Some(RecurringPattern::Weekly),
            "monthly" => Some(RecurringPattern::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecurringPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ScheduleStatus::Pending,
            ScheduleStatus::Sent,
            ScheduleStatus::Cancelled,
        ] {
            assert_eq!(ScheduleStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ScheduleStatus::Pending.is_terminal());
        assert!(ScheduleStatus::Sent.is_terminal());
        assert!(ScheduleStatus::Cancelled.is_terminal());
    }

    #[test]
    fn pattern_parse_rejects_unknown_text() {
        assert_eq!(RecurringPattern::parse("daily"), Some(RecurringPattern::Daily));
        assert_eq!(RecurringPattern::parse("weekly"), Some(RecurringPattern::Weekly));
        assert_eq!(RecurringPattern::parse("monthly"), Some(RecurringPattern::Monthly));
        assert_eq!(RecurringPattern::parse("yearly"), None);
        assert_eq!(RecurringPattern::parse(""), None);
    }
}
