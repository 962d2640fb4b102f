//! Repository for scheduled-message data access operations.

use crate::entities::{
    CreateScheduledMessageRequest, RecurringPattern, ScheduleStatus, ScheduledMessage,
    ScheduledMessageType,
};
use crate::types::{ScheduleError, ScheduleResult};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

const ENTRY_COLUMNS: &str = "id, public_id, chat_id, sender_id, content, scheduled_time, \
     message_type, location, status, is_recurring, recurring_pattern, created_at, updated_at";

/// Repository for scheduled-message database operations
pub struct ScheduledMessageRepository {
    pool: SqlitePool,
}

impl ScheduledMessageRepository {
    /// Create a new scheduled-message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new pending entry from a schedule request.
    ///
    /// Rejects past or non-future times, recurring requests without a
    /// pattern, location messages without a payload, and empty content.
    pub async fn create(
        &self,
        request: &CreateScheduledMessageRequest,
    ) -> ScheduleResult<ScheduledMessage> {
        if request.content.trim().is_empty() {
            return Err(ScheduleError::EmptyContent);
        }

        if request.scheduled_time <= Utc::now() {
            return Err(ScheduleError::InvalidSchedule(
                "scheduled time must be in the future".to_string(),
            ));
        }

        if request.is_recurring && request.recurring_pattern.is_none() {
            return Err(ScheduleError::InvalidPattern(
                "recurring messages require a pattern".to_string(),
            ));
        }

        if request.message_type == ScheduledMessageType::Location && request.location.is_none() {
            return Err(ScheduleError::MissingLocation);
        }

        let entry = self
            .insert(
                request.chat_id,
                request.sender_id,
                &request.content,
                request.scheduled_time,
                request.message_type,
                request.location.as_ref(),
                request.is_recurring,
                request.recurring_pattern,
            )
            .await?;

        info!(
            entry_id = entry.id,
            public_id = %entry.public_id,
            chat_id = entry.chat_id,
            sender_id = entry.sender_id,
            scheduled_time = %entry.scheduled_time,
            is_recurring = entry.is_recurring,
            "scheduled message created"
        );

        Ok(entry)
    }

    /// Insert the successor of a recurring entry that just fired.
    ///
    /// Skips the strictly-future check on purpose: a late-firing entry
    /// schedules its (possibly already-due) successor instead of breaking
    /// the chain.
    pub async fn insert_successor(
        &self,
        entry: &ScheduledMessage,
        next_time: DateTime<Utc>,
    ) -> ScheduleResult<ScheduledMessage> {
        let successor = self
            .insert(
                entry.chat_id,
                entry.sender_id,
                &entry.content,
                next_time,
                entry.message_type,
                entry.location.as_ref(),
                true,
                entry.recurring_pattern,
            )
            .await?;

        info!(
            predecessor = %entry.public_id,
            successor = %successor.public_id,
            scheduled_time = %successor.scheduled_time,
            "recurrence successor created"
        );

        Ok(successor)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert(
        &self,
        chat_id: i64,
        sender_id: i64,
        content: &str,
        scheduled_time: DateTime<Utc>,
        message_type: ScheduledMessageType,
        location: Option<&crate::entities::Location>,
        is_recurring: bool,
        recurring_pattern: Option<RecurringPattern>,
    ) -> ScheduleResult<ScheduledMessage> {
        let public_id = cuid2::cuid();
        let now = Utc::now().to_rfc3339();
        let location_json = location
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO scheduled_messages \
             (public_id, chat_id, sender_id, content, scheduled_time, message_type, location, \
              status, is_recurring, recurring_pattern, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .bind(scheduled_time.to_rfc3339())
        .bind(message_type.as_str())
        .bind(location_json.as_deref())
        .bind(ScheduleStatus::Pending.as_str())
        .bind(is_recurring)
        .bind(recurring_pattern.map(|p| p.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        Ok(ScheduledMessage {
            id: result.last_insert_rowid(),
            public_id,
            chat_id,
            sender_id,
            content: content.to_string(),
            scheduled_time,
            message_type,
            location: location.cloned(),
            status: ScheduleStatus::Pending,
            is_recurring,
            recurring_pattern,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// All pending entries whose scheduled time has passed as of `now`.
    pub async fn find_due(&self, now: DateTime<Utc>) -> ScheduleResult<Vec<ScheduledMessage>> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM scheduled_messages \
             WHERE status = 'pending' AND scheduled_time <= ? \
             ORDER BY scheduled_time ASC"
        );

        let rows = sqlx::query(&query)
            .bind(now.to_rfc3339())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_entry_row).collect()
    }

    /// Pending entries for a chat, soonest first.
    pub async fn list_pending(&self, chat_id: i64) -> ScheduleResult<Vec<ScheduledMessage>> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM scheduled_messages \
             WHERE chat_id = ? AND status = 'pending' \
             ORDER BY scheduled_time ASC"
        );

        let rows = sqlx::query(&query)
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_entry_row).collect()
    }

    /// Find an entry by its public ID
    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> ScheduleResult<Option<ScheduledMessage>> {
        let query =
            format!("SELECT {ENTRY_COLUMNS} FROM scheduled_messages WHERE public_id = ?");

        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        row.as_ref().map(map_entry_row).transpose()
    }

    /// Cancel a pending entry on behalf of its sender.
    pub async fn cancel(
        &self,
        public_id: &str,
        requester_id: i64,
    ) -> ScheduleResult<ScheduledMessage> {
        let entry = self
            .find_by_public_id(public_id)
            .await?
            .ok_or(ScheduleError::NotFound)?;

        if entry.sender_id != requester_id {
            return Err(ScheduleError::Unauthorized);
        }

        if entry.status.is_terminal() {
            return Err(ScheduleError::InvalidState);
        }

        // The scheduler may have claimed the entry between the read above
        // and this update; the conditional write resolves the race.
        let claimed = self
            .claim(entry.id, ScheduleStatus::Pending, ScheduleStatus::Cancelled)
            .await?;
        if !claimed {
            return Err(ScheduleError::InvalidState);
        }

        info!(
            public_id = %entry.public_id,
            cancelled_by = requester_id,
            "scheduled message cancelled"
        );

        self.find_by_public_id(public_id)
            .await?
            .ok_or(ScheduleError::NotFound)
    }

    /// Conditionally move an entry from `expected` to `new` status.
    ///
    /// This is the compare-and-swap primitive the scheduler builds on:
    /// `true` means this caller won the transition, `false` means the entry
    /// was no longer in the expected status.
    pub async fn claim(
        &self,
        id: i64,
        expected: ScheduleStatus,
        new: ScheduleStatus,
    ) -> ScheduleResult<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_messages SET status = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(new.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let claimed = result.rows_affected() > 0;
        debug!(entry_id = id, from = %expected, to = %new, claimed, "status claim");
        Ok(claimed)
    }

    /// Mark a pending entry as sent. A no-op on already-terminal entries.
    pub async fn mark_sent(&self, id: i64) -> ScheduleResult<()> {
        self.claim(id, ScheduleStatus::Pending, ScheduleStatus::Sent)
            .await?;
        Ok(())
    }

    /// Mark a pending entry as cancelled. A no-op on already-terminal entries.
    pub async fn mark_cancelled(&self, id: i64) -> ScheduleResult<()> {
        self.claim(id, ScheduleStatus::Pending, ScheduleStatus::Cancelled)
            .await?;
        Ok(())
    }
}

fn map_entry_row(row: &SqliteRow) -> ScheduleResult<ScheduledMessage> {
    let status_str: String = row
        .try_get("status")
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
    let type_str: String = row
        .try_get("message_type")
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
    let scheduled_str: String = row
        .try_get("scheduled_time")
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
    let location_json: Option<String> = row
        .try_get("location")
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
    let pattern_str: Option<String> = row
        .try_get("recurring_pattern")
        .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

    let scheduled_time = DateTime::parse_from_rfc3339(&scheduled_str)
        .map_err(|e| ScheduleError::DatabaseError(format!("invalid scheduled_time: {e}")))?
        .with_timezone(&Utc);

    let location = location_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| ScheduleError::DatabaseError(format!("invalid location payload: {e}")))?;

    Ok(ScheduledMessage {
        id: row
            .try_get("id")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        public_id: row
            .try_get("public_id")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        chat_id: row
            .try_get("chat_id")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        sender_id: row
            .try_get("sender_id")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        content: row
            .try_get("content")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        scheduled_time,
        message_type: ScheduledMessageType::from(type_str.as_str()),
        location,
        status: ScheduleStatus::from(status_str.as_str()),
        is_recurring: row
            .try_get("is_recurring")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        // Unknown stored text maps to None so the entry is never rescheduled.
        recurring_pattern: pattern_str.as_deref().and_then(RecurringPattern::parse),
        created_at: row
            .try_get("created_at")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?,
    })
}
