//! Dispatch façade: promotes a due scheduled entry into a live message,
//! fans it out, and extends the recurrence chain.

use std::sync::Arc;

use parley_database::{
    CreateMessageRequest, ChatMessage, MessageRepository, ScheduleError, ScheduleResult,
    ScheduleStatus, ScheduledMessage, ScheduledMessageRepository,
};
use parley_realtime::DeliveryHub;
use tracing::{debug, info, warn};

use crate::recurrence;

/// Result of attempting to fire a due entry
#[derive(Debug)]
pub enum FireOutcome {
    /// The entry was claimed and a live message was created and fanned out
    Fired(ChatMessage),
    /// A concurrent actor already claimed or cancelled the entry
    Skipped,
}

pub struct MessageDispatcher {
    schedules: ScheduledMessageRepository,
    messages: MessageRepository,
    hub: Arc<DeliveryHub>,
}

impl MessageDispatcher {
    pub fn new(
        schedules: ScheduledMessageRepository,
        messages: MessageRepository,
        hub: Arc<DeliveryHub>,
    ) -> Self {
        Self {
            schedules,
            messages,
            hub,
        }
    }

    /// Fire one due entry.
    ///
    /// The conditional claim to `sent` happens before any side effect, so
    /// two racing scans (or a racing owner cancel) resolve to exactly one
    /// live message per entry. Everything after the claim is
    /// fire-and-forget from the entry's point of view: a recurrence
    /// failure never rolls back a message that already went out.
    pub async fn fire(&self, entry: &ScheduledMessage) -> ScheduleResult<FireOutcome> {
        let claimed = self
            .schedules
            .claim(entry.id, ScheduleStatus::Pending, ScheduleStatus::Sent)
            .await?;
        if !claimed {
            debug!(
                public_id = %entry.public_id,
                "entry no longer pending, skipping fire"
            );
            return Ok(FireOutcome::Skipped);
        }

        let message = self
            .messages
            .create(
                entry.sender_id,
                &CreateMessageRequest {
                    chat_id: entry.chat_id,
                    content: entry.content.clone(),
                    message_type: Some(entry.message_type.to_string()),
                },
            )
            .await
            .map_err(|e| ScheduleError::Dispatch(format!("message creation failed: {e}")))?;

        self.hub
            .broadcast_new_message(&message)
            .await
            .map_err(|e| ScheduleError::Dispatch(format!("broadcast failed: {e}")))?;

        if entry.is_recurring {
            self.schedule_successor(entry).await;
        }

        info!(
            entry = %entry.public_id,
            message = %message.public_id,
            chat_id = entry.chat_id,
            "scheduled message fired"
        );

        Ok(FireOutcome::Fired(message))
    }

    /// Create the next pending entry of a recurring series. Failures end
    /// the chain; the message that already fired stands.
    async fn schedule_successor(&self, entry: &ScheduledMessage) {
        let Some(pattern) = entry.recurring_pattern else {
            warn!(
                entry = %entry.public_id,
                "recurring entry has no usable pattern, chain ends"
            );
            return;
        };

        let Some(next) = recurrence::next_occurrence(entry.scheduled_time, pattern) else {
            warn!(
                entry = %entry.public_id,
                scheduled_time = %entry.scheduled_time,
                "no representable next occurrence, chain ends"
            );
            return;
        };

        if let Err(error) = self.schedules.insert_successor(entry, next).await {
            warn!(
                entry = %entry.public_id,
                %error,
                "failed to create recurrence successor, chain ends"
            );
        }
    }
}
