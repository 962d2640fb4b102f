//! The scheduler loop: a single long-lived timer whose ticks scan the
//! store for due entries and hand them to the dispatch façade.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_config::SchedulerConfig;
use parley_database::{ScheduleStatus, ScheduledMessageRepository};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::dispatch::{FireOutcome, MessageDispatcher};

pub struct SchedulerLoop {
    schedules: ScheduledMessageRepository,
    dispatcher: MessageDispatcher,
    tick_interval: Duration,
}

impl SchedulerLoop {
    pub fn new(
        schedules: ScheduledMessageRepository,
        dispatcher: MessageDispatcher,
        tick_interval: Duration,
    ) -> Self {
        Self {
            schedules,
            dispatcher,
            tick_interval,
        }
    }

    pub fn from_config(
        schedules: ScheduledMessageRepository,
        dispatcher: MessageDispatcher,
        config: &SchedulerConfig,
    ) -> Self {
        Self::new(
            schedules,
            dispatcher,
            Duration::from_secs(config.tick_interval_seconds),
        )
    }

    /// Run the scan loop until the task is dropped.
    ///
    /// Cycles run strictly sequentially on this task; a tick that falls
    /// due while the previous scan is still processing is delayed, never
    /// run concurrently.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = self.tick_interval.as_secs(), "scheduler loop started");

        loop {
            interval.tick().await;
            self.scan_once(Utc::now()).await;
        }
    }

    /// One scan-and-process cycle. Returns the number of entries fired.
    ///
    /// Entries are processed independently: one failure is logged, the
    /// failing entry is cancelled, and the rest of the batch continues.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> usize {
        let due = match self.schedules.find_due(now).await {
            Ok(due) => due,
            Err(error) => {
                error!(%error, "due-entry scan failed");
                return 0;
            }
        };

        if due.is_empty() {
            return 0;
        }

        debug!(count = due.len(), "processing due entries");

        let mut fired = 0;
        for entry in due {
            match self.dispatcher.fire(&entry).await {
                Ok(FireOutcome::Fired(_)) => fired += 1,
                Ok(FireOutcome::Skipped) => {}
                Err(error) => {
                    error!(
                        entry_id = entry.id,
                        public_id = %entry.public_id,
                        %error,
                        "dispatch failed, cancelling entry"
                    );
                    self.cancel_after_failure(entry.id).await;
                }
            }
        }

        fired
    }

    /// Fail-fast policy: a failed fire is cancelled outright, never
    /// retried. The entry may still hold the dispatch claim (sent) or,
    /// when the claim itself errored, remain pending; release whichever
    /// state it is in.
    async fn cancel_after_failure(&self, entry_id: i64) {
        for expected in [ScheduleStatus::Sent, ScheduleStatus::Pending] {
            match self
                .schedules
                .claim(entry_id, expected, ScheduleStatus::Cancelled)
                .await
            {
                Ok(true) => return,
                Ok(false) => {}
                Err(error) => {
                    error!(entry_id, %error, "failed to cancel entry after dispatch failure");
                    return;
                }
            }
        }
    }
}
