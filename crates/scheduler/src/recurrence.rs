//! Recurrence computation for scheduled messages.

use chrono::{DateTime, Duration, Months, Utc};
use parley_database::RecurringPattern;

/// Compute the occurrence following `previous` for a recurrence pattern.
///
/// Daily and weekly advance by whole days at the same wall-clock time.
/// Monthly advances by one calendar month, clamping to the last valid day
/// of the target month (Jan 31 → Feb 28/29, never an overflow into March).
///
/// Returns `None` when the next occurrence is not representable; callers
/// treat that as "do not reschedule".
pub fn next_occurrence(
    previous: DateTime<Utc>,
    pattern: RecurringPattern,
) -> Option<DateTime<Utc>> {
    match pattern {
        RecurringPattern::Daily => previous.checked_add_signed(Duration::days(1)),
        RecurringPattern::Weekly => previous.checked_add_signed(Duration::days(7)),
        RecurringPattern::Monthly => previous.checked_add_months(Months::new(1)),
    }
}
