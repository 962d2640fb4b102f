//! Scheduled-message engine: recurrence computation, the dispatch façade
//! that promotes due entries into live messages, and the scan loop that
//! drives it.

pub mod dispatch;
pub mod engine;
pub mod recurrence;

pub use dispatch::{FireOutcome, MessageDispatcher};
pub use engine::SchedulerLoop;
pub use recurrence::next_occurrence;
