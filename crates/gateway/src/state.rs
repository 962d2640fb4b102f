//! Shared application state for the gateway

use std::sync::Arc;

use parley_realtime::DeliveryHub;
use parley_database::{
    MemberRepository, ScheduledMessageRepository, SessionRepository,
};
use sqlx::SqlitePool;

/// Shared application state containing repositories and the delivery hub.
///
/// Built once at startup and handed to every handler; there is no hidden
/// process-wide mutable state outside it.
pub struct GatewayState {
    pub pool: SqlitePool,
    pub schedules: ScheduledMessageRepository,
    pub members: MemberRepository,
    pub sessions: SessionRepository,
    pub hub: Arc<DeliveryHub>,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, hub: Arc<DeliveryHub>) -> Self {
        Self {
            schedules: ScheduledMessageRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            hub,
            pool,
        }
    }
}
