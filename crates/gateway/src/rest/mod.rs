//! REST endpoints for the gateway

pub mod health;
pub mod scheduled_message;

use axum::Router;
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all REST routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .merge(health::create_health_routes())
        .merge(scheduled_message::create_scheduled_message_routes())
}
