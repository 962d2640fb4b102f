//! Real-time delivery layer: the connection registry and the wire events
//! pushed over persistent connections.

pub mod events;
pub mod hub;

pub use events::{ClientEvent, MessagePayload, ServerEvent};
pub use hub::{ConnectionId, DeliveryHub};
