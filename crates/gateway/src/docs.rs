//! OpenAPI documentation

use utoipa::OpenApi;

use crate::rest::{health, scheduled_message};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        scheduled_message::create_scheduled_message,
        scheduled_message::list_scheduled_messages,
        scheduled_message::cancel_scheduled_message,
    ),
    components(schemas(
        health::HealthResponse,
        scheduled_message::CreateScheduledMessageBody,
        scheduled_message::LocationBody,
        scheduled_message::ScheduledMessageResponse,
        scheduled_message::ErrorResponse,
    )),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Scheduled messages", description = "Schedule, list and cancel future messages")
    )
)]
pub struct ApiDoc;
