//! Scheduled message REST endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json, Router,
};
use chrono::{DateTime, Utc};
use parley_database::{
    CreateScheduledMessageRequest, Location, RecurringPattern, ScheduledMessage,
    ScheduledMessageType,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::authenticate;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScheduledMessageBody {
    pub content: String,
    pub chat_id: i64,
    /// RFC-3339 timestamp, strictly in the future
    pub scheduled_time: String,
    pub message_type: Option<String>,
    pub location: Option<LocationBody>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

impl From<LocationBody> for Location {
    fn from(body: LocationBody) -> Self {
        Self {
            latitude: body.latitude,
            longitude: body.longitude,
            address: body.address,
        }
    }
}

impl From<Location> for LocationBody {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            address: location.address,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduledMessageResponse {
    pub id: String,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub scheduled_time: String,
    pub message_type: String,
    pub location: Option<LocationBody>,
    pub status: String,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub created_at: String,
}

impl From<ScheduledMessage> for ScheduledMessageResponse {
    fn from(entry: ScheduledMessage) -> Self {
        Self {
            id: entry.public_id,
            chat_id: entry.chat_id,
            sender_id: entry.sender_id,
            content: entry.content,
            scheduled_time: entry.scheduled_time.to_rfc3339(),
            message_type: entry.message_type.to_string(),
            location: entry.location.map(LocationBody::from),
            status: entry.status.to_string(),
            is_recurring: entry.is_recurring,
            recurring_pattern: entry.recurring_pattern.map(|p| p.to_string()),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Create scheduled message routes
pub fn create_scheduled_message_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route(
            "/scheduled-message",
            axum::routing::post(create_scheduled_message),
        )
        .route(
            "/scheduled-message/:chat_id",
            axum::routing::get(list_scheduled_messages),
        )
        .route(
            "/scheduled-message/cancel/:entry_id",
            axum::routing::delete(cancel_scheduled_message),
        )
}

#[utoipa::path(
    post,
    path = "/api/scheduled-message",
    tag = "Scheduled messages",
    request_body = CreateScheduledMessageBody,
    responses(
        (status = 201, description = "Scheduled message created", body = ScheduledMessageResponse),
        (status = 400, description = "Invalid schedule, pattern, or payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a member of the chat", body = ErrorResponse)
    )
)]
pub async fn create_scheduled_message(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateScheduledMessageBody>,
) -> GatewayResult<impl IntoResponse> {
    let user_id = authenticate(&state, &headers).await?;

    if !state.members.is_member(payload.chat_id, user_id).await? {
        return Err(GatewayError::AuthorizationFailed(
            "not a member of this chat".to_string(),
        ));
    }

    let scheduled_time = DateTime::parse_from_rfc3339(&payload.scheduled_time)
        .map_err(|e| GatewayError::InvalidRequest(format!("malformed scheduled_time: {e}")))?
        .with_timezone(&Utc);

    let recurring_pattern = payload
        .recurring_pattern
        .as_deref()
        .map(|text| {
            RecurringPattern::parse(text).ok_or_else(|| {
                GatewayError::InvalidRequest(format!("unsupported recurrence pattern: {text}"))
            })
        })
        .transpose()?;

    let request = CreateScheduledMessageRequest {
        chat_id: payload.chat_id,
        sender_id: user_id,
        content: payload.content,
        scheduled_time,
        message_type: payload
            .message_type
            .as_deref()
            .map(ScheduledMessageType::from)
            .unwrap_or(ScheduledMessageType::Text),
        location: payload.location.map(Location::from),
        is_recurring: payload.is_recurring,
        recurring_pattern,
    };

    let entry = state.schedules.create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduledMessageResponse::from(entry)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/scheduled-message/{chat_id}",
    tag = "Scheduled messages",
    params(("chat_id" = i64, Path, description = "Chat ID")),
    responses(
        (status = 200, description = "Pending entries, soonest first", body = Vec<ScheduledMessageResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a member of the chat", body = ErrorResponse)
    )
)]
pub async fn list_scheduled_messages(
    Path(chat_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<ScheduledMessageResponse>>> {
    let user_id = authenticate(&state, &headers).await?;

    if !state.members.is_member(chat_id, user_id).await? {
        return Err(GatewayError::AuthorizationFailed(
            "not a member of this chat".to_string(),
        ));
    }

    let entries = state.schedules.list_pending(chat_id).await?;
    let responses = entries
        .into_iter()
        .map(ScheduledMessageResponse::from)
        .collect();

    Ok(Json(responses))
}

#[utoipa::path(
    delete,
    path = "/api/scheduled-message/cancel/{entry_id}",
    tag = "Scheduled messages",
    params(("entry_id" = String, Path, description = "Scheduled message public ID")),
    responses(
        (status = 200, description = "Entry cancelled", body = ScheduledMessageResponse),
        (status = 400, description = "Entry is no longer pending", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller did not create the entry", body = ErrorResponse),
        (status = 404, description = "Unknown entry", body = ErrorResponse)
    )
)]
pub async fn cancel_scheduled_message(
    Path(entry_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> GatewayResult<Json<ScheduledMessageResponse>> {
    let user_id = authenticate(&state, &headers).await?;

    let cancelled = state.schedules.cancel(&entry_id, user_id).await?;
    Ok(Json(ScheduledMessageResponse::from(cancelled)))
}
