//! Chat WebSocket handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use parley_realtime::{ClientEvent, ConnectionId, ServerEvent};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use crate::error::GatewayResult;
use crate::middleware::authenticate_token;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// Chat WebSocket connection handler
pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WebSocketQuery>,
) -> GatewayResult<Response> {
    let user_id = authenticate_token(&state, query.token).await?;
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, user_id)))
}

async fn handle_chat_socket(socket: WebSocket, state: Arc<GatewayState>, user_id: i64) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Every server event for this socket funnels through one channel; the
    // hub pushes into the same channel once the connection is registered.
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let forward_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to serialize server event");
                }
            }
        }
    });

    let mut connection: Option<ConnectionId> = None;

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_client_event(event, &state, user_id, &mut connection, &outbound).await;
                }
                Err(error) => {
                    debug!(user_id, %error, "unparseable client event");
                    let _ = outbound.send(ServerEvent::Error {
                        error: "BAD_EVENT".to_string(),
                        message: "could not parse event".to_string(),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(connection_id) = connection {
        state.hub.unregister(connection_id).await;
    }
    forward_task.abort();
}

async fn handle_client_event(
    event: ClientEvent,
    state: &Arc<GatewayState>,
    user_id: i64,
    connection: &mut Option<ConnectionId>,
    outbound: &UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::Ping => {
            let _ = outbound.send(ServerEvent::Pong);
        }
        ClientEvent::Setup => {
            if connection.is_none() {
                let connection_id = state.hub.register(user_id, outbound.clone()).await;
                *connection = Some(connection_id);
            }
            let _ = outbound.send(ServerEvent::Connected { user_id });
        }
        ClientEvent::JoinChat { chat_id } => {
            let Some(connection_id) = *connection else {
                let _ = outbound.send(not_setup_error());
                return;
            };

            match state.members.is_member(chat_id, user_id).await {
                Ok(true) => {
                    state.hub.join_room(connection_id, chat_id).await;
                    let _ = outbound.send(ServerEvent::Joined { chat_id });
                }
                Ok(false) => {
                    let _ = outbound.send(ServerEvent::Error {
                        error: "ACCESS_DENIED".to_string(),
                        message: "you are not a member of this chat".to_string(),
                    });
                }
                Err(error) => {
                    warn!(user_id, chat_id, %error, "membership lookup failed");
                    let _ = outbound.send(ServerEvent::Error {
                        error: "INTERNAL".to_string(),
                        message: "membership lookup failed".to_string(),
                    });
                }
            }
        }
        ClientEvent::Typing { chat_id } => {
            forward_typing(state, user_id, connection, outbound, chat_id, true).await;
        }
        ClientEvent::StopTyping { chat_id } => {
            forward_typing(state, user_id, connection, outbound, chat_id, false).await;
        }
    }
}

/// Typing signals are advisory: forwarded to the room, never persisted,
/// never acknowledged.
async fn forward_typing(
    state: &Arc<GatewayState>,
    user_id: i64,
    connection: &Option<ConnectionId>,
    outbound: &UnboundedSender<ServerEvent>,
    chat_id: i64,
    is_typing: bool,
) {
    if connection.is_none() {
        let _ = outbound.send(not_setup_error());
        return;
    }

    match state.members.is_member(chat_id, user_id).await {
        Ok(true) => {
            state.hub.broadcast_typing(chat_id, user_id, is_typing).await;
        }
        Ok(false) => {
            let _ = outbound.send(ServerEvent::Error {
                error: "ACCESS_DENIED".to_string(),
                message: "you are not a member of this chat".to_string(),
            });
        }
        Err(error) => {
            debug!(user_id, chat_id, %error, "membership lookup failed, dropping typing signal");
        }
    }
}

fn not_setup_error() -> ServerEvent {
    ServerEvent::Error {
        error: "NOT_SETUP".to_string(),
        message: "send setup before other events".to_string(),
    }
}
