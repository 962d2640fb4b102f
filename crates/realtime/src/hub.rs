//! Connection registry and fan-out for real-time delivery.
//!
//! The hub owns the only piece of core state touched from many concurrent
//! flows: which identities are connected, over which channels, and which
//! rooms each connection has joined. It is created once at server startup
//! and handed by reference to every handler; nothing here is persisted.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parley_database::{ChatMessage, ChatResult, MemberRepository};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::events::{MessagePayload, ServerEvent};

/// Process-local handle for one live transport connection
pub type ConnectionId = u64;

struct Connection {
    user_id: i64,
    outbound: UnboundedSender<ServerEvent>,
    rooms: HashSet<i64>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    users: HashMap<i64, HashSet<ConnectionId>>,
    rooms: HashMap<i64, HashSet<ConnectionId>>,
}

/// Registry of live connections plus the fan-out operations over them
pub struct DeliveryHub {
    registry: RwLock<Registry>,
    members: MemberRepository,
    next_connection_id: AtomicU64,
}

impl DeliveryHub {
    pub fn new(members: MemberRepository) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            members,
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Add a connection after the identity handshake. A user may hold any
    /// number of concurrent connections.
    pub async fn register(
        &self,
        user_id: i64,
        outbound: UnboundedSender<ServerEvent>,
    ) -> ConnectionId {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        let mut registry = self.registry.write().await;
        registry.connections.insert(
            connection_id,
            Connection {
                user_id,
                outbound,
                rooms: HashSet::new(),
            },
        );
        registry
            .users
            .entry(user_id)
            .or_default()
            .insert(connection_id);

        info!(user_id, connection_id, "connection registered");
        connection_id
    }

    /// Add a connection to a chat room. A connection may belong to many
    /// rooms concurrently.
    pub async fn join_room(&self, connection_id: ConnectionId, chat_id: i64) {
        let mut registry = self.registry.write().await;
        if let Some(connection) = registry.connections.get_mut(&connection_id) {
            connection.rooms.insert(chat_id);
            registry.rooms.entry(chat_id).or_default().insert(connection_id);
            debug!(connection_id, chat_id, "connection joined room");
        }
    }

    /// Remove a connection from every room and from its identity's set.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut registry = self.registry.write().await;
        let Some(connection) = registry.connections.remove(&connection_id) else {
            return;
        };

        for chat_id in &connection.rooms {
            if let Some(room) = registry.rooms.get_mut(chat_id) {
                room.remove(&connection_id);
                if room.is_empty() {
                    registry.rooms.remove(chat_id);
                }
            }
        }

        if let Some(connections) = registry.users.get_mut(&connection.user_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                registry.users.remove(&connection.user_id);
            }
        }

        info!(
            user_id = connection.user_id,
            connection_id, "connection unregistered"
        );
    }

    /// Push a newly created message to every live connection of every chat
    /// member except the sender. Members without a live connection are
    /// skipped; they catch up from the persisted message list.
    ///
    /// Returns the number of connections the event was handed to.
    pub async fn broadcast_new_message(&self, message: &ChatMessage) -> ChatResult<usize> {
        let member_ids = self.members.find_member_ids(message.chat_id).await?;
        let payload = MessagePayload::from(message);

        let registry = self.registry.read().await;
        let mut delivered = 0;

        for member_id in member_ids {
            if member_id == message.sender_id {
                continue;
            }

            let Some(connection_ids) = registry.users.get(&member_id) else {
                continue;
            };

            for connection_id in connection_ids {
                if let Some(connection) = registry.connections.get(connection_id) {
                    let event = ServerEvent::MessageReceived {
                        message: payload.clone(),
                    };
                    if connection.outbound.send(event).is_ok() {
                        delivered += 1;
                    } else {
                        debug!(
                            connection_id,
                            user_id = member_id,
                            "dropping push to closed connection"
                        );
                    }
                }
            }
        }

        debug!(
            chat_id = message.chat_id,
            message_id = %message.public_id,
            delivered,
            "message fanned out"
        );

        Ok(delivered)
    }

    /// Push an ephemeral typing signal to every other connection in the
    /// room. Nothing is persisted, acknowledged, or retried.
    pub async fn broadcast_typing(&self, chat_id: i64, sender_id: i64, is_typing: bool) -> usize {
        let registry = self.registry.read().await;
        let Some(room) = registry.rooms.get(&chat_id) else {
            return 0;
        };

        let mut delivered = 0;
        for connection_id in room {
            let Some(connection) = registry.connections.get(connection_id) else {
                continue;
            };
            if connection.user_id == sender_id {
                continue;
            }

            let event = if is_typing {
                ServerEvent::Typing {
                    chat_id,
                    user_id: sender_id,
                }
            } else {
                ServerEvent::StopTyping {
                    chat_id,
                    user_id: sender_id,
                }
            };

            if connection.outbound.send(event).is_ok() {
                delivered += 1;
            }
        }

        delivered
    }

    /// Number of currently registered connections
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_database::{CreateMessageRequest, MessageRepository};
    use sqlx::SqlitePool;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_hub.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let config = parley_config::DatabaseConfig {
            url: db_url,
            max_connections: 1,
        };

        let pool = parley_database::prepare_database(&config).await.unwrap();
        parley_database::run_migrations(&pool).await.unwrap();

        (pool, temp_dir)
    }

    async fn connect(hub: &DeliveryHub, user_id: i64) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(user_id, tx).await;
        (id, rx)
    }

    async fn persisted_message(pool: &SqlitePool, sender_id: i64, chat_id: i64) -> ChatMessage {
        let messages = MessageRepository::new(pool.clone());
        messages
            .create(
                sender_id,
                &CreateMessageRequest {
                    chat_id,
                    content: "fan-out".to_string(),
                    message_type: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn broadcast_excludes_sender_and_reaches_other_members() {
        let (pool, _temp_dir) = create_test_pool().await;
        let members = MemberRepository::new(pool.clone());
        members.add_member(1, 10).await.unwrap();
        members.add_member(1, 20).await.unwrap();
        members.add_member(1, 30).await.unwrap();

        let hub = DeliveryHub::new(MemberRepository::new(pool.clone()));
        let (_sender_conn, mut sender_rx) = connect(&hub, 10).await;
        let (_recipient_conn, mut recipient_rx) = connect(&hub, 20).await;
        // user 30 is a member but has no live connection

        let message = persisted_message(&pool, 10, 1).await;
        let delivered = hub.broadcast_new_message(&message).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(sender_rx.try_recv().is_err());

        let event = recipient_rx.try_recv().unwrap();
        match event {
            ServerEvent::MessageReceived { message: payload } => {
                assert_eq!(payload.chat_id, 1);
                assert_eq!(payload.sender_id, 10);
                assert_eq!(payload.content, "fan-out");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection_of_a_member() {
        let (pool, _temp_dir) = create_test_pool().await;
        let members = MemberRepository::new(pool.clone());
        members.add_member(1, 10).await.unwrap();
        members.add_member(1, 20).await.unwrap();

        let hub = DeliveryHub::new(MemberRepository::new(pool.clone()));
        let (_c1, mut rx_phone) = connect(&hub, 20).await;
        let (_c2, mut rx_laptop) = connect(&hub, 20).await;

        let message = persisted_message(&pool, 10, 1).await;
        let delivered = hub.broadcast_new_message(&message).await.unwrap();

        assert_eq!(delivered, 2);
        assert!(rx_phone.try_recv().is_ok());
        assert!(rx_laptop.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_skips_non_members() {
        let (pool, _temp_dir) = create_test_pool().await;
        let members = MemberRepository::new(pool.clone());
        members.add_member(1, 10).await.unwrap();
        members.add_member(1, 20).await.unwrap();

        let hub = DeliveryHub::new(MemberRepository::new(pool.clone()));
        let (_outsider_conn, mut outsider_rx) = connect(&hub, 99).await;
        let (_member_conn, mut member_rx) = connect(&hub, 20).await;

        let message = persisted_message(&pool, 10, 1).await;
        hub.broadcast_new_message(&message).await.unwrap();

        assert!(outsider_rx.try_recv().is_err());
        assert!(member_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn typing_stays_within_the_room() {
        let (pool, _temp_dir) = create_test_pool().await;
        let hub = DeliveryHub::new(MemberRepository::new(pool.clone()));

        let (typist_conn, mut typist_rx) = connect(&hub, 10).await;
        let (listener_conn, mut listener_rx) = connect(&hub, 20).await;
        let (_elsewhere_conn, mut elsewhere_rx) = connect(&hub, 30).await;

        hub.join_room(typist_conn, 1).await;
        hub.join_room(listener_conn, 1).await;
        // user 30 never joined room 1

        let delivered = hub.broadcast_typing(1, 10, true).await;
        assert_eq!(delivered, 1);

        assert!(typist_rx.try_recv().is_err());
        assert!(elsewhere_rx.try_recv().is_err());
        assert!(matches!(
            listener_rx.try_recv().unwrap(),
            ServerEvent::Typing { chat_id: 1, user_id: 10 }
        ));

        let delivered = hub.broadcast_typing(1, 10, false).await;
        assert_eq!(delivered, 1);
        assert!(matches!(
            listener_rx.try_recv().unwrap(),
            ServerEvent::StopTyping { chat_id: 1, user_id: 10 }
        ));
    }

    #[tokio::test]
    async fn unregister_cleans_rooms_and_identity() {
        let (pool, _temp_dir) = create_test_pool().await;
        let members = MemberRepository::new(pool.clone());
        members.add_member(1, 10).await.unwrap();
        members.add_member(1, 20).await.unwrap();

        let hub = DeliveryHub::new(MemberRepository::new(pool.clone()));
        let (conn, _rx) = connect(&hub, 20).await;
        hub.join_room(conn, 1).await;

        hub.unregister(conn).await;
        assert_eq!(hub.connection_count().await, 0);

        // No live connections left: fan-out delivers nowhere but succeeds.
        let message = persisted_message(&pool, 10, 1).await;
        assert_eq!(hub.broadcast_new_message(&message).await.unwrap(), 0);
        assert_eq!(hub.broadcast_typing(1, 10, true).await, 0);

        // Unregistering twice is harmless.
        hub.unregister(conn).await;
    }
}
