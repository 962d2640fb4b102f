//! Full-stack flow: schedule over HTTP, fire through the scheduler loop,
//! observe delivery and terminal state.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    },
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use parley_database::{
    MemberRepository, MessageRepository, ScheduledMessageRepository, SessionRepository,
};
use parley_gateway::{create_router, GatewayState};
use parley_realtime::{DeliveryHub, ServerEvent};
use parley_scheduler::{MessageDispatcher, SchedulerLoop};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

const SENDER_TOKEN: &str = "sender-token";
const SENDER: i64 = 1;
const RECIPIENT: i64 = 2;
const CHAT: i64 = 7;

struct TestApp {
    router: Router,
    pool: SqlitePool,
    hub: Arc<DeliveryHub>,
    scheduler: SchedulerLoop,
    _db_dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("parley-test.db");
        let config = parley_config::DatabaseConfig {
            url: format!("sqlite://{}", db_path.to_string_lossy()),
            max_connections: 5,
        };

        let pool = parley_database::prepare_database(&config)
            .await
            .expect("prepare database");
        parley_database::run_migrations(&pool)
            .await
            .expect("run migrations");

        let members = MemberRepository::new(pool.clone());
        members.add_member(CHAT, SENDER).await.expect("seed sender");
        members
            .add_member(CHAT, RECIPIENT)
            .await
            .expect("seed recipient");

        SessionRepository::new(pool.clone())
            .insert(SENDER_TOKEN, SENDER, Utc::now() + Duration::hours(1))
            .await
            .expect("seed session");

        let hub = Arc::new(DeliveryHub::new(MemberRepository::new(pool.clone())));

        let dispatcher = MessageDispatcher::new(
            ScheduledMessageRepository::new(pool.clone()),
            MessageRepository::new(pool.clone()),
            hub.clone(),
        );
        let scheduler = SchedulerLoop::new(
            ScheduledMessageRepository::new(pool.clone()),
            dispatcher,
            StdDuration::from_secs(60),
        );

        let state = Arc::new(GatewayState::new(pool.clone(), hub.clone()));
        let router = create_router(state);

        Self {
            router,
            pool,
            hub,
            scheduler,
            _db_dir: db_dir,
        }
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn scheduled_message_flows_from_request_to_delivery() {
    let app = TestApp::new().await;

    let (recipient_tx, mut recipient_rx) = tokio::sync::mpsc::unbounded_channel();
    app.hub.register(RECIPIENT, recipient_tx).await;

    let body = json!({
        "content": "release meeting in 5",
        "chat_id": CHAT,
        "scheduled_time": (Utc::now() + Duration::seconds(60)).to_rfc3339(),
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/scheduled-message")
        .header(AUTHORIZATION, format!("Bearer {SENDER_TOKEN}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, created) = app.request(request).await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = created["id"].as_str().unwrap().to_string();

    // The pending entry is visible to chat members.
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/scheduled-message/{CHAT}"))
        .header(AUTHORIZATION, format!("Bearer {SENDER_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, listed) = app.request(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Simulated tick past the due time promotes it to a live message.
    let fired = app.scheduler.scan_once(Utc::now() + Duration::seconds(61)).await;
    assert_eq!(fired, 1);

    let event = recipient_rx.try_recv().expect("recipient should get a push");
    match event {
        ServerEvent::MessageReceived { message } => {
            assert_eq!(message.chat_id, CHAT);
            assert_eq!(message.sender_id, SENDER);
            assert_eq!(message.content, "release meeting in 5");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let messages = MessageRepository::new(app.pool.clone());
    assert_eq!(messages.count_for_chat(CHAT).await.unwrap(), 1);

    let schedules = ScheduledMessageRepository::new(app.pool.clone());
    let entry = schedules
        .find_by_public_id(&entry_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status.to_string(), "sent");
    assert!(schedules.list_pending(CHAT).await.unwrap().is_empty());
}
