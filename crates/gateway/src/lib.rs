//! HTTP and WebSocket gateway for the Parley backend.

pub mod docs;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

/// Build the complete application router
pub fn create_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .nest("/api", rest::create_rest_routes())
        .merge(websocket::create_websocket_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
}
