//! Axum router construction for the relay.
//!
//! Assembles the channel, the REST endpoints and the optional static
//! site into a single [`Router`] with CORS middleware enabled. Every
//! request must produce its response within [`REQUEST_TIMEOUT`]; for the
//! channel that covers the upgrade handshake, not the open socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use chatguessr_sync::endpoint::{CHANNEL_PATH, CONFIG_PATH};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Deadline for producing a response. Slower requests get `408`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the complete Axum router for the relay.
///
/// The router includes:
/// - `GET /chatguessr` -- `WebSocket` guess channel
/// - `GET /config` -- mode flag
/// - `GET /health` -- liveness and participant count
/// - everything else -- files from [`AppState::static_dir`], falling back
///   to its `index.html`; plain 404 when no directory is configured
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route(CHANNEL_PATH, get(ws::ws_channel))
        .route(CONFIG_PATH, get(handlers::get_config))
        .route(HEALTH_PATH, get(handlers::health));

    let router = match &state.static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    };

    router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
