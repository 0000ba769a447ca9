//! REST endpoint handlers for the relay.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/config` | Mode flag (`{"group": bool}`) |
//! | `GET` | `/health` | Liveness plus participant count |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chatguessr_types::ModeResponse;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is answering.
    pub status: String,
    /// Number of connected `WebSocket` participants.
    pub participants: usize,
}

/// Report whether clients should run in group mode.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ModeResponse> {
    Json(ModeResponse { group: state.group })
}

/// Report liveness and the current participant count.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
        participants: state.participants(),
    })
}
