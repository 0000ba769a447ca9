//! `WebSocket` handler for the guess channel.
//!
//! Clients connect to `GET /chatguessr`. Each connection is assigned a
//! fresh [`ClientIdent`]; the hub announces `connect` for it, relays its
//! guesses tagged with that identity and op `message`, and announces
//! `disconnect` when it goes away. A connection never receives guesses
//! carrying its own identity.
//!
//! If a client falls behind, lagged messages are silently skipped and
//! the client resumes from the most recent guess.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chatguessr_types::{ClientIdent, WireGuess};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and join the
/// guess channel.
///
/// # Route
///
/// `GET /chatguessr`
pub async fn ws_channel(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle one participant from upgrade to disconnect.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let ident = ClientIdent::generate();

    // Subscribe before announcing so nothing published after the join is missed.
    let rx = state.subscribe();
    let participants = state.join();
    info!(%ident, participants, "Participant connected");
    state.broadcast(WireGuess::connect(&ident));

    relay(socket, &state, &ident, rx).await;

    let participants = state.leave();
    state.broadcast(WireGuess::disconnect(&ident));
    info!(%ident, participants, "Participant disconnected");
}

/// Pump guesses both ways until the client goes away.
async fn relay(
    mut socket: WebSocket,
    state: &AppState,
    ident: &ClientIdent,
    mut rx: tokio::sync::broadcast::Receiver<WireGuess>,
) {
    loop {
        tokio::select! {
            // A guess from another participant (or the bot feed).
            result = rx.recv() => {
                match result {
                    Ok(guess) => {
                        if guess.is_from(ident) {
                            continue;
                        }
                        let json = match guess.to_json() {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize guess: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!(%ident, "WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(%ident, skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // A frame from this participant.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match WireGuess::from_json(text.as_str()) {
                        Ok(guess) => {
                            state.broadcast(guess.relayed_from(ident));
                        }
                        Err(e) => {
                            debug!(%ident, error = %e, "Dropping malformed guess");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%ident, "WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%ident, "WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%ident, "WebSocket error: {e}");
                        return;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames are not part of the protocol.
                    }
                }
            }
        }
    }
}
