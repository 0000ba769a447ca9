//! Upstream bot feed.
//!
//! When `bot_ws_url` is configured the relay keeps a client connection
//! to it. Every frame is expected to be a bare `{"lat": .., "lng": ..}`
//! object; each one is re-broadcast to all participants as a bot guess
//! (ident `bot`, op `bot`, distance 0), which clients apply to their
//! counterpart.

use std::sync::Arc;
use std::time::Duration;

use chatguessr_geo::Point;
use chatguessr_sync::socket::{ReconnectPolicy, ReconnectingSocket};
use chatguessr_sync::transport::{Transport as _, TransportEvent};
use chatguessr_types::WireGuess;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Delay between reconnect attempts to the upstream feed.
pub const BOT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Spawn the bot feed on a background Tokio task.
///
/// The task runs until it is aborted. Connection failures are logged and
/// retried every [`BOT_RECONNECT_DELAY`].
pub fn spawn_bot_feed(url: &str, state: Arc<AppState>) -> JoinHandle<()> {
    let mut socket = ReconnectingSocket::connect(url, ReconnectPolicy::fixed(BOT_RECONNECT_DELAY));
    info!(url, "Bot feed spawned");

    tokio::spawn(async move {
        while let Some(event) = socket.next_event().await {
            match event {
                TransportEvent::Open => info!(url = socket.url(), "Bot feed connected"),
                TransportEvent::Close => warn!(url = socket.url(), "Bot feed dropped"),
                TransportEvent::Message(text) => {
                    if let Some(guess) = bot_guess(&text) {
                        let receivers = state.broadcast(guess);
                        debug!(receivers, "Bot location relayed");
                    }
                }
            }
        }
    })
}

/// Decode one upstream frame into the guess to broadcast.
///
/// Returns `None` (after logging) for frames that are not a valid
/// location.
pub fn bot_guess(text: &str) -> Option<WireGuess> {
    match serde_json::from_str::<Point>(text) {
        Ok(point) if point.is_valid() => Some(WireGuess::bot(point)),
        Ok(point) => {
            warn!(%point, "Bot location out of range, skipping");
            None
        }
        Err(e) => {
            warn!(error = %e, "Cannot decode bot frame, skipping");
            None
        }
    }
}
