//! Shared application state for the relay.
//!
//! [`AppState`] holds the broadcast channel every connection publishes
//! to and subscribes from, the configured mode, and a live participant
//! count.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chatguessr_types::WireGuess;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for guesses.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug)]
pub struct AppState {
    tx: broadcast::Sender<WireGuess>,
    participants: AtomicUsize,
    /// Whether clients should run in group mode.
    pub group: bool,
    /// Directory with the static site, if one is served.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    /// Create a new application state with no participants.
    pub fn new(group: bool) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            participants: AtomicUsize::new(0),
            group,
            static_dir: None,
        }
    }

    /// Serve the static site in `dir` for paths no route matches.
    #[must_use]
    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Subscribe to the guess broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<WireGuess> {
        self.tx.subscribe()
    }

    /// Publish a guess to all connected participants.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if nobody is connected (this is not an error).
    pub fn broadcast(&self, guess: WireGuess) -> usize {
        // send returns Err only when there are zero receivers.
        self.tx.send(guess).unwrap_or(0)
    }

    /// Record a new participant and return the updated count.
    pub fn join(&self) -> usize {
        self.participants
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1)
    }

    /// Record a departed participant and return the updated count.
    pub fn leave(&self) -> usize {
        let previous = self
            .participants
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    /// Number of connected participants.
    pub fn participants(&self) -> usize {
        self.participants.load(Ordering::Relaxed)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(true)
    }
}
