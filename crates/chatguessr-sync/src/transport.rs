//! The duplex channel capability the engine talks through.
//!
//! The engine only sees [`TransportEvent`]s and a `send`/`close` pair.
//! Reconnection is entirely the transport's business: a transport that
//! heals itself just emits `Close` followed later by a fresh `Open`.

use std::future::Future;

use tracing::trace;

use crate::error::SyncError;

/// Lifecycle and data events from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The underlying connection is established.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The underlying connection dropped.
    Close,
}

/// A bidirectional text channel.
///
/// Implementations must make [`close`](Transport::close) idempotent and
/// safe to call before the channel ever opened.
pub trait Transport {
    /// Queue a text frame for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the transport can no longer
    /// accept frames (for example after it was closed).
    fn send(&mut self, text: String) -> Result<(), SyncError>;

    /// Release the underlying connection and stop reconnecting.
    fn close(&mut self);

    /// Wait for the next event. `None` means the transport has shut down
    /// and will never produce another event.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;
}

/// Transport for single-user mode: discards sends, never produces events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Transport for Detached {
    fn send(&mut self, text: String) -> Result<(), SyncError> {
        trace!(bytes = text.len(), "Detached transport discarding frame");
        Ok(())
    }

    fn close(&mut self) {}

    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send {
        std::future::pending()
    }
}
