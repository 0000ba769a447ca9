//! Self-healing WebSocket client.
//!
//! [`ReconnectingSocket`] owns one background task that keeps a
//! connection to a fixed URL alive. Each successful connect emits
//! [`TransportEvent::Open`]; each drop emits [`TransportEvent::Close`]
//! and schedules a reconnect after [`ReconnectPolicy::delay`]. Outbound
//! frames queue while disconnected and flush once the next connection
//! opens.
//!
//! # Shutdown
//!
//! [`Transport::close`] flips a watch flag. The task sends a close frame
//! if connected, stops retrying, and drops its event sender, after which
//! [`Transport::next_event`] yields `None`.

use std::future::Future;
use std::time::Duration;

use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::transport::{Transport, TransportEvent};

/// Backoff between reconnect attempts.
///
/// The delay for attempt `n` (zero-based) is
/// `min_delay * growth^n`, capped at `max_delay`. The attempt counter
/// resets after every successful connect.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive failure.
    pub growth: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            growth: 1.3,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that always waits exactly `delay`.
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min_delay: delay,
            max_delay: delay,
            growth: 1.0,
        }
    }

    /// Delay before reconnect attempt `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.min_delay.as_secs_f64() * self.growth.powi(exponent);
        let max = self.max_delay.as_secs_f64();
        if secs.is_finite() && (0.0..max).contains(&secs) {
            Duration::from_secs_f64(secs)
        } else {
            self.max_delay
        }
    }
}

/// A [`Transport`] over a WebSocket that reconnects on its own.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct ReconnectingSocket {
    url: String,
    outbound: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReconnectingSocket {
    /// Start connecting to `url` in the background.
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let url = url.into();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(connection_loop(
            url.clone(),
            policy,
            outbound_rx,
            events_tx,
            shutdown_rx,
        ));

        Self {
            url,
            outbound: outbound_tx,
            events: events_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    /// The URL this socket connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the socket and wait for its background task to finish.
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(url = %self.url, error = %e, "Socket task ended abnormally");
            }
        }
    }
}

impl Transport for ReconnectingSocket {
    fn send(&mut self, text: String) -> Result<(), SyncError> {
        self.outbound
            .send(text)
            .map_err(|e| SyncError::Transport(format!("socket task has stopped: {e}")))
    }

    fn close(&mut self) {
        self.shutdown.send_replace(true);
    }

    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send {
        self.events.recv()
    }
}

impl Drop for ReconnectingSocket {
    fn drop(&mut self) {
        self.close();
    }
}

/// How a single connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    /// The peer or network dropped it; reconnect.
    Dropped,
    /// The socket was closed locally; stop.
    Shutdown,
}

async fn connection_loop(
    url: String,
    policy: ReconnectPolicy,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let connected = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = shutdown.changed() => break,
        };

        match connected {
            Ok((stream, _response)) => {
                attempt = 0;
                info!(url = %url, "Socket connected");
                if events.send(TransportEvent::Open).is_err() {
                    break;
                }
                let end = pump(stream, &mut outbound, &events, &mut shutdown).await;
                // The receiver may already be gone during shutdown.
                let _ = events.send(TransportEvent::Close);
                if end == ConnectionEnd::Shutdown {
                    break;
                }
                info!(url = %url, "Socket dropped, reconnecting");
            }
            Err(e) => {
                warn!(url = %url, attempt, error = %e, "Socket connect failed");
            }
        }

        let delay = policy.delay(attempt);
        attempt = attempt.saturating_add(1);
        debug!(url = %url, delay_ms = delay.as_millis(), "Waiting before reconnect");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    debug!(url = %url, "Socket task stopped");
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> ConnectionEnd {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = source.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let event = TransportEvent::Message(text.as_str().to_owned());
                        if events.send(event).is_err() {
                            let _ = sink.close().await;
                            return ConnectionEnd::Shutdown;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return ConnectionEnd::Dropped,
                    Some(Err(e)) => {
                        debug!(error = %e, "Socket read failed");
                        return ConnectionEnd::Dropped;
                    }
                    Some(Ok(_)) => {
                        // Pings are answered by tungstenite; binary frames are not part of the protocol.
                    }
                }
            }
            queued = outbound.recv() => {
                match queued {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::text(text)).await {
                            debug!(error = %e, "Socket write failed");
                            return ConnectionEnd::Dropped;
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        return ConnectionEnd::Shutdown;
                    }
                }
            }
            _ = shutdown.changed() => {
                let _ = sink.close().await;
                return ConnectionEnd::Shutdown;
            }
        }
    }
}
