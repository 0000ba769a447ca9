//! The guess sync engine.
//!
//! [`GuessSyncEngine`] owns the current [`SyncState`] snapshot and the one
//! transport connection. It is driven from a single task: local actions
//! and transport events are applied in the order they arrive on their
//! respective streams, with arbitrary interleaving between the two.
//!
//! # Change propagation
//!
//! - Every transition that yields a different state replaces the snapshot
//!   and publishes it on a [`watch`] channel (see
//!   [`GuessSyncEngine::subscribe`]).
//! - Whenever the self guess differs from the previous snapshot's, the
//!   engine sends exactly one wire message. Nothing is sent for rejected
//!   input, for remote updates, or on reconnect.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::action::{Action, reduce};
use crate::error::SyncError;
use crate::state::SyncState;
use crate::transport::{Transport, TransportEvent};

/// Reducer plus transport glue for one participant.
#[derive(Debug)]
pub struct GuessSyncEngine<T: Transport> {
    state: Arc<SyncState>,
    transport: T,
    snapshots: watch::Sender<Arc<SyncState>>,
    connected: bool,
    closed: bool,
}

impl<T: Transport> GuessSyncEngine<T> {
    /// Create an engine in the initial state.
    pub fn new(transport: T) -> Self {
        Self::with_state(transport, SyncState::default())
    }

    /// Create an engine starting from `state`.
    pub fn with_state(transport: T, state: SyncState) -> Self {
        let state = Arc::new(state);
        let (snapshots, _) = watch::channel(Arc::clone(&state));
        Self {
            state,
            transport,
            snapshots,
            connected: false,
            closed: false,
        }
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<SyncState> {
        Arc::clone(&self.state)
    }

    /// Receive every new snapshot as it is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SyncState>> {
        self.snapshots.subscribe()
    }

    /// Whether the transport is currently open.
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply an action. Returns `true` if the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = reduce(&self.state, action);
        if next == *self.state {
            return false;
        }

        let self_changed = next.self_guess != self.state.self_guess;
        let next = Arc::new(next);
        self.state = Arc::clone(&next);
        self.snapshots.send_replace(next);

        if self_changed && let Err(e) = self.transmit_self() {
            warn!(error = %e, "Failed to send self guess");
        }
        true
    }

    /// React to a transport event.
    ///
    /// Undecodable messages are logged and dropped; they never reach the
    /// reducer and never close the channel.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                self.connected = true;
                info!("Sync channel open");
            }
            TransportEvent::Close => {
                self.connected = false;
                info!("Sync channel closed");
            }
            TransportEvent::Message(text) => match Action::from_wire(&text) {
                Ok(action) => {
                    self.dispatch(action);
                }
                Err(e) => {
                    debug!(error = %e, "Dropping inbound message");
                }
            },
        }
    }

    /// Close the transport. Safe to call repeatedly and before `Open`.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.connected = false;
            self.transport.close();
        }
    }

    /// Drive the engine until the local action stream ends.
    ///
    /// Closes the transport on exit and returns the final snapshot. If the
    /// transport shuts down first, local actions keep being applied.
    pub async fn run(mut self, mut actions: mpsc::Receiver<Action>) -> Arc<SyncState> {
        let mut transport_done = false;

        loop {
            tokio::select! {
                action = actions.recv() => {
                    match action {
                        Some(action) => {
                            self.dispatch(action);
                        }
                        None => break,
                    }
                }
                event = self.transport.next_event(), if !transport_done => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            transport_done = true;
                            self.connected = false;
                            debug!("Transport finished");
                        }
                    }
                }
            }
        }

        self.close();
        self.state()
    }

    fn transmit_self(&mut self) -> Result<(), SyncError> {
        let text = self.state.self_guess.to_wire().to_json()?;
        self.transport.send(text)
    }
}

impl<T: Transport> Drop for GuessSyncEngine<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chatguessr_geo::Point;
    use serde_json::Value;

    use super::*;

    /// In-memory transport that records sends and replays queued events.
    #[derive(Debug)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<String>>>,
        closes: Arc<AtomicUsize>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    }

    struct Handles {
        sent: Arc<Mutex<Vec<String>>>,
        closes: Arc<AtomicUsize>,
        events: mpsc::UnboundedSender<TransportEvent>,
    }

    impl Handles {
        fn sent(&self) -> Vec<Value> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|s| serde_json::from_str(s).unwrap())
                .collect()
        }
    }

    fn recording() -> (RecordingTransport, Handles) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RecordingTransport {
                sent: Arc::clone(&sent),
                closes: Arc::clone(&closes),
                events: rx,
            },
            Handles {
                sent,
                closes,
                events: tx,
            },
        )
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, text: String) -> Result<(), SyncError> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send {
            self.events.recv()
        }
    }

    /// Transport whose sends always fail.
    #[derive(Debug)]
    struct RefusingTransport;

    impl Transport for RefusingTransport {
        fn send(&mut self, _text: String) -> Result<(), SyncError> {
            Err(SyncError::Transport(String::from("refused")))
        }

        fn close(&mut self) {}

        fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send {
            std::future::ready(None)
        }
    }

    const P1_MESSAGE: &str =
        r#"{"Location":{"lat":5,"lng":5},"Ident":"p1","OpCode":"","Distance":1000}"#;

    #[test]
    fn local_move_sends_exactly_once() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        assert!(engine.dispatch(Action::LocalMove(Point::new(10.0, 20.0))));

        let sent = handles.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["Location"]["lat"], 10.0);
        assert_eq!(sent[0]["Location"]["lng"], 20.0);
    }

    #[test]
    fn transmit_self_reports_send_failure() {
        let mut engine = GuessSyncEngine::new(RefusingTransport);
        assert!(matches!(
            engine.transmit_self(),
            Err(SyncError::Transport(ref reason)) if reason == "refused"
        ));
        // A failed send still applies the move locally.
        assert!(engine.dispatch(Action::LocalMove(Point::new(3.0, 4.0))));
        assert_eq!(engine.state().self_guess.location, Point::new(3.0, 4.0));
    }

    #[test]
    fn transmit_self_sends_the_encoded_guess() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        engine.transmit_self().unwrap();
        let sent = handles.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["OpCode"], "");
        assert_eq!(sent[0]["Distance"], 0.0);
    }

    #[test]
    fn solo_edits_are_not_sent() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        assert!(engine.dispatch(Action::AddGuess));
        assert!(engine.dispatch(Action::MoveSelected(Point::new(5.0, 5.0))));
        assert!(engine.dispatch(Action::SoloRadius { index: 0, radius: 70.0 }));
        assert!(handles.sent().is_empty());
        assert_eq!(engine.state().solo.len(), 2);
    }

    #[test]
    fn rejected_radius_sends_nothing() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        assert!(!engine.dispatch(Action::LocalRadius(f64::NAN)));
        assert!(engine.state().self_guess.radius.abs() < f64::EPSILON);
        assert!(handles.sent().is_empty());
    }

    #[test]
    fn unchanged_move_sends_nothing() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        engine.dispatch(Action::LocalMove(Point::new(1.0, 1.0)));
        engine.dispatch(Action::LocalMove(Point::new(1.0, 1.0)));
        assert_eq!(handles.sent().len(), 1);
    }

    #[test]
    fn radius_change_is_sent_in_meters() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        engine.dispatch(Action::LocalRadius(2500.0));
        let sent = handles.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["Distance"], 2500.0);
    }

    #[test]
    fn remote_and_counterpart_updates_are_not_sent() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        engine.handle_event(TransportEvent::Message(P1_MESSAGE.to_owned()));
        engine.dispatch(Action::CounterpartMove(Point::new(3.0, 3.0)));
        engine.dispatch(Action::CounterpartRadius(40.0));
        assert!(handles.sent().is_empty());
        assert_eq!(engine.state().remotes.len(), 1);
    }

    #[test]
    fn malformed_inbound_is_dropped() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        let before = engine.state();

        engine.handle_event(TransportEvent::Open);
        engine.handle_event(TransportEvent::Message(String::from("{not json")));
        engine.handle_event(TransportEvent::Message(String::from(r#"{"Ident":"p1"}"#)));

        assert_eq!(*engine.state(), *before);
        assert!(engine.is_connected());
        assert_eq!(handles.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn open_and_close_track_connection() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);

        engine.handle_event(TransportEvent::Open);
        assert!(engine.is_connected());
        engine.handle_event(TransportEvent::Close);
        assert!(!engine.is_connected());
        // Reconnecting does not resend the self guess.
        engine.handle_event(TransportEvent::Open);
        assert!(handles.sent().is_empty());
    }

    #[test]
    fn subscribers_see_new_snapshots_only_on_change() {
        let (transport, _handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        let mut rx = engine.subscribe();
        assert!(!rx.has_changed().unwrap());

        engine.dispatch(Action::LocalRadius(-3.0));
        assert!(!rx.has_changed().unwrap());

        engine.dispatch(Action::LocalRadius(3.0));
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!((snapshot.self_guess.radius - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn previous_snapshot_is_not_mutated() {
        let (transport, _handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        let before = engine.state();

        engine.dispatch(Action::LocalMove(Point::new(8.0, 9.0)));
        assert_eq!(before.self_guess.location, Point::new(0.0, 0.0));
        assert!(!Arc::ptr_eq(&before, &engine.state()));
    }

    #[test]
    fn close_is_idempotent_and_runs_on_drop() {
        let (transport, handles) = recording();
        let mut engine = GuessSyncEngine::new(transport);
        engine.close();
        engine.close();
        drop(engine);
        assert_eq!(handles.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn end_to_end_move_then_remote_message() {
        let (transport, handles) = recording();
        let engine = GuessSyncEngine::new(transport);
        let mut snapshots = engine.subscribe();
        let (actions_tx, actions_rx) = mpsc::channel(16);
        let task = tokio::spawn(engine.run(actions_rx));

        handles.events.send(TransportEvent::Open).unwrap();
        actions_tx
            .send(Action::LocalMove(Point::new(10.0, 20.0)))
            .await
            .unwrap();
        snapshots
            .wait_for(|s| s.self_guess.location == Point::new(10.0, 20.0))
            .await
            .unwrap();

        handles
            .events
            .send(TransportEvent::Message(P1_MESSAGE.to_owned()))
            .unwrap();
        snapshots
            .wait_for(|s| s.remotes.contains_key("p1"))
            .await
            .unwrap();

        drop(actions_tx);
        let final_state = task.await.unwrap();

        let sent = handles.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["Location"]["lat"], 10.0);
        assert_eq!(sent[0]["Location"]["lng"], 20.0);

        let p1 = final_state.remotes.get("p1").unwrap();
        assert_eq!(p1.location, Point::new(5.0, 5.0));
        assert!((p1.radius - 1000.0).abs() < f64::EPSILON);
        assert_eq!(final_state.render_len(), 3);
        assert_eq!(final_state.render_list().count(), 3);
        assert_eq!(handles.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_survives_transport_shutdown() {
        let (transport, handles) = recording();
        let engine = GuessSyncEngine::new(transport);
        let (actions_tx, actions_rx) = mpsc::channel(4);
        let task = tokio::spawn(engine.run(actions_rx));

        drop(handles.events);
        actions_tx.send(Action::LocalRadius(10.0)).await.unwrap();
        drop(actions_tx);

        let final_state = task.await.unwrap();
        assert!((final_state.self_guess.radius - 10.0).abs() < f64::EPSILON);
    }
}
