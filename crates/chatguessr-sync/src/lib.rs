//! Shared guess state and its synchronization over the relay channel.
//!
//! The engine keeps three kinds of guesses (self, counterpart, remote
//! participants) in an immutable [`SyncState`] snapshot. Every change goes
//! through the pure [`reduce`] function; the [`GuessSyncEngine`] owns the
//! current snapshot, transmits the local guess when it changes, and turns
//! inbound channel messages into actions. The same snapshot carries the
//! solo guess list used when no relay is available.
//!
//! # Modules
//!
//! - [`action`] -- [`Action`] and the [`reduce`] transition function.
//! - [`endpoint`] -- Channel and config URL derivation, mode fetch.
//! - [`engine`] -- [`GuessSyncEngine`], the single-task event loop.
//! - [`error`] -- [`SyncError`] and [`InboundError`].
//! - [`export`] -- Chat export command and distance entry parsing.
//! - [`socket`] -- [`ReconnectingSocket`], a self-healing WebSocket.
//! - [`state`] -- [`Guess`], [`GuessKind`], and [`SyncState`].
//! - [`transport`] -- The [`Transport`] capability and [`Detached`].

pub mod action;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod export;
pub mod socket;
pub mod state;
pub mod transport;

pub use action::{Action, reduce};
pub use endpoint::{Mode, channel_endpoint, config_endpoint, fetch_mode};
pub use engine::GuessSyncEngine;
pub use error::{InboundError, SyncError};
pub use export::{export_command, parse_distance_km};
pub use socket::{ReconnectPolicy, ReconnectingSocket};
pub use state::{Guess, GuessKind, SyncState};
pub use transport::{Detached, Transport, TransportEvent};
