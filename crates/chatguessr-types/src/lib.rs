//! Shared wire types for Chatguessr.
//!
//! The relay hub and every client speak the same JSON message over the
//! `/chatguessr` WebSocket. This crate is the single definition of that
//! message so both ends agree on field names and defaults.
//!
//! # Modules
//!
//! - [`ids`] -- Participant identity assigned by the relay.
//! - [`wire`] -- The [`WireGuess`] message, its [`OpCode`], and the
//!   `/config` response body.

pub mod ids;
pub mod wire;

pub use ids::ClientIdent;
pub use wire::{BOT_IDENT, ModeResponse, OpCode, WireGuess};
