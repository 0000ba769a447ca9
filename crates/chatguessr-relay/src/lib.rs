//! Relay hub for Chatguessr.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` channel** (`/chatguessr`) where every connection gets a
//!   fresh identity and every guess is fanned out to all other
//!   participants via [`tokio::sync::broadcast`]
//! - **Mode endpoint** (`GET /config`) telling clients whether group mode
//!   is enabled
//! - **Health endpoint** (`GET /health`) with the live participant count
//! - **Static site** serving from an optional directory, with
//!   `index.html` as the fallback for unknown paths
//!
//! An optional bot feed ([`bot::spawn_bot_feed`]) keeps a reconnecting
//! client connection to an upstream `WebSocket` and re-broadcasts each
//! location it receives as the counterpart guess.
//!
//! # Architecture
//!
//! Each connection runs on its own task. Tasks never talk to each other
//! directly: inbound guesses are published to one broadcast channel and
//! every connection task forwards what it reads from its own receiver,
//! skipping guesses that carry its own identity. Slow connections lag and
//! skip ahead instead of blocking the others.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use bot::spawn_bot_feed;
pub use config::RelayConfig;
pub use error::{ConfigError, RelayError};
pub use router::build_router;
pub use server::{ServerConfig, serve, start_server};
pub use state::AppState;
