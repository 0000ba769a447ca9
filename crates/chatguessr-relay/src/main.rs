//! Relay server binary for Chatguessr.
//!
//! Loads configuration, optionally connects the upstream bot feed, and
//! serves the guess channel, the REST endpoints and the static site until
//! `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `chatguessr-config.yaml` plus environment
//! 3. Create the shared relay state
//! 4. Spawn the bot feed if `bot_ws_url` is set
//! 5. Serve until shutdown, then stop the bot feed

use std::sync::Arc;

use anyhow::Context as _;
use chatguessr_relay::{AppState, RelayConfig, RelayError, spawn_bot_feed, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point for the relay.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the server
/// cannot bind.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chatguessr-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        group = config.group,
        bot_ws_url = config.bot_ws_url.as_deref().unwrap_or("-"),
        static_dir = config
            .static_dir
            .as_ref()
            .map_or_else(|| String::from("-"), |dir| dir.display().to_string()),
        "Configuration loaded"
    );

    // 3. Create shared state.
    let state = Arc::new(AppState::new(config.group).with_static_dir(config.static_dir.clone()));

    // 4. Spawn the bot feed.
    let bot = config
        .bot_ws_url
        .as_deref()
        .map(|url| spawn_bot_feed(url, Arc::clone(&state)));

    // 5. Serve.
    let result = start_server(&config.server, state).await;

    if let Some(handle) = bot {
        handle.abort();
    }
    result.context("running relay server")?;

    info!("chatguessr-server stopped");
    Ok(())
}

/// Load relay configuration from `chatguessr-config.yaml` and the
/// environment.
fn load_config() -> Result<RelayConfig, RelayError> {
    Ok(RelayConfig::load()?)
}
