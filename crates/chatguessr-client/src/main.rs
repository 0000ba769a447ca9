//! Terminal client for Chatguessr.
//!
//! Stands in for the map page: typed commands become engine actions, and
//! every new snapshot is printed as a list of guesses with the extent of
//! their uncertainty circles.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment
//! 3. Ask the relay for the mode (solo on failure)
//! 4. Build the engine over a reconnecting socket (group) or a detached
//!    transport (solo)
//! 5. Read commands from stdin until `quit` or end of input

mod command;
mod config;
mod render;

use std::sync::Arc;

use anyhow::Context as _;
use chatguessr_sync::{
    Action, Detached, GuessSyncEngine, Mode, ReconnectPolicy, ReconnectingSocket, SyncState,
    Transport, channel_endpoint, export_command, fetch_mode,
};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, CommandError, help, parse_command};
use crate::config::ClientConfig;
use crate::render::render_state;

/// Capacity of the queue between the stdin reader and the engine.
const ACTION_QUEUE: usize = 64;

/// Application entry point for the terminal client.
///
/// # Errors
///
/// Returns an error if configuration is invalid or stdin cannot be read.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // 2. Load configuration.
    let config = ClientConfig::from_env().context("loading client configuration")?;
    info!(
        page_url = config.page_url,
        channel = config.channel,
        "Configuration loaded"
    );

    // 3. Fetch the mode.
    let http = reqwest::Client::new();
    let mode = match fetch_mode(&http, &config.page_url).await {
        Ok(mode) => mode,
        Err(e) => {
            warn!(error = %e, "Mode fetch failed, staying in solo mode");
            Mode::Solo
        }
    };
    info!(?mode, "Mode selected");

    // 4 + 5. Build the engine and run the session.
    match mode {
        Mode::Group => {
            let url = channel_endpoint(&config.page_url)?;
            let socket = ReconnectingSocket::connect(url.as_str(), ReconnectPolicy::default());
            run_session(GuessSyncEngine::new(socket), &config, mode).await
        }
        Mode::Solo => run_session(GuessSyncEngine::new(Detached), &config, mode).await,
    }
}

/// Run the engine on its own task and feed it from stdin.
async fn run_session<T>(
    engine: GuessSyncEngine<T>,
    config: &ClientConfig,
    mode: Mode,
) -> anyhow::Result<()>
where
    T: Transport + Send + 'static,
{
    let snapshots = engine.subscribe();
    let (actions, actions_rx) = mpsc::channel(ACTION_QUEUE);

    let engine_task = tokio::spawn(engine.run(actions_rx));
    let printer = tokio::spawn(print_snapshots(snapshots.clone(), mode));

    println!("{}", help(mode));
    print!("{}", render_state(&snapshots.borrow(), mode));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let command = match parse_command(&line, mode) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        let action = match command {
            Command::Dispatch(action) => action,
            Command::SelectedRadius(radius) => Action::SoloRadius {
                index: snapshots.borrow().selected,
                radius,
            },
            Command::List => {
                print!("{}", render_state(&snapshots.borrow(), mode));
                continue;
            }
            Command::Export(index) => {
                println!("{}", export_line(&snapshots.borrow(), &config.channel, mode, index));
                continue;
            }
            Command::Help => {
                println!("{}", help(mode));
                continue;
            }
            Command::Quit => break,
        };
        if actions.send(action).await.is_err() {
            warn!("Engine stopped, leaving");
            break;
        }
    }

    // Closing the action queue stops the engine, which closes the transport.
    drop(actions);
    let final_state = engine_task.await.context("engine task failed")?;
    printer.abort();
    info!(guesses = final_state.render_len(), "Session ended");
    Ok(())
}

/// The chat command for `export`: the self guess in group mode, the solo
/// guess at `index` (default: selected) in solo mode.
fn export_line(state: &SyncState, channel: &str, mode: Mode, index: Option<usize>) -> String {
    match mode {
        Mode::Group => export_command(channel, state.self_guess.location),
        Mode::Solo => {
            let index = index.unwrap_or(state.selected);
            state
                .export_solo(channel, index)
                .unwrap_or_else(|| format!("no guess {index}"))
        }
    }
}

/// Print every snapshot the engine publishes.
async fn print_snapshots(mut snapshots: watch::Receiver<Arc<SyncState>>, mode: Mode) {
    while snapshots.changed().await.is_ok() {
        let state = snapshots.borrow_and_update().clone();
        print!("{}", render_state(&state, mode));
    }
}
