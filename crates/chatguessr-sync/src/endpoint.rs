//! Endpoint derivation and mode selection.
//!
//! Both endpoints live on the same host as the page the client was loaded
//! from. The channel scheme follows the page scheme: `https` pages use
//! `wss`, everything else uses `ws`.

use chatguessr_types::ModeResponse;
use reqwest::Url;
use tracing::debug;

use crate::error::SyncError;

/// Path of the relay WebSocket.
pub const CHANNEL_PATH: &str = "/chatguessr";

/// Path of the mode configuration endpoint.
pub const CONFIG_PATH: &str = "/config";

/// Whether guesses are shared with other participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Single-user mode: no channel participants beyond self.
    #[default]
    Solo,
    /// Multi-party mode over the relay.
    Group,
}

impl From<ModeResponse> for Mode {
    fn from(response: ModeResponse) -> Self {
        if response.group { Self::Group } else { Self::Solo }
    }
}

fn parse_page(page_url: &str) -> Result<Url, SyncError> {
    Url::parse(page_url).map_err(|e| SyncError::InvalidUrl(format!("{page_url}: {e}")))
}

fn same_host(page: &Url, scheme: &str, path: &str) -> Result<Url, SyncError> {
    let host = page
        .host_str()
        .ok_or_else(|| SyncError::InvalidUrl(format!("{page} has no host")))?;
    let authority = match page.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    let derived = format!("{scheme}://{authority}{path}");
    Url::parse(&derived).map_err(|e| SyncError::InvalidUrl(format!("{derived}: {e}")))
}

/// WebSocket URL of the relay for a page served from `page_url`.
pub fn channel_endpoint(page_url: &str) -> Result<Url, SyncError> {
    let page = parse_page(page_url)?;
    let scheme = if page.scheme() == "https" { "wss" } else { "ws" };
    same_host(&page, scheme, CHANNEL_PATH)
}

/// URL of the mode configuration endpoint for a page served from
/// `page_url`.
pub fn config_endpoint(page_url: &str) -> Result<Url, SyncError> {
    let page = parse_page(page_url)?;
    same_host(&page, page.scheme(), CONFIG_PATH)
}

/// Fetch the relay's mode from `GET /config`.
///
/// Callers are expected to log a failure and keep their current mode.
pub async fn fetch_mode(client: &reqwest::Client, page_url: &str) -> Result<Mode, SyncError> {
    let url = config_endpoint(page_url)?;
    debug!(url = %url, "Fetching mode");

    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| SyncError::ConfigFetch(format!("GET {url}: {e}")))?;

    let body: ModeResponse = response
        .json()
        .await
        .map_err(|e| SyncError::ConfigFetch(format!("decoding {url}: {e}")))?;

    Ok(Mode::from(body))
}
