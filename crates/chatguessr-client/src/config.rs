//! Configuration for the terminal client.
//!
//! All configuration is loaded from environment variables:
//!
//! - `CHATGUESSR_URL` -- page URL of the relay (default
//!   `http://localhost:8080/`); the channel and `/config` endpoints are
//!   derived from it
//! - `CHATGUESSR_CHANNEL` -- chat channel named in export commands
//!   (default empty)

use chatguessr_sync::{SyncError, channel_endpoint};

/// Page URL used when `CHATGUESSR_URL` is unset.
pub const DEFAULT_PAGE_URL: &str = "http://localhost:8080/";

/// Complete client configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// URL the relay serves its page from.
    pub page_url: String,
    /// Chat channel for export commands.
    pub channel: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from variables returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] if the page URL cannot be turned
    /// into a channel endpoint.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let page_url = lookup("CHATGUESSR_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE_URL.to_owned());
        let channel = lookup("CHATGUESSR_CHANNEL").unwrap_or_default();

        // Fail at startup rather than on first connect.
        channel_endpoint(&page_url)?;

        Ok(Self { page_url, channel })
    }
}
