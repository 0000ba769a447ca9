//! Configuration loading for the relay.
//!
//! The relay reads `chatguessr-config.yaml` from the working directory (or
//! the path in `CHATGUESSR_CONFIG`). A missing file means defaults. After
//! parsing, environment variables override individual fields:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CHATGUESSR_HOST` | `server.host` |
//! | `CHATGUESSR_PORT` | `server.port` |
//! | `CHATGUESSR_GROUP` | `group` |
//! | `CHATGUESSR_BOT_WS` | `bot_ws_url` (empty clears it) |
//! | `CHATGUESSR_STATIC_DIR` | `static_dir` (empty clears it) |

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::server::ServerConfig;

/// Config file read when `CHATGUESSR_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "chatguessr-config.yaml";

/// Top-level relay configuration.
///
/// Mirrors the structure of `chatguessr-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Listen address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Whether clients should run in group mode (reported by `/config`).
    #[serde(default = "default_group")]
    pub group: bool,

    /// Upstream `WebSocket` that streams counterpart locations.
    #[serde(default)]
    pub bot_ws_url: Option<String>,

    /// Directory with the static site to serve at `/`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

const fn default_group() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            group: default_group(),
            bot_ws_url: None,
            static_dir: None,
        }
    }
}

impl RelayConfig {
    /// Load configuration the way the server binary does.
    ///
    /// Reads the file named by `CHATGUESSR_CONFIG` (default
    /// [`DEFAULT_CONFIG_PATH`]), falls back to defaults when it does not
    /// exist, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CHATGUESSR_CONFIG")
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides looked up by variable name.
    ///
    /// `lookup` returns the value of a variable if it is set.
    /// [`load`](Self::load) passes the process environment.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("CHATGUESSR_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("CHATGUESSR_PORT") {
            self.server.port = val.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                var: "CHATGUESSR_PORT",
                value: val.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(val) = lookup("CHATGUESSR_GROUP") {
            self.group = parse_flag(&val).ok_or_else(|| ConfigError::InvalidEnv {
                var: "CHATGUESSR_GROUP",
                value: val.clone(),
                reason: String::from("expected true or false"),
            })?;
        }
        if let Some(val) = lookup("CHATGUESSR_BOT_WS") {
            self.bot_ws_url = non_empty(val);
        }
        if let Some(val) = lookup("CHATGUESSR_STATIC_DIR") {
            self.static_dir = non_empty(val).map(PathBuf::from);
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.trim().is_empty() { None } else { Some(val) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.group);
        assert!(config.bot_ws_url.is_none());
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = RelayConfig::parse("{}").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000
group: false
bot_ws_url: "ws://bot.local/feed"
static_dir: "site/build"
"#;
        let config = RelayConfig::parse(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(!config.group);
        assert_eq!(config.bot_ws_url.as_deref(), Some("ws://bot.local/feed"));
        assert_eq!(config.static_dir, Some(PathBuf::from("site/build")));
    }

    #[test]
    fn partial_server_section() {
        let config = RelayConfig::parse("server:\n  port: 1234\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 1234);
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let result = RelayConfig::parse("server: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn env_overrides_every_field() {
        let mut config = RelayConfig::default();
        config
            .apply_overrides(env(&[
                ("CHATGUESSR_HOST", "127.0.0.1"),
                ("CHATGUESSR_PORT", "7000"),
                ("CHATGUESSR_GROUP", "false"),
                ("CHATGUESSR_BOT_WS", "ws://x/y"),
                ("CHATGUESSR_STATIC_DIR", "/srv/site"),
            ]))
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7000);
        assert!(!config.group);
        assert_eq!(config.bot_ws_url.as_deref(), Some("ws://x/y"));
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/site")));
    }

    #[test]
    fn empty_env_clears_optional_fields() {
        let mut config = RelayConfig::parse("bot_ws_url: ws://x\nstatic_dir: site\n").unwrap();
        config
            .apply_overrides(env(&[
                ("CHATGUESSR_BOT_WS", ""),
                ("CHATGUESSR_STATIC_DIR", " "),
            ]))
            .unwrap();
        assert!(config.bot_ws_url.is_none());
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn bad_env_values_are_errors() {
        let mut config = RelayConfig::default();
        let err = config
            .apply_overrides(env(&[("CHATGUESSR_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CHATGUESSR_PORT", .. }));

        let err = config
            .apply_overrides(env(&[("CHATGUESSR_GROUP", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CHATGUESSR_GROUP", .. }));
    }

    #[test]
    fn flag_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
