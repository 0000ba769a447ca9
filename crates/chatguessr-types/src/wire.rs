//! The guess message exchanged over the `/chatguessr` WebSocket.
//!
//! ```json
//! { "Location": { "lat": 10.0, "lng": 20.0 },
//!   "Distance": 1000.0,
//!   "Ident": "3f2a...",
//!   "OpCode": "message" }
//! ```
//!
//! Field names are capitalized on the wire. Clients send guesses without
//! `Ident` and with an empty `OpCode`; the relay fills both in before
//! re-broadcasting.

use chatguessr_geo::Point;
use serde::{Deserialize, Serialize};

use crate::ids::ClientIdent;

/// Identity carried by guesses from the bot upstream feed.
pub const BOT_IDENT: &str = "bot";

/// Operation tag carried in the `OpCode` field.
///
/// Unknown strings are preserved in [`OpCode::Other`] and treated by
/// receivers as a generic update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OpCode {
    /// Empty op code, as sent by clients.
    #[default]
    Unspecified,
    /// A participant joined the relay.
    Connect,
    /// A participant left the relay.
    Disconnect,
    /// A participant moved or resized their guess.
    Message,
    /// The bot feed (counterpart) moved. Carries no distance.
    Bot,
    /// The counterpart moved and resized in one message.
    CounterpartUpdate,
    /// Any other tag.
    Other(String),
}

impl OpCode {
    /// The wire string for this op code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Message => "message",
            Self::Bot => "bot",
            Self::CounterpartUpdate => "counterpart-update",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OpCode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" => Self::Unspecified,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "message" => Self::Message,
            "bot" => Self::Bot,
            "counterpart-update" => Self::CounterpartUpdate,
            _ => Self::Other(s),
        }
    }
}

impl From<OpCode> for String {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl core::fmt::Display for OpCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One guess on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGuess {
    /// Guessed location. Receivers ignore messages without one.
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Point>,
    /// Uncertainty radius in meters.
    #[serde(rename = "Distance", default)]
    pub distance: f64,
    /// Owner identity. Receivers ignore messages without one.
    #[serde(rename = "Ident", default, skip_serializing_if = "Option::is_none")]
    pub ident: Option<String>,
    /// Operation tag.
    #[serde(rename = "OpCode", default)]
    pub op: OpCode,
}

impl WireGuess {
    /// A client's own guess, as sent to the relay.
    pub const fn outbound(location: Point, distance: f64) -> Self {
        Self {
            location: Some(location),
            distance,
            ident: None,
            op: OpCode::Unspecified,
        }
    }

    /// Announcement that `ident` joined. Carries the origin as location.
    pub fn connect(ident: &ClientIdent) -> Self {
        Self::announcement(ident, OpCode::Connect)
    }

    /// Announcement that `ident` left. Carries the origin as location.
    pub fn disconnect(ident: &ClientIdent) -> Self {
        Self::announcement(ident, OpCode::Disconnect)
    }

    /// A bot feed position, tagged with [`BOT_IDENT`] and zero distance.
    pub fn bot(location: Point) -> Self {
        Self {
            location: Some(location),
            distance: 0.0,
            ident: Some(BOT_IDENT.to_owned()),
            op: OpCode::Bot,
        }
    }

    fn announcement(ident: &ClientIdent, op: OpCode) -> Self {
        Self {
            location: Some(Point::default()),
            distance: 0.0,
            ident: Some(ident.to_string()),
            op,
        }
    }

    /// Re-tag a client's guess with the relay-assigned identity.
    #[must_use]
    pub fn relayed_from(mut self, ident: &ClientIdent) -> Self {
        self.ident = Some(ident.to_string());
        self.op = OpCode::Message;
        self
    }

    /// Whether this guess was sent by `ident`.
    pub fn is_from(&self, ident: &ClientIdent) -> bool {
        self.ident.as_deref() == Some(ident.as_str())
    }

    /// Decode a guess from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode this guess as JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Body of `GET /config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResponse {
    /// `true` for multi-party mode, `false` for single-user mode.
    pub group: bool,
}
