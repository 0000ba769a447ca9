//! Guesses and the aggregate sync state.
//!
//! [`SyncState`] is a plain value. The engine never mutates a published
//! snapshot; every transition builds a new [`SyncState`], so observers can
//! detect change by comparing the previous and current values.
//!
//! Besides the synchronized guesses, the state carries the solo list: the
//! guesses a participant keeps for themselves when no relay is available.
//! It is never sent anywhere.

use std::collections::BTreeMap;

use chatguessr_geo::{Point, boundary};
use chatguessr_types::{BOT_IDENT, WireGuess};
use serde::{Deserialize, Serialize};

use crate::export::export_command;

/// Identity of the local participant's own guess.
pub const SELF_IDENT: &str = "self";

/// Identity of the counterpart (bot) guess.
pub const COUNTERPART_IDENT: &str = BOT_IDENT;

/// Initial location of the local guess.
pub const DEFAULT_SELF_LOCATION: Point = Point::new(0.0, 0.0);

/// Initial location of the counterpart guess.
pub const DEFAULT_COUNTERPART_LOCATION: Point = Point::new(10.0, 10.0);

/// Radius, in meters, added per existing entry when a solo guess is added.
pub const SOLO_RADIUS_STEP: f64 = 10.0;

/// Ownership of a guess, which also decides its sync direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuessKind {
    /// The local participant's guess. Sent outbound on change.
    #[serde(rename = "self")]
    Own,
    /// The bot guess. Updated inbound only, never removed.
    #[serde(rename = "counterpart")]
    Counterpart,
    /// Another participant's guess, keyed by relay identity.
    #[serde(rename = "remote")]
    Remote,
    /// An entry of the local solo list. Never synchronized.
    #[serde(rename = "solo")]
    Solo,
}

/// One participant's location estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guess {
    /// Guessed location.
    pub location: Point,
    /// Uncertainty radius in meters.
    pub radius: f64,
    /// Owner identity.
    pub identity: String,
    /// Ownership.
    pub kind: GuessKind,
}

impl Guess {
    /// The initial local guess.
    pub fn own() -> Self {
        Self {
            location: DEFAULT_SELF_LOCATION,
            radius: 0.0,
            identity: SELF_IDENT.to_owned(),
            kind: GuessKind::Own,
        }
    }

    /// The initial counterpart guess.
    pub fn counterpart() -> Self {
        Self {
            location: DEFAULT_COUNTERPART_LOCATION,
            radius: 0.0,
            identity: COUNTERPART_IDENT.to_owned(),
            kind: GuessKind::Counterpart,
        }
    }

    /// A remote participant's guess.
    pub fn remote(identity: impl Into<String>, location: Point, radius: f64) -> Self {
        Self {
            location,
            radius,
            identity: identity.into(),
            kind: GuessKind::Remote,
        }
    }

    /// Entry `index` of the solo list, placed at the origin.
    pub fn solo(index: usize, radius: f64) -> Self {
        Self {
            location: DEFAULT_SELF_LOCATION,
            radius,
            identity: index.to_string(),
            kind: GuessKind::Solo,
        }
    }

    /// Whether `radius` is acceptable as an uncertainty distance.
    pub fn is_valid_radius(radius: f64) -> bool {
        radius.is_finite() && radius >= 0.0
    }

    /// Polygon ring of this guess's uncertainty circle.
    pub fn boundary(&self) -> Vec<Point> {
        boundary(self.location, self.radius)
    }

    /// Wire form of this guess as sent by its owner.
    pub const fn to_wire(&self) -> WireGuess {
        WireGuess::outbound(self.location, self.radius)
    }
}

/// Everything the renderer draws: own guess, counterpart, and remotes,
/// plus the local solo list.
///
/// `remotes` never contains [`SELF_IDENT`] or [`COUNTERPART_IDENT`].
/// `solo` is never empty and `selected` always indexes into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// The local participant's guess.
    pub self_guess: Guess,
    /// The bot guess.
    pub counterpart: Guess,
    /// Remote participants' guesses keyed by identity.
    pub remotes: BTreeMap<String, Guess>,
    /// Solo guesses in the order they were added.
    pub solo: Vec<Guess>,
    /// Index of the solo guess that map clicks move.
    pub selected: usize,
}

impl SyncState {
    /// Whether `identity` is reserved for the self or counterpart guess.
    pub fn is_reserved(identity: &str) -> bool {
        identity == SELF_IDENT || identity == COUNTERPART_IDENT
    }

    /// Guesses in render order: self, counterpart, then remotes.
    pub fn render_list(&self) -> impl Iterator<Item = &Guess> {
        std::iter::once(&self.self_guess)
            .chain(std::iter::once(&self.counterpart))
            .chain(self.remotes.values())
    }

    /// Number of guesses in the render list.
    pub fn render_len(&self) -> usize {
        self.remotes.len().saturating_add(2)
    }

    /// Solo guess at `index`.
    pub fn solo_guess(&self, index: usize) -> Option<&Guess> {
        self.solo.get(index)
    }

    /// The selected solo guess.
    pub fn selected_guess(&self) -> Option<&Guess> {
        self.solo_guess(self.selected)
    }

    /// Radius in meters of the solo guess at `index`.
    pub fn solo_radius(&self, index: usize) -> Option<f64> {
        self.solo_guess(index).map(|g| g.radius)
    }

    /// Chat export command for the solo guess at `index`.
    pub fn export_solo(&self, channel: &str, index: usize) -> Option<String> {
        self.solo_guess(index).map(|g| export_command(channel, g.location))
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            self_guess: Guess::own(),
            counterpart: Guess::counterpart(),
            remotes: BTreeMap::new(),
            solo: vec![Guess::solo(0, 0.0)],
            selected: 0,
        }
    }
}
