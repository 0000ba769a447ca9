//! Actions and the pure transition function over [`SyncState`].
//!
//! Local actions come from user interaction (map clicks, distance edits);
//! remote actions are decoded from channel messages by
//! [`Action::from_wire`]. [`reduce`] is total: every action maps the old
//! state to a new one, and rejected input simply yields an equal state.

use chatguessr_geo::Point;
use chatguessr_types::{OpCode, WireGuess};

use crate::error::InboundError;
use crate::state::{Guess, SOLO_RADIUS_STEP, SyncState};

/// A state transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move the local guess.
    LocalMove(Point),
    /// Set the local uncertainty radius in meters.
    LocalRadius(f64),
    /// Move the counterpart guess.
    CounterpartMove(Point),
    /// Set the counterpart uncertainty radius in meters.
    CounterpartRadius(f64),
    /// Move and resize the counterpart guess in one step.
    CounterpartUpdate {
        /// New location.
        location: Point,
        /// New radius in meters.
        radius: f64,
    },
    /// A participant joined.
    RemoteConnect {
        /// Relay identity of the participant.
        identity: String,
        /// Their initial guess.
        guess: Guess,
    },
    /// A participant sent a guess.
    RemoteMessage {
        /// Relay identity of the participant.
        identity: String,
        /// Their current guess.
        guess: Guess,
    },
    /// A participant left.
    RemoteDisconnect(String),
    /// Return the local guess to its initial location and zero radius.
    Reset,
    /// Append a solo guess at the origin and select it.
    AddGuess,
    /// Select the solo guess at this index.
    SelectGuess(usize),
    /// Move the selected solo guess.
    MoveSelected(Point),
    /// Set the radius in meters of the solo guess at `index`.
    SoloRadius {
        /// Position in the solo list.
        index: usize,
        /// New radius in meters.
        radius: f64,
    },
}

impl Action {
    /// Decode an inbound channel message into the action it requests.
    ///
    /// Messages without a location or identity, with an out-of-range
    /// location, or with an invalid distance are rejected.
    pub fn from_wire(text: &str) -> Result<Self, InboundError> {
        let wire = WireGuess::from_json(text)?;
        let location = wire.location.ok_or(InboundError::MissingLocation)?;
        let identity = wire
            .ident
            .filter(|id| !id.is_empty())
            .ok_or(InboundError::MissingIdent)?;
        if !location.is_valid() {
            return Err(InboundError::InvalidLocation(location));
        }
        if !Guess::is_valid_radius(wire.distance) {
            return Err(InboundError::InvalidDistance(wire.distance));
        }

        let action = match wire.op {
            OpCode::Bot => Self::CounterpartMove(location),
            OpCode::CounterpartUpdate => Self::CounterpartUpdate {
                location,
                radius: wire.distance,
            },
            OpCode::Disconnect => Self::RemoteDisconnect(identity),
            OpCode::Connect => Self::RemoteConnect {
                guess: Guess::remote(identity.clone(), location, wire.distance),
                identity,
            },
            OpCode::Message | OpCode::Unspecified | OpCode::Other(_) => Self::RemoteMessage {
                guess: Guess::remote(identity.clone(), location, wire.distance),
                identity,
            },
        };
        Ok(action)
    }
}

/// Apply `action` to `state`, producing the next state.
///
/// `state` is left untouched. Invalid points and radii, remote actions
/// addressed at a reserved identity, and solo edits naming a missing index
/// produce a state equal to the input.
pub fn reduce(state: &SyncState, action: Action) -> SyncState {
    let mut next = state.clone();
    match action {
        Action::LocalMove(point) => {
            if point.is_valid() {
                next.self_guess.location = point;
            }
        }
        Action::LocalRadius(radius) => {
            if Guess::is_valid_radius(radius) {
                next.self_guess.radius = radius;
            }
        }
        Action::CounterpartMove(point) => {
            if point.is_valid() {
                next.counterpart.location = point;
            }
        }
        Action::CounterpartRadius(radius) => {
            if Guess::is_valid_radius(radius) {
                next.counterpart.radius = radius;
            }
        }
        Action::CounterpartUpdate { location, radius } => {
            if location.is_valid() && Guess::is_valid_radius(radius) {
                next.counterpart.location = location;
                next.counterpart.radius = radius;
            }
        }
        Action::RemoteConnect { identity, guess } | Action::RemoteMessage { identity, guess } => {
            if !SyncState::is_reserved(&identity) {
                let guess = Guess::remote(identity.clone(), guess.location, guess.radius);
                next.remotes.insert(identity, guess);
            }
        }
        Action::RemoteDisconnect(identity) => {
            next.remotes.remove(&identity);
        }
        Action::Reset => {
            next.self_guess = Guess::own();
        }
        Action::AddGuess => {
            let index = state.solo.len();
            let radius = f64::from(u32::try_from(index).unwrap_or(u32::MAX)) * SOLO_RADIUS_STEP;
            next.solo = state
                .solo
                .iter()
                .cloned()
                .chain(std::iter::once(Guess::solo(index, radius)))
                .collect();
            next.selected = index;
        }
        Action::SelectGuess(index) => {
            if index < state.solo.len() {
                next.selected = index;
            }
        }
        Action::MoveSelected(point) => {
            if point.is_valid() {
                next.solo = replace_solo(&state.solo, state.selected, |g| Guess {
                    location: point,
                    ..g.clone()
                });
            }
        }
        Action::SoloRadius { index, radius } => {
            if Guess::is_valid_radius(radius) {
                next.solo = replace_solo(&state.solo, index, |g| Guess {
                    radius,
                    ..g.clone()
                });
            }
        }
    }
    next
}

/// Copy of `list` with the entry at `index` replaced by `edit` of it.
/// An out-of-range index yields an unchanged copy.
fn replace_solo(list: &[Guess], index: usize, edit: impl Fn(&Guess) -> Guess) -> Vec<Guess> {
    list.iter()
        .enumerate()
        .map(|(i, g)| if i == index { edit(g) } else { g.clone() })
        .collect()
}
