//! Text rendering of snapshots.
//!
//! Each guess is one line: kind, identity, clamped location, radius, the
//! extent of its boundary ring, and its distance from the self guess. In
//! solo mode only the local guess list is shown, with the selected entry
//! marked.

use chatguessr_geo::{Bounds, clamp_point, great_circle_distance_km};
use chatguessr_sync::{Guess, GuessKind, Mode, SyncState};

/// Render `state` for a client in `mode`, one guess per line.
pub fn render_state(state: &SyncState, mode: Mode) -> String {
    match mode {
        Mode::Group => state
            .render_list()
            .map(|guess| render_guess(guess, &state.self_guess) + "\n")
            .collect(),
        Mode::Solo => render_solo(state),
    }
}

/// Render the solo list, marking the selected guess with `*`.
pub fn render_solo(state: &SyncState) -> String {
    state
        .solo
        .iter()
        .enumerate()
        .map(|(index, guess)| {
            let marker = if index == state.selected { '*' } else { ' ' };
            format!("{marker} {}\n", render_guess(guess, guess))
        })
        .collect()
}

/// Render one guess relative to `own`.
pub fn render_guess(guess: &Guess, own: &Guess) -> String {
    let kind = match guess.kind {
        GuessKind::Own => "self",
        GuessKind::Counterpart => "bot",
        GuessKind::Remote => "remote",
        GuessKind::Solo => "solo",
    };
    let location = clamp_point(guess.location);
    let mut line = format!(
        "{kind:<6} {:<12} {:>9.4}, {:>9.4}  r={:.1} km",
        short_ident(&guess.identity),
        location.lat,
        location.lng,
        guess.radius / 1000.0,
    );

    if let Some(bounds) = Bounds::of(&guess.boundary()) {
        line.push_str(&format!(
            "  lat [{:.2}, {:.2}] lng [{:.2}, {:.2}]",
            bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng
        ));
    }

    if !matches!(guess.kind, GuessKind::Own | GuessKind::Solo) {
        line.push_str(&format!(
            "  {:.1} km away",
            great_circle_distance_km(own.location, guess.location)
        ));
    }
    line
}

/// Relay identities are long hex strings; the first 12 characters are
/// enough to tell participants apart on screen.
fn short_ident(identity: &str) -> &str {
    identity.get(..12).unwrap_or(identity)
}
