//! Parsing of typed commands.
//!
//! One command per line. Coordinates may be separated by whitespace, a
//! comma, or both, so a location copied from a map (`48.85, 2.35`) can be
//! pasted as-is. Distances are typed in kilometres.
//!
//! The vocabulary depends on the mode. In group mode `move` and `radius`
//! edit the shared self guess; in solo mode they edit the local guess
//! list, which also understands `add` and `select`.

use chatguessr_geo::Point;
use chatguessr_sync::{Action, Mode, parse_distance_km};

/// Help text for group mode.
pub const GROUP_HELP: &str = "\
commands:
  move <lat> <lng>      move your guess
  radius <km>           set your uncertainty radius
  bot <lat> <lng>       move the counterpart guess
  bot-radius <km>       set the counterpart radius
  reset                 return your guess to its start
  list                  print every guess
  export                print the chat command for your guess
  help                  show this text
  quit                  leave";

/// Help text for solo mode.
pub const SOLO_HELP: &str = "\
commands:
  add                   add a guess and select it
  select <n>            select guess n
  move <lat> <lng>      move the selected guess
  radius [n] <km>       set the radius of guess n (default: selected)
  list                  print every guess
  export [n]            print the chat command for guess n (default: selected)
  help                  show this text
  quit                  leave";

/// Help text printed for `help` in `mode`.
pub const fn help(mode: Mode) -> &'static str {
    match mode {
        Mode::Group => GROUP_HELP,
        Mode::Solo => SOLO_HELP,
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply an engine action.
    Dispatch(Action),
    /// Set the radius (meters) of whichever solo guess is selected when
    /// the command runs.
    SelectedRadius(f64),
    /// Print the render list.
    List,
    /// Print the export string: the self guess in group mode, the solo
    /// guess at the index (or the selected one) in solo mode.
    Export(Option<usize>),
    /// Print the help for the current mode.
    Help,
    /// Stop the client.
    Quit,
}

/// Reasons a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("empty command")]
    Empty,
    /// The first word is not a known command.
    #[error("unknown command {0:?}")]
    Unknown(String),
    /// The command exists but not in the current mode.
    #[error("{command} is not available in {mode:?} mode")]
    WrongMode {
        /// The command word as typed.
        command: String,
        /// The mode the client runs in.
        mode: Mode,
    },
    /// The arguments did not fit the command.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line for a client running in `mode`.
pub fn parse_command(line: &str, mode: Mode) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let word = word.to_ascii_lowercase();

    match word.as_str() {
        "" => return Err(CommandError::Empty),
        "list" | "ls" => return Ok(Command::List),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        _ => {}
    }

    match mode {
        Mode::Group => parse_group(&word, rest),
        Mode::Solo => parse_solo(&word, rest),
    }
}

fn parse_group(word: &str, rest: &str) -> Result<Command, CommandError> {
    match word {
        "move" | "m" => parse_point(rest)
            .map(|p| Command::Dispatch(Action::LocalMove(p)))
            .ok_or(CommandError::Usage("move <lat> <lng>")),
        "radius" | "r" => parse_distance_km(rest)
            .map(|m| Command::Dispatch(Action::LocalRadius(m)))
            .ok_or(CommandError::Usage("radius <km>")),
        "bot" => parse_point(rest)
            .map(|p| Command::Dispatch(Action::CounterpartMove(p)))
            .ok_or(CommandError::Usage("bot <lat> <lng>")),
        "bot-radius" => parse_distance_km(rest)
            .map(|m| Command::Dispatch(Action::CounterpartRadius(m)))
            .ok_or(CommandError::Usage("bot-radius <km>")),
        "reset" => Ok(Command::Dispatch(Action::Reset)),
        "export" if rest.is_empty() => Ok(Command::Export(None)),
        "export" => Err(CommandError::Usage("export")),
        "add" | "select" | "sel" => Err(wrong_mode(word, Mode::Group)),
        other => Err(CommandError::Unknown(other.to_owned())),
    }
}

fn parse_solo(word: &str, rest: &str) -> Result<Command, CommandError> {
    match word {
        "add" | "a" => Ok(Command::Dispatch(Action::AddGuess)),
        "select" | "sel" => parse_index(rest)
            .map(|i| Command::Dispatch(Action::SelectGuess(i)))
            .ok_or(CommandError::Usage("select <n>")),
        "move" | "m" => parse_point(rest)
            .map(|p| Command::Dispatch(Action::MoveSelected(p)))
            .ok_or(CommandError::Usage("move <lat> <lng>")),
        "radius" | "r" => parse_solo_radius(rest).ok_or(CommandError::Usage("radius [n] <km>")),
        "export" if rest.is_empty() => Ok(Command::Export(None)),
        "export" => parse_index(rest)
            .map(|i| Command::Export(Some(i)))
            .ok_or(CommandError::Usage("export [n]")),
        "bot" | "bot-radius" | "reset" => Err(wrong_mode(word, Mode::Solo)),
        other => Err(CommandError::Unknown(other.to_owned())),
    }
}

fn wrong_mode(word: &str, mode: Mode) -> CommandError {
    CommandError::WrongMode {
        command: word.to_owned(),
        mode,
    }
}

/// `<km>` for the selected guess, or `<n> <km>` for guess `n`.
fn parse_solo_radius(text: &str) -> Option<Command> {
    match text.split_once(char::is_whitespace) {
        Some((index, km)) => {
            let index = parse_index(index)?;
            let radius = parse_distance_km(km)?;
            Some(Command::Dispatch(Action::SoloRadius { index, radius }))
        }
        None => parse_distance_km(text).map(Command::SelectedRadius),
    }
}

fn parse_index(text: &str) -> Option<usize> {
    text.trim().parse().ok()
}

fn parse_point(text: &str) -> Option<Point> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let lat: f64 = parts.next()?.parse().ok()?;
    let lng: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Point::new(lat, lng))
}
