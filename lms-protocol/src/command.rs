//! Outbound command vocabulary
//!
//! Every command the SDK writes to the server is a `Command`. Its `Display`
//! implementation renders the exact wire text, without the trailing `\n`.

use std::fmt;

use crate::decode::encode_argument;
use crate::player_id::PlayerId;

/// Player properties that can be queried with `<id> <keyword> ?`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    SignalStrength,
    Name,
    Power,
    MixerVolume,
    Mode,
    CurrentTitle,
}

impl Query {
    /// Queries issued once a player has been identified
    pub const ON_REGISTER: [Query; 4] = [
        Query::SignalStrength,
        Query::Name,
        Query::Power,
        Query::MixerVolume,
    ];

    /// Queries issued on every refresh tick
    pub const ON_REFRESH: [Query; 3] = [Query::MixerVolume, Query::SignalStrength, Query::Power];

    /// Protocol keyword for this query
    pub fn keyword(&self) -> &'static str {
        match self {
            Query::SignalStrength => "signalstrength",
            Query::Name => "name",
            Query::Power => "power",
            Query::MixerVolume => "mixer volume",
            Query::Mode => "mode",
            Query::CurrentTitle => "current_title",
        }
    }
}

/// A single line sent to the server
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// `login <user> <pass>`
    Login { username: String, password: String },
    /// `player count ?`
    PlayerCount,
    /// `player id <n> ?`
    PlayerIndex(usize),
    /// `listen 1`
    Listen,
    /// `<id> <keyword> ?`
    Query { player: PlayerId, query: Query },
    /// `<id> power 0|1`
    Power { player: PlayerId, on: bool },
    /// `<id> mixer volume <n>`
    SetVolume { player: PlayerId, volume: i64 },
    /// `<id> mixer volume +n|-n`
    AdjustVolume { player: PlayerId, delta: i64 },
    /// `<id> play`
    Play { player: PlayerId },
    /// `<id> pause 1`
    Pause { player: PlayerId },
    /// `<id> stop`
    Stop { player: PlayerId },
}

impl Command {
    /// Shorthand for a player query
    pub fn query(player: &PlayerId, query: Query) -> Self {
        Command::Query {
            player: player.clone(),
            query,
        }
    }

    /// The player this command is addressed to, if any
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            Command::Login { .. } | Command::PlayerCount | Command::PlayerIndex(_) | Command::Listen => {
                None
            }
            Command::Query { player, .. }
            | Command::Power { player, .. }
            | Command::SetVolume { player, .. }
            | Command::AdjustVolume { player, .. }
            | Command::Play { player }
            | Command::Pause { player }
            | Command::Stop { player } => Some(player),
        }
    }

    /// Wire text including the line terminator
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Wire text safe for logs: login passwords are masked
    pub fn redacted(&self) -> String {
        match self {
            Command::Login { username, .. } => {
                format!("login {} ******", encode_argument(username))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Login { username, password } => write!(
                f,
                "login {} {}",
                encode_argument(username),
                encode_argument(password)
            ),
            Command::PlayerCount => write!(f, "player count ?"),
            Command::PlayerIndex(index) => write!(f, "player id {} ?", index),
            Command::Listen => write!(f, "listen 1"),
            Command::Query { player, query } => write!(f, "{} {} ?", player, query.keyword()),
            Command::Power { player, on } => write!(f, "{} power {}", player, u8::from(*on)),
            Command::SetVolume { player, volume } => {
                write!(f, "{} mixer volume {}", player, volume)
            }
            Command::AdjustVolume { player, delta } => {
                write!(f, "{} mixer volume {:+}", player, delta)
            }
            Command::Play { player } => write!(f, "{} play", player),
            Command::Pause { player } => write!(f, "{} pause 1", player),
            Command::Stop { player } => write!(f, "{} stop", player),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({:?})", self.redacted())
    }
}
