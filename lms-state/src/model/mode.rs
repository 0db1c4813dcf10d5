//! Playback mode enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback mode of a player
///
/// `Off` is never reported by the server in a `mode` line; it is set when the
/// player reports `power 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Not reported yet
    #[default]
    Unknown,
    /// Currently playing audio
    Play,
    /// Playback is stopped
    Stop,
    /// Playback is paused
    Pause,
    /// Player is powered off
    Off,
}

impl Mode {
    /// Parse a `mode` payload
    ///
    /// Anything other than `play`, `stop`, `pause` or `off` maps to `Unknown`.
    pub fn from_payload(payload: &str) -> Self {
        match payload.trim() {
            "play" => Mode::Play,
            "stop" => Mode::Stop,
            "pause" => Mode::Pause,
            "off" => Mode::Off,
            _ => Mode::Unknown,
        }
    }

    /// Protocol spelling of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Unknown => "unknown",
            Mode::Play => "play",
            Mode::Stop => "stop",
            Mode::Pause => "pause",
            Mode::Off => "off",
        }
    }

    /// Whether the player produces no sound in this mode
    pub fn is_silent(&self) -> bool {
        matches!(self, Mode::Stop | Mode::Pause | Mode::Off)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_payload() {
        assert_eq!(Mode::from_payload("play"), Mode::Play);
        assert_eq!(Mode::from_payload("stop"), Mode::Stop);
        assert_eq!(Mode::from_payload("pause"), Mode::Pause);
        assert_eq!(Mode::from_payload("off"), Mode::Off);
    }

    #[test]
    fn test_from_payload_unknown() {
        assert_eq!(Mode::from_payload("PLAY"), Mode::Unknown);
        assert_eq!(Mode::from_payload(""), Mode::Unknown);
    }

    #[test]
    fn test_is_silent() {
        assert!(!Mode::Play.is_silent());
        assert!(!Mode::Unknown.is_silent());
        assert!(Mode::Stop.is_silent());
        assert!(Mode::Pause.is_silent());
        assert!(Mode::Off.is_silent());
    }

    #[test]
    fn test_default() {
        assert_eq!(Mode::default(), Mode::Unknown);
    }
}
