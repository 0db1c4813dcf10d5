//! Error types for lms-state

use std::fmt;

/// Result type for lms-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised while applying a protocol line
///
/// All of these concern a single line. The session is left untouched and
/// the next line is processed normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Payload could not be parsed for the matched keyword
    InvalidPayload {
        keyword: &'static str,
        payload: String,
        reason: String,
    },

    /// Keyword requires a payload but the line had none
    MissingPayload { keyword: &'static str },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::InvalidPayload {
                keyword,
                payload,
                reason,
            } => write!(f, "Invalid payload for '{}': {:?} ({})", keyword, payload, reason),
            StateError::MissingPayload { keyword } => {
                write!(f, "Missing payload for '{}'", keyword)
            }
        }
    }
}

impl std::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StateError::InvalidPayload {
            keyword: "signalstrength",
            payload: "strong".to_string(),
            reason: "expected an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid payload for 'signalstrength': \"strong\" (expected an integer)"
        );
        assert_eq!(
            StateError::MissingPayload { keyword: "mode" }.to_string(),
            "Missing payload for 'mode'"
        );
    }
}
