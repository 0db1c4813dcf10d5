//! Error types for the lms-protocol crate.

/// Errors produced while framing or decoding inbound protocol data.
///
/// None of these are fatal to a session: each one concerns a single line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A line grew past the configured limit without a terminator
    #[error("Line exceeds maximum length of {limit} bytes")]
    LineTooLong {
        /// The configured limit in bytes
        limit: usize,
    },

    /// The percent-decoded line is not valid UTF-8
    #[error("Line is not valid UTF-8 after percent-decoding: {0}")]
    InvalidUtf8(String),
}

/// Convenience type alias for Results using ProtocolError.
pub type Result<T> = std::result::Result<T, ProtocolError>;
