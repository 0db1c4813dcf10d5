use std::io;

use lms_state::SessionState;
use thiserror::Error;

/// Errors returned by `LmsClient`
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration rejected by `ClientConfig::validate` or `from_env`
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// TCP connect failed
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// TCP connect did not finish within `connect_timeout`
    #[error("Timed out connecting to {address}")]
    ConnectTimeout { address: String },

    /// Discovery did not reach `Listening` within `discovery_timeout`
    #[error("Discovery did not complete in time (session state: {state:?})")]
    DiscoveryTimeout { state: SessionState },

    /// The connection is gone
    #[error("Connection to the server is closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
