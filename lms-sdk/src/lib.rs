//! # LMS SDK
//!
//! Async client for the Logitech Media Server command-line interface.
//!
//! `LmsClient` connects, discovers every player the server knows about,
//! keeps their state current from unsolicited server lines and a periodic
//! refresh, and exposes simple player commands.
//!
//! ```rust,ignore
//! use lms_sdk::{ClientConfig, LmsClient, StateChange};
//!
//! lms_sdk::logging::init_logging_from_env()?;
//!
//! let client = LmsClient::connect(ClientConfig::from_env()?).await?;
//! let players = client.wait_for_discovery().await?;
//!
//! let mut changes = client.subscribe();
//! while let Ok(StateChange::PropertyChanged { player_id, property }) = changes.recv().await {
//!     println!("{} {} changed", player_id, property.key());
//! }
//! ```
//!
//! The protocol rules live in `lms-state` and the wire format in
//! `lms-protocol`; both are re-exported here.

mod client;
mod config;
mod error;
pub mod logging;
pub mod transport;
mod worker;

pub use client::LmsClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use logging::{init_logging, init_logging_from_env, init_silent, LoggingError, LoggingMode};

pub use lms_protocol::{Command, PlayerId, ProtocolError, Query, DEFAULT_PORT};
pub use lms_state::{
    Credentials, Mode, Player, PlayerProperty, SessionState, StateChange, StateError,
};

/// Commonly used types
pub mod prelude {
    pub use crate::{ClientConfig, ClientError, LmsClient, Mode, Player, PlayerId, StateChange};
}
