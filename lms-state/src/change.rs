//! Change notifications published to observers
//!
//! Every notification goes out on a `tokio::sync::broadcast` channel owned
//! by the session. Subscribe via `Session::subscribe()` or
//! `LmsClient::subscribe()`.

use lms_protocol::PlayerId;

use crate::model::PlayerProperty;

/// Represents a state change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Every expected player has been registered (fires once per session)
    DiscoveryComplete { player_count: usize },

    /// A player was added to the registry
    PlayerRegistered { player_id: PlayerId, index: usize },

    /// A player property was written (fires even when the value is unchanged)
    PropertyChanged {
        player_id: PlayerId,
        property: PlayerProperty,
    },

    /// Device-scoped line no keyword handler claimed
    PlayerEvent {
        player_id: PlayerId,
        name: String,
        args: Vec<String>,
    },

    /// Line matched neither a server keyword nor a known player
    UnhandledLine { line: String },

    /// Line could not be framed or decoded
    UndecodableLine { reason: String },

    /// The transport closed or failed; no further lines will arrive
    ConnectionLost { reason: String },
}

impl StateChange {
    /// Player this change concerns, if any
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            StateChange::PlayerRegistered { player_id, .. }
            | StateChange::PropertyChanged { player_id, .. }
            | StateChange::PlayerEvent { player_id, .. } => Some(player_id),
            _ => None,
        }
    }
}
