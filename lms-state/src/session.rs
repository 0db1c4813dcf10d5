//! Session state machine
//!
//! `Session` owns the player registry and drives the discovery handshake:
//!
//! ```text
//! Connecting ──start()──> AwaitingLogin ──login──> AwaitingCount ──player count──> AwaitingIds
//!            └──(no credentials)──────────────────┘                                  │
//!                                                       last player id ──> Listening ┘
//! ```
//!
//! The session never performs IO. `start()` and `handle_line()` return the
//! effects (commands, delayed commands, polling timers) the runtime must
//! carry out, in order.

use std::fmt;
use std::time::Duration;

use lms_protocol::{Command, PlayerId};
use tokio::sync::broadcast;

use crate::change::StateChange;
use crate::dispatch::{self, Outcome};
use crate::error::Result;
use crate::model::Player;
use crate::registry::PlayerRegistry;

/// Delay between a `power 1` report and the follow-up `mode ?` query
pub const DEFAULT_MODE_QUERY_DELAY: Duration = Duration::from_millis(1500);

/// Default capacity of the change broadcast channel
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1000;

/// Server login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"******")
            .finish()
    }
}

/// Options fixed for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Log in before discovery when set
    pub credentials: Option<Credentials>,
    /// Delay before asking for the mode of a player that just powered on
    pub mode_query_delay: Duration,
    /// Capacity of the change broadcast channel
    pub event_buffer_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            mode_query_delay: DEFAULT_MODE_QUERY_DELAY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

/// Position in the discovery handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    AwaitingLogin,
    AwaitingCount,
    AwaitingIds,
    /// Discovery complete; sticky for the rest of the session
    Listening,
}

/// Work the runtime must perform on behalf of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a command to the write queue
    Send(Command),
    /// Append a command to the write queue after `delay`
    SendAfter { delay: Duration, command: Command },
    /// Start the periodic refresh timer for a newly registered player
    StartPolling(PlayerId),
    /// Stop the refresh timer of a player dropped by a recount
    StopPolling(PlayerId),
}

/// One connection's worth of protocol state
pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) registry: PlayerRegistry,
    pub(crate) options: SessionOptions,
    pub(crate) changes_tx: broadcast::Sender<StateChange>,
}

impl Session {
    /// Create a session in the `Connecting` state
    pub fn new(options: SessionOptions) -> Self {
        let (changes_tx, _) = broadcast::channel(options.event_buffer_size.max(1));

        Self {
            state: SessionState::Connecting,
            registry: PlayerRegistry::new(),
            options,
            changes_tx,
        }
    }

    /// Kick off the handshake
    ///
    /// Issues `login` when credentials are configured, otherwise
    /// `player count ?`. Calling it again after the first time does nothing.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Connecting {
            tracing::debug!(state = ?self.state, "Session already started");
            return Vec::new();
        }

        let command = match &self.options.credentials {
            Some(credentials) => {
                self.state = SessionState::AwaitingLogin;
                Command::Login {
                    username: credentials.username.clone(),
                    password: credentials.password.clone(),
                }
            }
            None => {
                self.state = SessionState::AwaitingCount;
                Command::PlayerCount
            }
        };

        tracing::debug!(state = ?self.state, "Session started");
        vec![Effect::Send(command)]
    }

    /// Dispatch one decoded line
    ///
    /// An `Err` means the line matched a handler but its payload was
    /// unusable; nothing was mutated.
    pub fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        dispatch::dispatch(self, line)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Player count announced by the server, `None` before discovery
    pub fn expected_count(&self) -> Option<usize> {
        self.registry.expected()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.registry.get(id)
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Subscribe to all state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes_tx.subscribe()
    }

    /// Publish a change to every subscriber
    ///
    /// Used by the runtime for transport-level notifications.
    pub fn publish(&self, change: StateChange) {
        let _ = self.changes_tx.send(change);
    }

    pub(crate) fn enter_listening(&mut self, effects: &mut Vec<Effect>) {
        self.state = SessionState::Listening;
        effects.push(Effect::Send(Command::Listen));

        let player_count = self.registry.len();
        tracing::info!(player_count, "Discovery complete");
        self.publish(StateChange::DiscoveryComplete { player_count });
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish()
    }
}
