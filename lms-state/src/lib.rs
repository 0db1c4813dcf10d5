//! LMS State
//!
//! Protocol state for a Logitech Media Server connection: which players exist,
//! what each one reports, and where the discovery handshake stands.
//!
//! # Architecture
//!
//! ```text
//! decoded line → Session::handle_line → dispatch → PlayerRegistry / Player
//!                        │                                 │
//!                        └── Vec<Effect> (to the runtime)  └── StateChange (broadcast)
//! ```
//!
//! Nothing here performs IO. The runtime in `lms-sdk` feeds decoded lines in
//! and executes the returned effects, which keeps every protocol rule
//! testable without a socket.
//!
//! # Quick Start
//!
//! ```rust
//! use lms_state::{Effect, Session, SessionOptions, SessionState};
//!
//! let mut session = Session::new(SessionOptions::default());
//! let effects = session.start();
//! assert_eq!(effects.len(), 1);
//!
//! session.handle_line("player count 1").unwrap();
//! let outcome = session.handle_line("player id 0 aa:bb:cc:dd:ee:ff").unwrap();
//!
//! assert_eq!(session.state(), SessionState::Listening);
//! assert!(outcome
//!     .effects
//!     .iter()
//!     .any(|e| matches!(e, Effect::StartPolling(_))));
//! ```

pub mod change;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod registry;
pub mod session;

pub use change::StateChange;
pub use dispatch::{Dispatch, Outcome};
pub use error::{Result, StateError};
pub use model::{Forwarded, Mode, Player, PlayerProperty, VolumeUpdate};
pub use registry::{PlayerRegistry, RegisterOutcome, Registration};
pub use session::{
    Credentials, Effect, Session, SessionOptions, SessionState, DEFAULT_EVENT_BUFFER_SIZE,
    DEFAULT_MODE_QUERY_DELAY,
};

pub use lms_protocol::PlayerId;

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::change::StateChange;
    pub use crate::model::{Mode, Player, PlayerProperty};
    pub use crate::registry::PlayerRegistry;
    pub use crate::session::{Effect, Session, SessionOptions, SessionState};
    pub use lms_protocol::PlayerId;
}
