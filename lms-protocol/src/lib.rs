//! # LMS Protocol
//!
//! Wire-level building blocks for the Logitech Media Server command-line
//! protocol (the line-oriented text protocol served on TCP port 9090).
//!
//! - [`LineFramer`] turns an arbitrarily chunked byte stream into lines
//! - [`decode_line`] percent-decodes a framed line
//! - [`Command`] renders every command the SDK sends
//!
//! ```rust
//! use lms_protocol::{decode_line, Command, LineFramer, PlayerId, Query};
//!
//! let mut framer = LineFramer::new();
//! framer.push(b"aa%3Abb%3Acc%3Add%3Aee%3Aff power 1\n");
//!
//! let raw = framer.next_line().unwrap().unwrap();
//! assert_eq!(decode_line(&raw).unwrap(), "aa:bb:cc:dd:ee:ff power 1");
//!
//! let id = PlayerId::new("aa:bb:cc:dd:ee:ff");
//! assert_eq!(Command::query(&id, Query::Mode).to_string(), "aa:bb:cc:dd:ee:ff mode ?");
//! ```

pub mod command;
pub mod decode;
pub mod error;
pub mod framer;
pub mod player_id;

pub use command::{Command, Query};
pub use decode::{decode_line, encode_argument};
pub use error::{ProtocolError, Result};
pub use framer::{LineFramer, Lines};
pub use player_id::PlayerId;

/// Default TCP port of the server's command-line interface
pub const DEFAULT_PORT: u16 = 9090;
