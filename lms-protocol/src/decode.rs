//! Percent-decoding of inbound lines
//!
//! The server escapes every token it writes (`00%3A04%3A20...`). Lines are
//! decoded as a whole before any keyword matching. Only `%XX` escapes are
//! expanded: a literal `+` stays a `+`, which matters for relative volume
//! payloads such as `mixer volume +5`.

use percent_encoding::{percent_decode, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{ProtocolError, Result};

/// Characters escaped in outbound command arguments
///
/// The server splits commands on spaces and decodes `%XX` escapes.
pub const ARGUMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'%');

/// Percent-decode one framed line into a UTF-8 string
pub fn decode_line(raw: &[u8]) -> Result<String> {
    percent_decode(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))
}

/// Escape a single outbound argument
pub fn encode_argument(arg: &str) -> String {
    utf8_percent_encode(arg, ARGUMENT).to_string()
}
