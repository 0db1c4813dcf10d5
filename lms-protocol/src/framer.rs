//! Byte-stream to line framing
//!
//! The server writes one `\n`-terminated line per message but the transport
//! delivers arbitrary chunks. `LineFramer` accumulates those chunks and hands
//! back complete lines, terminator excluded, in arrival order.
//!
//! ```rust
//! use lms_protocol::LineFramer;
//!
//! let mut framer = LineFramer::new();
//! framer.push(b"player count 2\nplayer ");
//! framer.push(b"id 0 aa:bb\n");
//!
//! let lines: Vec<_> = framer.lines().map(|l| l.unwrap()).collect();
//! assert_eq!(lines, vec![b"player count 2".to_vec(), b"player id 0 aa:bb".to_vec()]);
//! ```

use crate::error::{ProtocolError, Result};

const TERMINATOR: u8 = b'\n';

/// Accumulating line framer
///
/// Without a limit the buffer grows until a terminator shows up. With
/// `with_max_line_length` an oversized line is reported once as
/// `ProtocolError::LineTooLong` and then skipped up to its terminator.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Bytes at the front of `buffer` already known to hold no terminator
    scanned: usize,
    max_line_length: Option<usize>,
    /// Set while skipping the tail of an oversized line
    discarding: bool,
}

impl LineFramer {
    /// Create a framer with no line-length bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer that rejects lines longer than `limit` bytes
    pub fn with_max_line_length(limit: usize) -> Self {
        Self {
            max_line_length: Some(limit),
            ..Self::default()
        }
    }

    /// Append a chunk of inbound bytes
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of bytes waiting for a terminator
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete line out of the buffer
    ///
    /// Returns `None` when no terminator is buffered.
    pub fn next_line(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            match self.find_terminator() {
                Some(pos) => {
                    let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                    line.pop();
                    self.scanned = 0;

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }

                    if let Some(limit) = self.max_line_length {
                        if line.len() > limit {
                            return Some(Err(ProtocolError::LineTooLong { limit }));
                        }
                    }

                    return Some(Ok(line));
                }
                None => {
                    if self.discarding {
                        self.buffer.clear();
                        self.scanned = 0;
                        return None;
                    }

                    if let Some(limit) = self.max_line_length {
                        if self.buffer.len() > limit {
                            self.buffer.clear();
                            self.scanned = 0;
                            self.discarding = true;
                            return Some(Err(ProtocolError::LineTooLong { limit }));
                        }
                    }

                    return None;
                }
            }
        }
    }

    /// Drain every complete line currently buffered
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { framer: self }
    }

    fn find_terminator(&mut self) -> Option<usize> {
        let found = self.buffer[self.scanned..]
            .iter()
            .position(|b| *b == TERMINATOR)
            .map(|offset| self.scanned + offset);

        if found.is_none() {
            self.scanned = self.buffer.len();
        }

        found
    }
}

/// Draining iterator returned by [`LineFramer::lines`]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(framer: &mut LineFramer) -> Vec<Result<Vec<u8>>> {
        framer.lines().collect()
    }

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        framer.push(b"listen 1\n");

        assert_eq!(collect(&mut framer), vec![Ok(b"listen 1".to_vec())]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let mut framer = LineFramer::new();
        framer.push(b"player cou");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.buffered_len(), 10);

        framer.push(b"nt 3\n");
        assert_eq!(framer.next_line(), Some(Ok(b"player count 3".to_vec())));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        framer.push(b"a\nb\nc");

        assert_eq!(
            collect(&mut framer),
            vec![Ok(b"a".to_vec()), Ok(b"b".to_vec())]
        );
        assert_eq!(framer.buffered_len(), 1);
    }

    #[test]
    fn test_empty_lines_are_emitted() {
        let mut framer = LineFramer::new();
        framer.push(b"\n\n");

        assert_eq!(collect(&mut framer), vec![Ok(vec![]), Ok(vec![])]);
    }

    #[test]
    fn test_carriage_return_is_kept() {
        let mut framer = LineFramer::new();
        framer.push(b"listen 1\r\n");

        assert_eq!(framer.next_line(), Some(Ok(b"listen 1\r".to_vec())));
    }

    #[test]
    fn test_oversized_complete_line_is_rejected() {
        let mut framer = LineFramer::with_max_line_length(4);
        framer.push(b"toolong\nok\n");

        assert_eq!(
            collect(&mut framer),
            vec![
                Err(ProtocolError::LineTooLong { limit: 4 }),
                Ok(b"ok".to_vec())
            ]
        );
    }

    #[test]
    fn test_oversized_partial_line_is_skipped_until_terminator() {
        let mut framer = LineFramer::with_max_line_length(4);
        framer.push(b"abcdef");
        assert_eq!(
            framer.next_line(),
            Some(Err(ProtocolError::LineTooLong { limit: 4 }))
        );
        assert_eq!(framer.buffered_len(), 0);

        framer.push(b"ghijkl");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.buffered_len(), 0);

        framer.push(b"mn\nnext\n");
        assert_eq!(collect(&mut framer), vec![Ok(b"next".to_vec())]);
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let mut framer = LineFramer::with_max_line_length(4);
        framer.push(b"abcd\n");

        assert_eq!(framer.next_line(), Some(Ok(b"abcd".to_vec())));
    }
}
