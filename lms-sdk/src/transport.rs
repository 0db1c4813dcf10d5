//! Async adapter between a byte stream and decoded lines

use std::io;

use lms_protocol::{decode_line, LineFramer};
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 4096;

/// Reads a stream and yields percent-decoded lines in arrival order
pub struct LineReader<R> {
    reader: R,
    framer: LineFramer,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_length: Option<usize>) -> Self {
        let framer = match max_line_length {
            Some(limit) => LineFramer::with_max_line_length(limit),
            None => LineFramer::new(),
        };

        Self {
            reader,
            framer,
            chunk: vec![0; READ_CHUNK].into_boxed_slice(),
        }
    }

    /// Wait for the next line
    ///
    /// The outer `io::Result` is the transport; `Ok(None)` means the peer
    /// closed the stream. The inner result reports a line that could not be
    /// framed or decoded, after which reading can continue.
    pub async fn next_line(&mut self) -> io::Result<Option<lms_protocol::Result<String>>> {
        loop {
            if let Some(framed) = self.framer.next_line() {
                return Ok(Some(framed.and_then(|raw| decode_line(&raw))));
            }

            let read = self.reader.read(&mut self.chunk).await?;
            if read == 0 {
                if self.framer.buffered_len() > 0 {
                    tracing::debug!(
                        bytes = self.framer.buffered_len(),
                        "Discarding unterminated line at end of stream"
                    );
                }
                return Ok(None);
            }

            self.framer.push(&self.chunk[..read]);
        }
    }
}
