//! Message framing on top of a byte stream.

use std::io;
use std::time::Duration;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::parser::ByteStreamBuffer;
use crate::server::error::ReadError;

/// Maximum number of bytes requested from the stream per read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// The blank line that terminates a request head.
const BLANK_LINE: &[u8] = b"\r\n\r\n";

/// Reads whole messages off a stream, keeping any over-read bytes for the
/// next call.
#[derive(Debug)]
pub struct FramedReader<S> {
    stream: S,
    buffer: ByteStreamBuffer,
}

impl<S> FramedReader<S>
where
    S: AsyncRead + Unpin,
{
    /// Wrap a stream with an empty leftover buffer.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: ByteStreamBuffer::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Mutable access to the underlying stream, e.g. for writing responses.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give back the underlying stream, dropping any buffered bytes.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Bytes received but not yet returned by any read.
    pub fn leftover(&self) -> &[u8] {
        self.buffer.unconsumed()
    }

    /// Read everything up to the next `\r\n\r\n` and return it as text.
    ///
    /// The delimiter is discarded and bytes after it stay buffered. When
    /// `timeout` is set, every individual read from the stream is bounded by
    /// it; the limit only applies to this call.
    ///
    /// # Errors
    ///
    /// * [`ReadError::Closed`] if the peer closes before a blank line arrives
    /// * [`ReadError::TimedOut`] if a single read waits longer than `timeout`
    /// * [`ReadError::Fault`] on any other I/O error, or if the head is not UTF-8
    pub async fn read_until_blank_line(&mut self, timeout: Option<Duration>) -> Result<String, ReadError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(head) = self.buffer.find_and_split(BLANK_LINE) {
                return String::from_utf8(head.to_vec())
                    .map_err(|e| ReadError::Fault(io::Error::new(io::ErrorKind::InvalidData, e)));
            }
            self.read_some(&mut chunk, timeout).await?;
        }
    }

    /// Read exactly `n` bytes.
    ///
    /// No timeout applies: the peer announced this many bytes, so the reader
    /// waits for them for as long as the connection stays open.
    ///
    /// # Errors
    ///
    /// * [`ReadError::Closed`] if the peer closes first; partial bytes stay buffered
    /// * [`ReadError::Fault`] on any other I/O error
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(bytes) = self.buffer.take(n) {
                return Ok(bytes.to_vec());
            }
            let wanted = (n - self.buffer.len()).min(READ_CHUNK_SIZE);
            self.read_some(&mut chunk[..wanted], None).await?;
        }
    }

    /// One read from the stream into the leftover buffer.
    async fn read_some(&mut self, chunk: &mut [u8], timeout: Option<Duration>) -> Result<usize, ReadError> {
        loop {
            let read = self.stream.read(chunk);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, read)
                    .await
                    .map_err(|_| ReadError::TimedOut(limit))?,
                None => read.await,
            };

            match result {
                Ok(0) => {
                    return Err(ReadError::Closed {
                        leftover: self.buffer.len(),
                    })
                }
                Ok(n) => {
                    trace!("read {n} bytes, {} buffered", self.buffer.len() + n);
                    self.buffer.append(&chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::Fault(e)),
            }
        }
    }
}
