//! Leftover-byte buffering for a socket reader.
//!
//! TCP delivers a byte stream, not messages. Bytes read from the socket land
//! here until a complete frame (a request head or a body of known length) can
//! be carved off the front; whatever follows stays buffered for the next call.

use bytes::{Buf, Bytes, BytesMut};

/// Bytes read from a connection but not yet consumed by a parse step.
#[derive(Debug, Default)]
pub struct ByteStreamBuffer {
    pending: BytesMut,
    // Leading bytes of `pending` already searched for `searched_for`
    searched: usize,
    searched_for: Vec<u8>,
}

impl ByteStreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: BytesMut::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Append freshly read bytes to the end of the buffer.
    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Split off everything before the first occurrence of `delimiter`.
    ///
    /// On a match the prefix is returned, the delimiter itself is discarded
    /// and the remainder stays buffered. Without a match the buffered bytes are
    /// left untouched and `None` is returned.
    ///
    /// Repeated searches for the same delimiter only look at bytes appended
    /// since the last miss, plus enough overlap to catch a delimiter split
    /// across two appends.
    pub fn find_and_split(&mut self, delimiter: &[u8]) -> Option<Bytes> {
        if delimiter.is_empty() {
            return Some(Bytes::new());
        }

        if self.searched_for != delimiter {
            self.searched_for = delimiter.to_vec();
            self.searched = 0;
        }

        let start = self.searched.saturating_sub(delimiter.len() - 1);
        let Some(offset) = self.pending[start..]
            .windows(delimiter.len())
            .position(|window| window == delimiter)
        else {
            self.searched = self.pending.len();
            return None;
        };

        let prefix = self.pending.split_to(start + offset).freeze();
        self.pending.advance(delimiter.len());
        self.searched = 0;
        Some(prefix)
    }

    /// Take exactly `n` bytes from the front, or `None` if fewer are buffered.
    pub fn take(&mut self, n: usize) -> Option<Bytes> {
        if self.pending.len() < n {
            return None;
        }
        self.searched = self.searched.saturating_sub(n);
        Some(self.pending.split_to(n).freeze())
    }

    /// The bytes currently buffered.
    pub fn unconsumed(&self) -> &[u8] {
        &self.pending
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
