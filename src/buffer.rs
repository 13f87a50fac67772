//! FIFO byte buffer holding bytes received past a line delimiter.
//!
//! The [`FifoBuffer`] type keeps a window `[start, end)` of unread bytes inside a backing store.
//! Consuming bytes only advances `start`, so discarding read data is O(1). Space is reclaimed by
//! compacting lazily, when a [`push`](FifoBuffer::push) would not fit at the tail. It is used as
//! the internal buffer of [`BufferedReader`](crate::BufferedReader).
//!
//! # Example
//!
//! ```
//! use buffered_socket::buffer::FifoBuffer;
//!
//! let mut buffer = FifoBuffer::new();
//! buffer.push(b"hello\nwor").unwrap();
//! buffer.push(b"ld").unwrap();
//!
//! // A complete line comes out with its delimiter
//! assert_eq!(buffer.pop_line(), b"hello\n");
//!
//! // Without a delimiter everything that is left is drained
//! assert_eq!(buffer.pop_line(), b"world");
//! assert!(buffer.is_empty());
//! ```

use crate::constants::{DEFAULT_CAPACITY, DEFAULT_MAX_CAPACITY, LF};
use crate::error::{Error, Result};
use std::cmp;

/// An ordered byte queue with bounded growth.
///
/// # Capacity Management
///
/// - **Compaction**: When appended data does not fit behind the unread window, the unread bytes
///   are moved to the start of the store first.
/// - **Growth**: If compaction is not enough, the store grows to the next power of two that fits,
///   clamped to [`max_capacity()`](Self::max_capacity).
/// - **Overflow**: A push that would take the unread total beyond `max_capacity()` fails with
///   [`Error::Overflow`] and leaves the buffer untouched.
///
/// # Invariants
///
/// This buffer maintains the invariant `0 <= self.start <= self.end <= self.cap == self.buf.len()
/// <= self.max_cap` at all times. Bytes outside `start..end` are garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoBuffer {
    /// Backing store.
    buf: Vec<u8>,
    /// Current capacity of the store.
    cap: usize,
    /// Upper bound the store may grow to.
    max_cap: usize,
    /// Offset of the first unread byte.
    start: usize,
    /// Offset one past the last unread byte.
    end: usize,
}

impl Default for FifoBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FifoBuffer {
    /// Creates a buffer with [`DEFAULT_CAPACITY`] that may grow up to [`DEFAULT_MAX_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use buffered_socket::buffer::FifoBuffer;
    /// # use buffered_socket::constants::DEFAULT_CAPACITY;
    /// let buffer = FifoBuffer::new();
    /// assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
    /// assert!(buffer.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_MAX_CAPACITY)
    }

    /// Creates a buffer with exactly `capacity` bytes pre-allocated and the default maximum.
    ///
    /// If `capacity` is larger than [`DEFAULT_MAX_CAPACITY`], the maximum is raised to match.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, DEFAULT_MAX_CAPACITY)
    }

    /// Creates a buffer with `capacity` bytes pre-allocated that may grow up to `max_capacity`.
    ///
    /// If `max_capacity` is less than `capacity`, it is raised to match. Passing the same value
    /// for both gives a fixed-capacity buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// # use buffered_socket::buffer::FifoBuffer;
    /// let mut buffer = FifoBuffer::with_limits(4, 4);
    /// buffer.push(b"abcd").unwrap();
    /// assert!(buffer.push(b"e").is_err());
    /// ```
    pub fn with_limits(capacity: usize, max_capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            cap: capacity,
            max_cap: cmp::max(capacity, max_capacity),
            start: 0,
            end: 0,
        }
    }

    /// Returns the current size of the backing store in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns the most unread bytes this buffer will ever hold.
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_cap
    }

    /// Returns the number of unread bytes.
    #[expect(clippy::arithmetic_side_effects, reason = "Safe by invariant")]
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if there are no unread bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the unread bytes without consuming them.
    #[expect(clippy::indexing_slicing, reason = "Safe by invariant")]
    #[inline]
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Discards all unread bytes. The capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Moves the unread bytes to the start of the backing store.
    ///
    /// # Examples
    ///
    /// ```
    /// # use buffered_socket::buffer::FifoBuffer;
    /// let mut buffer = FifoBuffer::new();
    /// buffer.push(b"Hello, World!").unwrap();
    /// buffer.pop(7);
    ///
    /// buffer.compact();
    /// assert_eq!(buffer.peek(), b"World!");
    /// ```
    #[expect(clippy::arithmetic_side_effects, reason = "Safe by invariant")]
    pub fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    /// Appends `data` behind the unread bytes.
    ///
    /// Compacts, then grows the backing store when the tail has no room. Fails with
    /// [`Error::Overflow`] if the unread total would exceed [`max_capacity()`](Self::max_capacity),
    /// in which case nothing is appended.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Bounds are checked against the capacity first"
    )]
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let requested = self.len().saturating_add(data.len());
        if requested > self.max_cap {
            return Err(Error::Overflow {
                requested,
                max_capacity: self.max_cap,
            });
        }
        if data.is_empty() {
            return Ok(());
        }

        if self.cap - self.end < data.len() {
            self.compact();
            if self.cap < requested {
                self.grow(requested);
            }
        }

        let end = self.end + data.len();
        self.buf[self.end..end].copy_from_slice(data);
        self.end = end;
        Ok(())
    }

    /// Removes and returns up to `n` bytes from the front.
    ///
    /// Returns fewer than `n` bytes, possibly none, when fewer are buffered.
    ///
    /// # Examples
    ///
    /// ```
    /// # use buffered_socket::buffer::FifoBuffer;
    /// let mut buffer = FifoBuffer::new();
    /// buffer.push(b"abc").unwrap();
    /// assert_eq!(buffer.pop(2), b"ab");
    /// assert_eq!(buffer.pop(10), b"c");
    /// assert_eq!(buffer.pop(10), b"");
    /// ```
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe by invariant"
    )]
    pub fn pop(&mut self, n: usize) -> Vec<u8> {
        let n = cmp::min(n, self.len());
        let out = self.buf[self.start..self.start + n].to_vec();
        self.consume(n);
        out
    }

    /// Removes and returns the bytes up to and including the first `\n`.
    ///
    /// Without a `\n`, all unread bytes are returned instead so the caller can keep scanning with
    /// fresh data. Check the last byte of the result to tell the two cases apart.
    #[expect(clippy::arithmetic_side_effects, reason = "Index is within the window")]
    pub fn pop_line(&mut self) -> Vec<u8> {
        match memchr::memchr(LF, self.peek()) {
            Some(i) => self.pop(i + 1),
            None => self.pop(self.len()),
        }
    }

    /// Marks `amt` unread bytes as consumed, advancing past them without copying.
    ///
    /// If `amt` exceeds the unread bytes, everything is consumed. Once drained the window resets
    /// to the start of the store.
    #[expect(clippy::arithmetic_side_effects, reason = "Safe by invariant")]
    #[inline]
    pub fn consume(&mut self, amt: usize) {
        self.start = cmp::min(self.start + amt, self.end);
        if self.start == self.end {
            self.clear();
        }
    }

    /// Grows the backing store to fit `target` bytes, in power of two steps up to the maximum.
    fn grow(&mut self, target: usize) {
        let cap = target
            .checked_next_power_of_two()
            .map_or(self.max_cap, |cap| cmp::min(cap, self.max_cap));
        tracing::trace!(from = self.cap, to = cap, "growing line buffer");
        self.buf.resize(cap, 0);
        self.cap = cap;
    }
}

#[cfg(test)]
mod tests;
