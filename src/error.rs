//! Error type shared by the buffer and the reader.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by [`FifoBuffer`](crate::buffer::FifoBuffer) and
/// [`BufferedReader`](crate::BufferedReader).
///
/// Transport errors are passed through untouched as [`Error::Io`], except that a receive which
/// reports [`io::ErrorKind::WouldBlock`] or [`io::ErrorKind::TimedOut`] is classified as
/// [`Error::Timeout`].
#[derive(Debug, Error)]
pub enum Error {
    /// The deadline of a read expired before a delimiter was found.
    #[error("timed out waiting for a line")]
    Timeout,

    /// `limit` bytes were scanned without finding a delimiter.
    #[error("line not found within {limit} bytes")]
    LineTooLong { limit: usize },

    /// The FIFO buffer cannot hold `requested` unread bytes.
    #[error("buffer overflow: {requested} bytes exceeds the maximum capacity of {max_capacity}")]
    Overflow {
        requested: usize,
        max_capacity: usize,
    },

    /// The peer closed the stream before a delimiter arrived.
    #[error("connection closed by peer")]
    Closed,

    /// The reader has been closed locally.
    #[error("reader is closed")]
    Shutdown,

    /// A zero timeout was requested. Use `None` to wait without a deadline.
    #[error("zero timeout is not allowed")]
    InvalidTimeout,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Classify a transport receive error, mapping expired socket timeouts to [`Error::Timeout`].
    pub(crate) fn from_recv(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Io(err),
        }
    }

    /// Returns `true` for [`Error::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Io(inner) => return inner,
            Error::Timeout => io::ErrorKind::TimedOut,
            Error::LineTooLong { .. } => io::ErrorKind::InvalidData,
            Error::Overflow { .. } => io::ErrorKind::OutOfMemory,
            Error::Closed => io::ErrorKind::UnexpectedEof,
            Error::Shutdown => io::ErrorKind::NotConnected,
            Error::InvalidTimeout => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}
