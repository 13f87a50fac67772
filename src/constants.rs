//! Size constants for the line buffer and the receive loop.
//!
//! # Size Hierarchy
//!
//! - [`MIN_RECV_SIZE`]: The smallest chunk requested from the transport while hunting for a
//!   delimiter (1 KiB)
//! - [`DEFAULT_CAPACITY`]: The initial capacity of the FIFO buffer (2 KiB)
//! - [`DEFAULT_MAX_CAPACITY`]: The default upper bound the FIFO buffer may grow to (64 KiB)
//!
//! # Invariant
//!
//! - `MIN_RECV_SIZE` is a power of 2 and a multiple of 1 KiB (1024 bytes)
//! - `DEFAULT_CAPACITY >= MIN_RECV_SIZE`, so one minimum chunk always fits an empty buffer
//! - `DEFAULT_MAX_CAPACITY > DEFAULT_CAPACITY` and is a power of 2 multiple of it, so growing by
//!   doubling lands exactly on the maximum

/// Minimum receive size (1 KiB) used by
/// [`BufferedReader::read_line`](crate::BufferedReader::read_line).
///
/// Each receive asks for `max(accumulated, MIN_RECV_SIZE)` bytes, capped by what is left of the
/// line limit, so long lines are pulled in with a geometrically growing request.
pub const MIN_RECV_SIZE: usize =
    // 2^10 = 1024 = 1 KiB
    1 << 10;

/// Initial capacity (2 KiB) of the FIFO buffer when none is configured.
pub const DEFAULT_CAPACITY: usize = MIN_RECV_SIZE * 2;

/// Default maximum capacity (64 KiB) of the FIFO buffer.
///
/// Pushing more unread bytes than this fails with [`Error::Overflow`](crate::Error::Overflow).
pub const DEFAULT_MAX_CAPACITY: usize =
    // 2 KiB * 2^5 = 64 KiB
    DEFAULT_CAPACITY * (1 << 5);

/// The line delimiter.
pub const LF: u8 = b'\n';

/// Stripped when it directly precedes [`LF`].
pub const CR: u8 = b'\r';
