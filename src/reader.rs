use crate::buffer::FifoBuffer;
use crate::constants::{CR, DEFAULT_CAPACITY, DEFAULT_MAX_CAPACITY, LF, MIN_RECV_SIZE};
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::cmp;
use std::io::{self, Read, Write};
use std::time::Duration;

/// A line and raw reader over a blocking [`Transport`].
///
/// Bytes received past a line delimiter are kept in an internal [`FifoBuffer`] and handed out
/// first by the next [`read`](Self::read) or [`read_line`](Self::read_line).
///
/// Dropping the reader closes the transport unless [`close`](Self::close) already did.
pub struct BufferedReader<T: Transport> {
    buffer: FifoBuffer,
    /// Nominal read timeout, `None` for none.
    timeout: Option<Duration>,
    /// Set while the transport's read timeout is shorter than `timeout`.
    timeout_lowered: bool,
    closed: bool,
    transport: T,
}

impl<T: Transport> BufferedReader<T> {
    /// Creates a `BufferedReader` with default configuration.
    ///
    /// The buffer starts at [`DEFAULT_CAPACITY`] and can grow up to [`DEFAULT_MAX_CAPACITY`].
    /// There is no timeout, and the transport's read timeout is cleared to match.
    pub fn new(transport: T) -> Result<BufferedReader<T>> {
        BufferedReader::builder(transport).build()
    }

    /// Returns a [`BufferedReaderBuilder`] for configuring a new `BufferedReader`.
    pub fn builder(transport: T) -> BufferedReaderBuilder<T> {
        BufferedReaderBuilder {
            transport,
            capacity: None,
            max_capacity: None,
            timeout: None,
        }
    }
}

/// A builder for constructing a [`BufferedReader`] with custom settings.
#[must_use]
pub struct BufferedReaderBuilder<T> {
    transport: T,
    capacity: Option<usize>,
    max_capacity: Option<usize>,
    timeout: Option<Duration>,
}

impl<T: Transport> BufferedReaderBuilder<T> {
    /// Sets the initial buffer capacity. Defaults to [`DEFAULT_CAPACITY`].
    pub fn capacity(mut self, cap: usize) -> Self {
        self.capacity = Some(cap);
        self
    }

    /// Sets the maximum buffer capacity. Defaults to [`DEFAULT_MAX_CAPACITY`].
    ///
    /// If it is less than the initial capacity, it is raised to match.
    pub fn max_capacity(mut self, cap: usize) -> Self {
        self.max_capacity = Some(cap);
        self
    }

    /// Sets the read timeout. Without one, reads may block indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`BufferedReader`], applying the timeout to the transport.
    ///
    /// Fails with [`Error::InvalidTimeout`] for a zero timeout.
    pub fn build(mut self) -> Result<BufferedReader<T>> {
        check_timeout(self.timeout)?;
        self.transport.set_read_timeout(self.timeout)?;

        let buffer = FifoBuffer::with_limits(
            self.capacity.unwrap_or(DEFAULT_CAPACITY),
            self.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY),
        );

        Ok(BufferedReader {
            buffer,
            timeout: self.timeout,
            timeout_lowered: false,
            closed: false,
            transport: self.transport,
        })
    }
}

fn check_timeout(timeout: Option<Duration>) -> Result<()> {
    match timeout {
        Some(t) if t.is_zero() => Err(Error::InvalidTimeout),
        _ => Ok(()),
    }
}

/// Drops a trailing `\n`, then a `\r` directly before it.
fn strip_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&LF) {
        line.pop();
        if line.last() == Some(&CR) {
            line.pop();
        }
    }
}

impl<T: Transport> BufferedReader<T> {
    /// Sets the read timeout on both the reader and the transport.
    ///
    /// `None` removes the deadline. A zero duration fails with [`Error::InvalidTimeout`].
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        check_timeout(timeout)?;
        self.ensure_open()?;
        self.transport.set_read_timeout(timeout)?;
        self.timeout = timeout;
        self.timeout_lowered = false;
        Ok(())
    }

    /// Returns the configured read timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the bytes buffered for the next read.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.peek()
    }

    /// Gets a reference to the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads up to `size` bytes.
    ///
    /// Buffered bytes are returned first without touching the transport, even if there are fewer
    /// than `size` of them. With an empty buffer, exactly one receive is issued under the current
    /// timeout and whatever it yields is returned. An empty result means the peer closed.
    pub fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if !self.buffer.is_empty() {
            return Ok(self.buffer.pop(size));
        }

        let mut data = vec![0; size];
        let n = self.recv(&mut data, None)?;
        data.truncate(n);
        Ok(data)
    }

    /// Reads one line of at most `limit` bytes, delimiter included.
    ///
    /// The returned line has its `\n` removed, along with a `\r` right before it. Bytes received
    /// after the delimiter stay buffered for the next call.
    ///
    /// The timeout bounds the whole call, not each receive: between receives the transport's read
    /// timeout is lowered to whatever is left, and it is put back to the configured value before
    /// returning, whether the call succeeded or not.
    ///
    /// # Errors
    ///
    /// - [`Error::LineTooLong`] if `limit` bytes arrive without a delimiter. Those bytes are
    ///   dropped.
    /// - [`Error::Timeout`] if the deadline passes first.
    /// - [`Error::Closed`] if the peer closes the stream first.
    /// - [`Error::Overflow`] if the bytes past the delimiter do not fit in the buffer.
    ///
    /// On a timeout, close or transport error the partial line is put back into the buffer, so
    /// nothing received is lost and a later call picks the line up where this one stopped. This
    /// includes a failure to restore the read timeout after the whole line arrived.
    pub fn read_line(&mut self, limit: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;

        let mut line = self.buffer.pop_line();
        if line.last() == Some(&LF) {
            strip_line_ending(&mut line);
            return Ok(line);
        }

        let filled = self.fill_line(&mut line, limit);
        let restored = self.restore_timeout();
        let result = match (filled, restored) {
            // Split only after a successful restore, so a failed one puts the whole line back
            (Ok(end), Ok(())) => self.split_line(&mut line, end),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), restored) => {
                if let Err(e) = restored {
                    tracing::warn!(error = %e, "failed to restore read timeout");
                }
                Err(err)
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(len = line.len(), "read line");
                Ok(line)
            }
            Err(err) => {
                if err.is_timeout() {
                    tracing::debug!(partial = line.len(), "read_line timed out");
                }
                if !matches!(err, Error::LineTooLong { .. }) {
                    // The buffer was drained into `line`, so byte order is kept.
                    if let Err(overflow) = self.buffer.push(&line) {
                        tracing::warn!(dropped = line.len(), %overflow, "partial line lost");
                    }
                }
                Err(err)
            }
        }
    }

    /// Receives into `line` until it holds a `\n`, and returns the index of that `\n`.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Offsets stay within `line`, which is resized before each receive"
    )]
    fn fill_line(&mut self, line: &mut Vec<u8>, limit: usize) -> Result<usize> {
        let deadline = Deadline::start(self.timeout);
        let mut remaining = limit.saturating_sub(line.len());
        if remaining == 0 {
            return Err(Error::LineTooLong { limit });
        }

        loop {
            // Larger partial lines are pulled in with larger receives
            let want = cmp::min(cmp::max(line.len(), MIN_RECV_SIZE), remaining);
            let start = line.len();
            line.resize(start + want, 0);

            let received = self.recv(&mut line[start..], Some(&deadline));
            line.truncate(start + *received.as_ref().unwrap_or(&0));
            let received = received?;
            if received == 0 {
                return Err(Error::Closed);
            }
            remaining -= received;
            tracing::trace!(received, remaining, "received line chunk");

            if let Some(i) = memchr::memchr(LF, &line[start..]) {
                return Ok(start + i);
            }

            if remaining == 0 {
                return Err(Error::LineTooLong { limit });
            }

            self.lower_timeout(&deadline)?;
        }
    }

    /// Moves the bytes after the `\n` at `end` into the buffer and strips the line ending.
    ///
    /// `line` is left whole if the buffer cannot take the remainder.
    #[expect(clippy::arithmetic_side_effects, reason = "`end` indexes a byte of `line`")]
    fn split_line(&mut self, line: &mut Vec<u8>, end: usize) -> Result<()> {
        self.buffer.push(line.get(end + 1..).unwrap_or_default())?;
        line.truncate(end + 1);
        strip_line_ending(line);
        Ok(())
    }

    /// Shortens the transport's read timeout to what is left of `deadline`.
    fn lower_timeout(&mut self, deadline: &Deadline) -> Result<()> {
        if let Some(left) = deadline.remaining()? {
            tracing::trace!(?left, "lowering read timeout");
            self.transport.set_read_timeout(Some(left))?;
            self.timeout_lowered = true;
        }
        Ok(())
    }

    /// Puts the transport's read timeout back to the nominal value.
    fn restore_timeout(&mut self) -> Result<()> {
        if self.timeout_lowered {
            self.transport.set_read_timeout(self.timeout)?;
            self.timeout_lowered = false;
        }
        Ok(())
    }

    /// One receive, retried only if interrupted by a signal.
    ///
    /// With a `deadline`, a retry first lowers the read timeout to what is left of it, and fails
    /// with [`Error::Timeout`] if nothing is.
    fn recv(&mut self, buf: &mut [u8], deadline: Option<&Deadline>) -> Result<usize> {
        loop {
            match self.transport.recv(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    if let Some(deadline) = deadline {
                        self.lower_timeout(deadline)?;
                    }
                }
                Err(e) => return Err(Error::from_recv(e)),
            }
        }
    }

    /// Sends some prefix of `data` through the transport.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.transport.send(data)?)
    }

    /// Sends all of `data`, calling the transport as many times as it takes.
    pub fn send_all(&mut self, mut data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        while !data.is_empty() {
            match self.transport.send(data) {
                Ok(0) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )));
                }
                Ok(n) => data = data.get(n..).unwrap_or_default(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Closes the transport and discards buffered bytes.
    ///
    /// Only the first call reaches the transport. Later calls, and the drop of the reader, do
    /// nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buffer.clear();
        self.transport.close()?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Shutdown);
        }
        Ok(())
    }
}

impl<T: Transport> Drop for BufferedReader<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close transport");
        }
    }
}

#[cfg(unix)]
impl<T: Transport + std::os::fd::AsRawFd> BufferedReader<T> {
    /// Returns the raw file descriptor of the transport, for readiness polling.
    pub fn fileno(&self) -> std::os::fd::RawFd {
        self.transport.as_raw_fd()
    }
}

#[cfg(windows)]
impl<T: Transport + std::os::windows::io::AsRawSocket> BufferedReader<T> {
    /// Returns the raw socket handle of the transport, for readiness polling.
    pub fn fileno(&self) -> std::os::windows::io::RawSocket {
        self.transport.as_raw_socket()
    }
}

#[cfg(unix)]
impl<T: Transport + std::os::fd::AsRawFd> std::os::fd::AsRawFd for BufferedReader<T> {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.transport.as_raw_fd()
    }
}

#[cfg(windows)]
impl<T: Transport + std::os::windows::io::AsRawSocket> std::os::windows::io::AsRawSocket
    for BufferedReader<T>
{
    fn as_raw_socket(&self) -> std::os::windows::io::RawSocket {
        self.transport.as_raw_socket()
    }
}

impl<T: Transport> Read for BufferedReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if self.buffer.is_empty() {
            // Let the transport take things from here
            return Ok(self.recv(buf, None)?);
        }

        let mut data = self.buffer.peek();
        let bytes_read = data.read(buf)?;
        self.buffer.consume(bytes_read);
        Ok(bytes_read)
    }
}

impl<T: Transport> Write for BufferedReader<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.send(buf)?)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Ok(self.send_all(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
