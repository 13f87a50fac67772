//! Wall-clock budget for reads that span several blocking receives.

use crate::error::{Error, Result};
use std::time::{Duration, Instant};

/// Tracks how much of a timeout is left since an operation started.
///
/// A `None` timeout never expires.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    timeout: Option<Duration>,
    start: Instant,
}

impl Deadline {
    /// Starts the clock now.
    pub(crate) fn start(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            start: Instant::now(),
        }
    }

    /// Time spent since the clock started.
    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before the deadline, `Ok(None)` without one.
    ///
    /// Fails with [`Error::Timeout`] once nothing is left, so a zero or negative budget is never
    /// handed to the transport.
    pub(crate) fn remaining(&self) -> Result<Option<Duration>> {
        let Some(timeout) = self.timeout else {
            return Ok(None);
        };
        match timeout.checked_sub(self.elapsed()) {
            Some(left) if !left.is_zero() => Ok(Some(left)),
            _ => Err(Error::Timeout),
        }
    }
}
