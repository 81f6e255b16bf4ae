/*!
 * Deadlines
 *
 * Converts a caller's relative timeout into the remaining time for each
 * retry of a blocking loop.
 */

use std::time::{Duration, Instant};

/// Absolute end of a blocking operation; `None` never expires
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now; an overflowing timeout never expires
    pub(crate) fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.and_then(|t| Instant::now().checked_add(t)))
    }

    pub(crate) fn expired(&self) -> bool {
        matches!(self.0, Some(at) if Instant::now() >= at)
    }

    /// Time left to pass to a blocking wait (`None` waits forever)
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }
}
