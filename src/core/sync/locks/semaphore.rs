/*!
 * Shared Semaphore
 *
 * Bounded counting semaphore over four words:
 *
 * | word | field         | notes                                   |
 * |------|---------------|-----------------------------------------|
 * | 0    | state         | tag; `Initializing` while being placed  |
 * | 1    | max count     | immutable once placed                   |
 * | 2    | current count | permits available; waiters block on it  |
 * | 3    | wait count    | agents registered as (about to be) parked |
 *
 * A waiter registers in the wait count before re-checking the current
 * count and parking on it, and a releaser bumps the current count before
 * reading the wait count. With sequentially consistent accesses on both
 * sides, at least one of them sees the other, so a release never misses a
 * parked waiter.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::MAX_COUNT;
use crate::core::sync::codec::{encode, PrimitiveKind};
use crate::core::sync::config::SyncConfig;
use crate::core::sync::deadline::Deadline;
use crate::core::sync::region::SharedRegion;
use crate::core::sync::spinwait::SpinWait;
use crate::core::sync::traits::{claim_multi, locate, Claim, SharedPrimitive};
use crate::core::sync::word::AtomicWord;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, trace, warn};

const READY: u32 = encode(PrimitiveKind::Semaphore, 0);
const INITIALIZING: u16 = 1;

const MAX_COUNT_FIELD: usize = 1;
const CURRENT_COUNT_FIELD: usize = 2;
const WAIT_COUNT_FIELD: usize = 3;

/// Counting semaphore over shared memory
///
/// # Example
///
/// ```
/// use agent_sync::Semaphore;
/// use std::time::Duration;
///
/// let sem = Semaphore::new(1, 2).unwrap();
/// assert!(sem.wait(None));
/// assert!(!sem.wait(Some(Duration::from_millis(10))));
/// assert_eq!(sem.release(2).unwrap(), 0);
/// assert!(sem.release(1).is_err()); // would exceed the max count
/// ```
#[derive(Clone)]
pub struct Semaphore {
    state: AtomicWord,
    max_count: AtomicWord,
    current_count: AtomicWord,
    wait_count: AtomicWord,
    config: SyncConfig,
}

impl Semaphore {
    /// Create a semaphore in a freshly allocated region
    pub fn new(initial_count: u32, max_count: u32) -> SyncResult<Self> {
        let region = SharedRegion::new(Self::SIZE);
        Self::new_in(&region, 0, initial_count, max_count)
    }

    /// Place a new semaphore at `byte_offset` of a caller-supplied region
    ///
    /// The span must still be zeroed; placing over an existing semaphore is
    /// an `InvalidState` error.
    pub fn new_in(
        region: &SharedRegion,
        byte_offset: usize,
        initial_count: u32,
        max_count: u32,
    ) -> SyncResult<Self> {
        validate_counts(initial_count, max_count)?;
        let sem = Self::at(locate(region, byte_offset, Self::KIND)?);
        match claim_multi(&sem.state, Self::KIND, INITIALIZING)? {
            Claim::Fresh => {
                sem.publish(initial_count, max_count);
                debug!(offset = byte_offset, initial_count, max_count, "semaphore created");
                Ok(sem)
            }
            Claim::Existing(_) => Err(SyncError::InvalidState(format!(
                "region already holds a semaphore at offset {byte_offset}"
            ))),
        }
    }

    /// Replace this handle's spin configuration
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    fn at(state: AtomicWord) -> Self {
        Self {
            max_count: state.offset_by(MAX_COUNT_FIELD),
            current_count: state.offset_by(CURRENT_COUNT_FIELD),
            wait_count: state.offset_by(WAIT_COUNT_FIELD),
            state,
            config: SyncConfig::default(),
        }
    }

    fn publish(&self, initial_count: u32, max_count: u32) {
        self.max_count.store(max_count, Ordering::Relaxed);
        self.current_count.store(initial_count, Ordering::Relaxed);
        self.wait_count.store(0, Ordering::Relaxed);
        self.state.store(READY, Ordering::Release);
    }

    /// Permits currently available
    pub fn count(&self) -> u32 {
        self.current_count.load(Ordering::Acquire)
    }

    /// Upper bound on available permits
    pub fn max_count(&self) -> u32 {
        self.max_count.load(Ordering::Acquire)
    }

    /// Take a permit only if one is available right now
    pub fn try_wait(&self) -> bool {
        let mut current = self.current_count.load(Ordering::Acquire);
        while current > 0 {
            match self.current_count.compare_exchange(current, current - 1) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Block until a permit is taken or `timeout` elapses
    ///
    /// Returns `true` if a permit was taken.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        if self.try_wait() {
            return true;
        }

        let mut spin = SpinWait::with_policy(self.config.spin);
        for _ in 0..self.config.spin_limit {
            spin.spin_once();
            if self.try_wait() {
                return true;
            }
        }

        trace!(offset = self.state.byte_offset(), "semaphore empty, blocking");
        let deadline = Deadline::after(timeout);
        loop {
            self.wait_count.fetch_add(1);
            if self.try_wait() {
                self.wait_count.fetch_sub(1);
                return true;
            }
            if deadline.expired() {
                self.wait_count.fetch_sub(1);
                return false;
            }

            let outcome = self.current_count.wait(0, deadline.timeout());
            self.wait_count.fetch_sub(1);

            if self.try_wait() {
                return true;
            }
            if outcome.is_timed_out() {
                trace!(offset = self.state.byte_offset(), "semaphore wait timed out");
                return false;
            }
        }
    }

    /// Return `count` permits, returning the previous count
    ///
    /// Releasing past the max count is a `CapacityExceeded` error and leaves
    /// the count untouched.
    pub fn release(&self, count: u32) -> SyncResult<u32> {
        if count == 0 {
            return Err(SyncError::InvalidArgument(
                "release count must be at least 1".into(),
            ));
        }

        let max_count = self.max_count();
        let mut previous = self.current_count.load(Ordering::Acquire);
        loop {
            if max_count - previous < count {
                warn!(
                    offset = self.state.byte_offset(),
                    max_count, previous, count, "semaphore release past max count"
                );
                return Err(SyncError::CapacityExceeded(format!(
                    "releasing {count} permits would exceed max count {max_count} (current {previous})"
                )));
            }
            match self.current_count.compare_exchange(previous, previous + count) {
                Ok(_) => break,
                Err(actual) => previous = actual,
            }
        }

        if self.wait_count.load(Ordering::SeqCst) > 0 {
            self.current_count.wake(count as usize);
        }
        Ok(previous)
    }
}

fn validate_counts(initial_count: u32, max_count: u32) -> SyncResult<()> {
    if max_count == 0 || max_count > MAX_COUNT {
        return Err(SyncError::InvalidArgument(format!(
            "max count must be between 1 and {MAX_COUNT}, got {max_count}"
        )));
    }
    if initial_count > max_count {
        return Err(SyncError::InvalidArgument(format!(
            "initial count {initial_count} exceeds max count {max_count}"
        )));
    }
    Ok(())
}

impl SharedPrimitive for Semaphore {
    const KIND: PrimitiveKind = PrimitiveKind::Semaphore;

    /// Attach to a semaphore; a zeroed span becomes one with no permits
    /// available and a max count of 1
    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let sem = Self::at(locate(region, byte_offset, Self::KIND)?);
        if let Claim::Fresh = claim_multi(&sem.state, Self::KIND, INITIALIZING)? {
            sem.publish(0, 1);
        }
        debug!(offset = byte_offset, "semaphore attached");
        Ok(sem)
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("byte_offset", &self.byte_offset())
            .field("count", &self.count())
            .field("max_count", &self.max_count())
            .finish()
    }
}
