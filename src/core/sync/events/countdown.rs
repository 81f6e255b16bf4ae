/*!
 * Countdown Event
 *
 * One-shot barrier that becomes signaled when its remaining count reaches
 * zero. Three words: the tagged state, the initial count and the remaining
 * count. The remaining count is the serialization point; whoever moves it to
 * zero flips the state to signaled and wakes every waiter.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::MAX_COUNT;
use crate::core::sync::codec::{encode, PrimitiveKind};
use crate::core::sync::deadline::Deadline;
use crate::core::sync::region::SharedRegion;
use crate::core::sync::traits::{claim_multi, locate, Claim, SharedPrimitive};
use crate::core::sync::word::AtomicWord;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, trace, warn};

const NONSIGNALED: u32 = encode(PrimitiveKind::CountdownEvent, 0);
const SIGNALED: u32 = encode(PrimitiveKind::CountdownEvent, 1);
const INITIALIZING: u16 = 2;

const INITIAL_COUNT_FIELD: usize = 1;
const REMAINING_COUNT_FIELD: usize = 2;

/// Decrement-to-zero barrier over shared memory
///
/// # Example
///
/// ```
/// use agent_sync::CountdownEvent;
/// use std::time::Duration;
///
/// let countdown = CountdownEvent::new(2).unwrap();
/// assert!(!countdown.signal(1).unwrap());
/// assert!(!countdown.wait(Some(Duration::from_millis(10))));
/// assert!(countdown.signal(1).unwrap());
/// assert!(countdown.wait(None));
/// ```
#[derive(Clone)]
pub struct CountdownEvent {
    state: AtomicWord,
    initial_count: AtomicWord,
    remaining_count: AtomicWord,
}

impl CountdownEvent {
    /// Create a countdown in a freshly allocated region
    ///
    /// A count of zero is signaled from the start.
    pub fn new(count: u32) -> SyncResult<Self> {
        let region = SharedRegion::new(Self::SIZE);
        Self::new_in(&region, 0, count)
    }

    /// Place a new countdown at `byte_offset` of a zeroed span of `region`
    pub fn new_in(region: &SharedRegion, byte_offset: usize, count: u32) -> SyncResult<Self> {
        if count > MAX_COUNT {
            return Err(SyncError::InvalidArgument(format!(
                "countdown count must be at most {MAX_COUNT}, got {count}"
            )));
        }
        let countdown = Self::at(locate(region, byte_offset, Self::KIND)?);
        match claim_multi(&countdown.state, Self::KIND, INITIALIZING)? {
            Claim::Fresh => {
                countdown.publish(count);
                debug!(offset = byte_offset, count, "countdown event created");
                Ok(countdown)
            }
            Claim::Existing(_) => Err(SyncError::InvalidState(format!(
                "region already holds a countdown event at offset {byte_offset}"
            ))),
        }
    }

    fn at(state: AtomicWord) -> Self {
        Self {
            initial_count: state.offset_by(INITIAL_COUNT_FIELD),
            remaining_count: state.offset_by(REMAINING_COUNT_FIELD),
            state,
        }
    }

    fn publish(&self, count: u32) {
        self.initial_count.store(count, Ordering::Relaxed);
        self.remaining_count.store(count, Ordering::Relaxed);
        let state = if count == 0 { SIGNALED } else { NONSIGNALED };
        self.state.store(state, Ordering::Release);
    }

    /// Count the event was created with
    pub fn initial_count(&self) -> u32 {
        self.initial_count.load(Ordering::Acquire)
    }

    /// Signals still needed before the event is set
    pub fn remaining_count(&self) -> u32 {
        self.remaining_count.load(Ordering::Acquire)
    }

    pub fn is_set(&self) -> bool {
        self.remaining_count() == 0
    }

    /// Subtract `count` from the remaining count
    ///
    /// Returns `true` if this call brought the count to zero and released the
    /// waiters. Signaling past zero is a `CapacityExceeded` error and leaves
    /// the count untouched.
    pub fn signal(&self, count: u32) -> SyncResult<bool> {
        if count == 0 {
            return Err(SyncError::InvalidArgument(
                "signal count must be at least 1".into(),
            ));
        }

        let mut remaining = self.remaining_count.load(Ordering::Acquire);
        loop {
            if remaining < count {
                warn!(
                    offset = self.state.byte_offset(),
                    remaining, count, "countdown signaled past zero"
                );
                return Err(SyncError::CapacityExceeded(format!(
                    "signaling {count} with only {remaining} remaining"
                )));
            }
            match self.remaining_count.compare_exchange(remaining, remaining - count) {
                Ok(_) => break,
                Err(actual) => remaining = actual,
            }
        }

        if remaining != count {
            return Ok(false);
        }

        let _ = self.state.compare_exchange(NONSIGNALED, SIGNALED);
        let woken = self.state.wake_all();
        debug!(offset = self.state.byte_offset(), woken, "countdown event set");
        Ok(true)
    }

    /// Add `count` participants if the event is not yet set
    ///
    /// Returns `false` if the event was already set.
    pub fn try_add(&self, count: u32) -> SyncResult<bool> {
        let mut remaining = self.remaining_count.load(Ordering::Acquire);
        loop {
            if remaining == 0 {
                return Ok(false);
            }
            let next = remaining
                .checked_add(count)
                .filter(|&next| next <= MAX_COUNT)
                .ok_or_else(|| {
                    SyncError::CapacityExceeded(format!(
                        "adding {count} to {remaining} remaining exceeds {MAX_COUNT}"
                    ))
                })?;
            match self.remaining_count.compare_exchange(remaining, next) {
                Ok(_) => return Ok(true),
                Err(actual) => remaining = actual,
            }
        }
    }

    /// Add `count` participants; adding to a set event is an `InvalidState`
    /// error
    pub fn add(&self, count: u32) -> SyncResult<()> {
        if self.try_add(count)? {
            Ok(())
        } else {
            Err(SyncError::InvalidState(
                "countdown event is already set".into(),
            ))
        }
    }

    /// Block until the count reaches zero or `timeout` elapses
    ///
    /// Returns `true` if the event is set.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::after(timeout);
        loop {
            if self.state.load(Ordering::Acquire) == SIGNALED {
                return true;
            }
            if deadline.expired() {
                return false;
            }
            trace!(offset = self.state.byte_offset(), "countdown wait blocking");
            if self.state.wait(NONSIGNALED, deadline.timeout()).is_timed_out() {
                return self.state.load(Ordering::Acquire) == SIGNALED;
            }
        }
    }
}

impl SharedPrimitive for CountdownEvent {
    const KIND: PrimitiveKind = PrimitiveKind::CountdownEvent;

    /// Attach to a countdown; a zeroed span becomes an already set countdown
    /// of zero
    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let countdown = Self::at(locate(region, byte_offset, Self::KIND)?);
        if let Claim::Fresh = claim_multi(&countdown.state, Self::KIND, INITIALIZING)? {
            countdown.publish(0);
        }
        debug!(offset = byte_offset, "countdown event attached");
        Ok(countdown)
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for CountdownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownEvent")
            .field("byte_offset", &self.byte_offset())
            .field("initial_count", &self.initial_count())
            .field("remaining_count", &self.remaining_count())
            .finish()
    }
}
