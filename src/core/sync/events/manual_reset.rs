/*!
 * Manual-Reset Event
 *
 * Sticky flag: once set, every `wait` returns at once until `reset`.
 */

use crate::core::errors::SyncResult;
use crate::core::sync::codec::{encode, PrimitiveKind};
use crate::core::sync::deadline::Deadline;
use crate::core::sync::region::SharedRegion;
use crate::core::sync::traits::{claim, locate, SharedPrimitive};
use crate::core::sync::word::{AtomicWord, WaitOutcome};
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, trace};

const NONSIGNALED: u32 = encode(PrimitiveKind::ManualResetEvent, 0);
const SIGNALED: u32 = encode(PrimitiveKind::ManualResetEvent, 1);

/// Broadcast signal over shared memory
///
/// # Example
///
/// ```
/// use agent_sync::ManualResetEvent;
/// use std::time::Duration;
///
/// let event = ManualResetEvent::new(false);
/// assert!(event.set());
/// assert!(event.wait(None));
/// assert!(event.wait(None));
/// assert!(event.reset());
/// assert!(!event.wait(Some(Duration::from_millis(10))));
/// ```
#[derive(Clone)]
pub struct ManualResetEvent {
    state: AtomicWord,
}

impl ManualResetEvent {
    /// Create an event in a freshly allocated region
    pub fn new(initial_state: bool) -> Self {
        let region = SharedRegion::new(Self::SIZE);
        let state = AtomicWord::new_unchecked(region, 0);
        state.store(
            if initial_state { SIGNALED } else { NONSIGNALED },
            Ordering::Release,
        );
        debug!(initial_state, "manual-reset event created");
        Self { state }
    }

    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == SIGNALED
    }

    /// Signal the event and release every waiter
    ///
    /// Returns `false` if it was already set.
    pub fn set(&self) -> bool {
        if self.state.compare_exchange(NONSIGNALED, SIGNALED).is_err() {
            return false;
        }
        let woken = self.state.wake_all();
        trace!(offset = self.state.byte_offset(), woken, "manual-reset event set");
        true
    }

    /// Return the event to nonsignaled
    ///
    /// Returns `false` if it was not set.
    pub fn reset(&self) -> bool {
        self.state.compare_exchange(SIGNALED, NONSIGNALED).is_ok()
    }

    /// Block while the event is nonsignaled or until `timeout` elapses
    ///
    /// Returns `true` if the event was set.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::after(timeout);
        loop {
            if self.is_set() {
                return true;
            }
            if deadline.expired() {
                return false;
            }
            match self.state.wait(NONSIGNALED, deadline.timeout()) {
                // A reset may race the wakeup; the set still happened
                WaitOutcome::Woken => return true,
                WaitOutcome::Mismatch => continue,
                WaitOutcome::TimedOut => return self.is_set(),
            }
        }
    }
}

impl SharedPrimitive for ManualResetEvent {
    const KIND: PrimitiveKind = PrimitiveKind::ManualResetEvent;

    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let state = locate(region, byte_offset, Self::KIND)?;
        claim(&state, Self::KIND, NONSIGNALED)?;
        debug!(offset = byte_offset, "manual-reset event attached");
        Ok(Self { state })
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for ManualResetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualResetEvent")
            .field("byte_offset", &self.byte_offset())
            .field("set", &self.is_set())
            .finish()
    }
}
