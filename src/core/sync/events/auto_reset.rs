/*!
 * Auto-Reset Event
 *
 * Releases at most one waiter per `set`. The setter moves the word through a
 * transient `Notifying` state while it wakes, so a concurrent second `set`
 * fails its CAS instead of releasing a second waiter, and a waiter that sees
 * `Notifying` keeps blocking.
 *
 * The signal is not sticky when nobody is parked: a `set` with no waiter
 * wakes no one and leaves the event nonsignaled. Only an event constructed
 * in the signaled state holds a signal for the next `wait` to consume.
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

const NONSIGNALED: u32 = encode(PrimitiveKind::AutoResetEvent, 0);
const SIGNALED: u32 = encode(PrimitiveKind::AutoResetEvent, 1);
const NOTIFYING: u32 = encode(PrimitiveKind::AutoResetEvent, 2);

/// Single-waiter signal over shared memory
#[derive(Clone)]
pub struct AutoResetEvent {
    state: AtomicWord,
}

impl AutoResetEvent {
    /// Create an event in a freshly allocated region
    pub fn new(initial_state: bool) -> Self {
        let region = SharedRegion::new(Self::SIZE);
        let state = AtomicWord::new_unchecked(region, 0);
        state.store(
            if initial_state { SIGNALED } else { NONSIGNALED },
            Ordering::Release,
        );
        debug!(initial_state, "auto-reset event created");
        Self { state }
    }

    /// Whether a signal is waiting to be consumed
    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == SIGNALED
    }

    /// Release one blocked waiter
    ///
    /// Returns `true` if a waiter was released. Returns `false` without
    /// effect if no waiter was parked, the event already holds a signal, or
    /// another `set` is mid-notification.
    pub fn set(&self) -> bool {
        if self.state.compare_exchange(NONSIGNALED, NOTIFYING).is_err() {
            return false;
        }
        let woken = self.state.wake(1);
        self.state.store(NONSIGNALED, Ordering::Release);
        trace!(offset = self.state.byte_offset(), woken, "auto-reset event set");
        woken == 1
    }

    /// Discard a pending signal, returning whether there was one
    pub fn reset(&self) -> bool {
        self.state.compare_exchange(SIGNALED, NONSIGNALED).is_ok()
    }

    /// Block until released by a `set` or `timeout` elapses
    ///
    /// Returns `true` if this call consumed a signal.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::after(timeout);
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current == SIGNALED {
                if self.state.compare_exchange(SIGNALED, NONSIGNALED).is_ok() {
                    return true;
                }
                continue;
            }
            if deadline.expired() {
                return false;
            }
            match self.state.wait(current, deadline.timeout()) {
                WaitOutcome::Woken => return true,
                WaitOutcome::Mismatch => continue,
                WaitOutcome::TimedOut => return false,
            }
        }
    }
}

impl SharedPrimitive for AutoResetEvent {
    const KIND: PrimitiveKind = PrimitiveKind::AutoResetEvent;

    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let state = locate(region, byte_offset, Self::KIND)?;
        claim(&state, Self::KIND, NONSIGNALED)?;
        debug!(offset = byte_offset, "auto-reset event attached");
        Ok(Self { state })
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for AutoResetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoResetEvent")
            .field("byte_offset", &self.byte_offset())
            .field("set", &self.is_set())
            .finish()
    }
}
