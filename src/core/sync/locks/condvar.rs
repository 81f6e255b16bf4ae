/*!
 * Shared Condition Variable
 *
 * Wait/notify primitive used together with a locked `Mutex`. The control
 * word's low bits hold a generation counter that every notify advances.
 *
 * # Lost-wakeup avoidance
 *
 * A waiter reads the generation while it still holds the mutex, and only
 * then releases the mutex and blocks on that exact generation. A notify that
 * lands between the unlock and the block has already changed the word, so
 * the block returns at once instead of sleeping through the signal.
 *
 * The generation occupies 16 bits and wraps. A waiter can only miss a
 * notify if exactly a multiple of 65536 notifies happen between its unlock
 * and its block.
 */

use super::mutex::MutexGuard;
use crate::core::errors::SyncResult;
use crate::core::limits::{STATE_MASK, TAG_MASK};
use crate::core::sync::codec::{encode, PrimitiveKind};
use crate::core::sync::deadline::Deadline;
use crate::core::sync::region::SharedRegion;
use crate::core::sync::traits::{claim, locate, SharedPrimitive};
use crate::core::sync::word::AtomicWord;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, trace};

const GENERATION_ZERO: u32 = encode(PrimitiveKind::ConditionVariable, 0);

/// Condition variable over shared memory
///
/// # Example
///
/// ```
/// use agent_sync::{ConditionVariable, Mutex};
/// use std::time::Duration;
///
/// let mutex = Mutex::new();
/// let cv = ConditionVariable::new();
///
/// let mut guard = mutex.lock();
/// // Nobody notifies, so the wait times out with the lock re-acquired
/// assert!(!cv.wait(&mut guard, Some(Duration::from_millis(10))));
/// assert!(mutex.is_locked());
/// ```
#[derive(Clone)]
pub struct ConditionVariable {
    state: AtomicWord,
}

impl ConditionVariable {
    /// Create a condition variable in a freshly allocated region
    pub fn new() -> Self {
        let region = SharedRegion::new(Self::SIZE);
        let state = AtomicWord::new_unchecked(region, 0);
        state.store(GENERATION_ZERO, Ordering::Release);
        debug!("condition variable created");
        Self { state }
    }

    /// Current generation; advances on every notify
    pub fn generation(&self) -> u16 {
        (self.state.load(Ordering::Acquire) & STATE_MASK) as u16
    }

    /// Release the guard's mutex, block until notified, then re-acquire
    ///
    /// Returns `false` if `timeout` elapsed first. The mutex is held again
    /// when this returns either way. Wakeups may be spurious; use
    /// `wait_until` to wait for a condition.
    pub fn wait(&self, guard: &mut MutexGuard<'_>, timeout: Option<Duration>) -> bool {
        let generation = self.state.load(Ordering::SeqCst);
        let mutex = guard.mutex();

        mutex.release();
        let outcome = self.state.wait(generation, timeout);
        let reacquired = mutex.acquire(None);
        debug_assert!(reacquired, "untimed acquire cannot fail");

        trace!(offset = self.state.byte_offset(), ?outcome, "condition variable wait returned");
        outcome.is_ready()
    }

    /// Wait until `condition` holds, checking it under the mutex after every
    /// wakeup
    ///
    /// Returns `true` once the condition holds, or `false` if `timeout`
    /// elapses while it is still false. The condition is checked before the
    /// first wait, so an already-true condition returns immediately.
    pub fn wait_until<F>(
        &self,
        guard: &mut MutexGuard<'_>,
        timeout: Option<Duration>,
        mut condition: F,
    ) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Deadline::after(timeout);
        loop {
            if condition() {
                return true;
            }
            if deadline.expired() {
                return false;
            }
            if !self.wait(guard, deadline.timeout()) {
                return condition();
            }
        }
    }

    /// Wake one waiting agent, returning whether one was woken
    pub fn notify_one(&self) -> bool {
        self.advance();
        self.state.wake(1) == 1
    }

    /// Wake every waiting agent, returning how many were woken
    pub fn notify_all(&self) -> usize {
        self.advance();
        self.state.wake_all()
    }

    fn advance(&self) {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = (current & TAG_MASK) | (current.wrapping_add(1) & STATE_MASK);
            match self.state.compare_exchange(current, next) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for ConditionVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedPrimitive for ConditionVariable {
    const KIND: PrimitiveKind = PrimitiveKind::ConditionVariable;

    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let state = locate(region, byte_offset, Self::KIND)?;
        claim(&state, Self::KIND, GENERATION_ZERO)?;
        debug!(offset = byte_offset, "condition variable attached");
        Ok(Self { state })
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for ConditionVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionVariable")
            .field("byte_offset", &self.byte_offset())
            .field("generation", &self.generation())
            .finish()
    }
}
