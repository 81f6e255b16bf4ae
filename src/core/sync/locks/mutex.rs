/*!
 * Shared Mutex
 *
 * Exclusive lock living in one control word, usable from any agent that
 * holds the region.
 *
 * # Algorithm
 *
 * Three-state futex mutex (unlocked, locked, contended):
 * - Fast path: CAS unlocked -> locked
 * - Spin briefly, retrying the fast path
 * - Slow path: swap in contended and block while the word stays contended
 * - Unlock: CAS locked -> unlocked; if that fails there are waiters, so store
 *   unlocked and wake exactly one of them
 */

use crate::core::errors::SyncResult;
use crate::core::sync::codec::{encode, PrimitiveKind};
use crate::core::sync::config::SyncConfig;
use crate::core::sync::deadline::Deadline;
use crate::core::sync::region::SharedRegion;
use crate::core::sync::spinwait::SpinWait;
use crate::core::sync::traits::{claim, locate, SharedPrimitive};
use crate::core::sync::word::AtomicWord;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, trace};

const UNLOCKED: u32 = encode(PrimitiveKind::Mutex, 0);
const LOCKED: u32 = encode(PrimitiveKind::Mutex, 1);
const CONTENDED: u32 = encode(PrimitiveKind::Mutex, 2);

/// Mutual-exclusion lock over shared memory
///
/// The handle owns nothing but a reference to the region; clone it or attach
/// a new handle to give other agents access to the same lock.
///
/// # Example
///
/// ```
/// use agent_sync::{Mutex, SharedPrimitive};
///
/// let mutex = Mutex::new();
/// let other = Mutex::attach(mutex.buffer(), mutex.byte_offset()).unwrap();
///
/// let guard = mutex.lock();
/// assert!(other.try_lock().is_none());
/// drop(guard);
/// assert!(other.try_lock().is_some());
/// ```
#[derive(Clone)]
pub struct Mutex {
    state: AtomicWord,
    config: SyncConfig,
}

impl Mutex {
    /// Create an unlocked mutex in a freshly allocated region
    pub fn new() -> Self {
        let region = SharedRegion::new(Self::SIZE);
        let state = AtomicWord::new_unchecked(region, 0);
        state.store(UNLOCKED, Ordering::Release);
        debug!("mutex created");
        Self {
            state,
            config: SyncConfig::default(),
        }
    }

    /// Replace this handle's spin configuration
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Block until the lock is acquired
    ///
    /// Not reentrant. The control word records no owner, so locking again
    /// from the agent that already holds the lock blocks forever. Use
    /// `try_lock` or `lock_for` where re-entry is possible.
    pub fn lock(&self) -> MutexGuard<'_> {
        let acquired = self.acquire(None);
        debug_assert!(acquired, "untimed acquire cannot fail");
        MutexGuard { mutex: self }
    }

    /// Block until the lock is acquired or `timeout` elapses
    pub fn lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_>> {
        self.acquire(Some(timeout))
            .then(|| MutexGuard { mutex: self })
    }

    /// Acquire the lock only if it is free right now
    pub fn try_lock(&self) -> Option<MutexGuard<'_>> {
        self.state
            .compare_exchange(UNLOCKED, LOCKED)
            .is_ok()
            .then(|| MutexGuard { mutex: self })
    }

    /// Whether any agent currently holds the lock
    pub fn is_locked(&self) -> bool {
        matches!(self.state.load(Ordering::Acquire), LOCKED | CONTENDED)
    }

    /// Acquire without producing a guard
    pub(crate) fn acquire(&self, timeout: Option<Duration>) -> bool {
        if self.state.compare_exchange(UNLOCKED, LOCKED).is_ok() {
            return true;
        }

        let mut spin = SpinWait::with_policy(self.config.spin);
        for _ in 0..self.config.spin_limit {
            spin.spin_once();
            if self.state.load(Ordering::Relaxed) == UNLOCKED
                && self.state.compare_exchange(UNLOCKED, LOCKED).is_ok()
            {
                return true;
            }
        }

        trace!(offset = self.state.byte_offset(), "mutex contended, blocking");
        let deadline = Deadline::after(timeout);
        loop {
            // Whoever swaps out UNLOCKED owns the lock, left marked contended
            if self.state.swap(CONTENDED) == UNLOCKED {
                return true;
            }
            if deadline.expired() {
                return false;
            }
            if self.state.wait(CONTENDED, deadline.timeout()).is_timed_out() {
                trace!(offset = self.state.byte_offset(), "mutex lock timed out");
                return false;
            }
        }
    }

    /// Release without a guard; the caller must hold the lock
    pub(crate) fn release(&self) {
        if self.state.compare_exchange(LOCKED, UNLOCKED).is_err() {
            self.state.store(UNLOCKED, Ordering::Release);
            self.state.wake(1);
        }
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedPrimitive for Mutex {
    const KIND: PrimitiveKind = PrimitiveKind::Mutex;

    fn attach(region: &SharedRegion, byte_offset: usize) -> SyncResult<Self> {
        let state = locate(region, byte_offset, Self::KIND)?;
        claim(&state, Self::KIND, UNLOCKED)?;
        debug!(offset = byte_offset, "mutex attached");
        Ok(Self {
            state,
            config: SyncConfig::default(),
        })
    }

    fn buffer(&self) -> &SharedRegion {
        self.state.region()
    }

    fn byte_offset(&self) -> usize {
        self.state.byte_offset()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("byte_offset", &self.byte_offset())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Proof of holding a `Mutex`; releases the lock when dropped
///
/// Only a guard can release the lock, so unlocking a mutex the caller does
/// not hold cannot be expressed.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
}

impl<'a> MutexGuard<'a> {
    /// Mutex this guard holds
    pub fn mutex(&self) -> &'a Mutex {
        self.mutex
    }

    /// Release the lock now
    pub fn unlock(self) {
        drop(self);
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

impl fmt::Debug for MutexGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexGuard")
            .field("byte_offset", &self.mutex.byte_offset())
            .finish()
    }
}
