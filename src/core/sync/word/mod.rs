/*!
 * Atomic Word
 *
 * Handle to one 32-bit slot of a shared region. Every higher primitive is a
 * CAS loop over one or more of these plus the futex-style `wait`/`wake`,
 * which is the only place any agent ever blocks.
 */

mod futex;

pub use futex::WaitOutcome;

use super::region::SharedRegion;
use crate::core::limits::WORD_SIZE;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// One atomic word of a `SharedRegion`
///
/// Read-modify-write operations are sequentially consistent; a successful
/// CAS or a wake therefore happens-before whatever the woken agent does next.
#[derive(Clone)]
pub struct AtomicWord {
    region: SharedRegion,
    index: usize,
}

impl AtomicWord {
    /// Allocate a fresh single-word region holding `value`
    pub fn new(value: u32) -> Self {
        let word = Self::new_unchecked(SharedRegion::with_words(1), 0);
        word.store(value, Ordering::Release);
        word
    }

    pub(crate) fn new_unchecked(region: SharedRegion, index: usize) -> Self {
        debug_assert!(index < region.word_count());
        Self { region, index }
    }

    /// Word `n` positions after this one; the primitive validated the span
    pub(crate) fn offset_by(&self, n: usize) -> Self {
        Self::new_unchecked(self.region.clone(), self.index + n)
    }

    #[inline(always)]
    fn cell(&self) -> &AtomicU32 {
        self.region.cell(self.index)
    }

    /// Region this word lives in
    #[inline]
    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    /// Byte offset of this word in its region
    #[inline]
    pub fn byte_offset(&self) -> usize {
        self.index * WORD_SIZE
    }

    #[inline(always)]
    pub fn load(&self, order: Ordering) -> u32 {
        self.cell().load(order)
    }

    #[inline(always)]
    pub fn store(&self, value: u32, order: Ordering) {
        self.cell().store(value, order)
    }

    #[inline(always)]
    pub fn swap(&self, value: u32) -> u32 {
        self.cell().swap(value, Ordering::SeqCst)
    }

    /// Compare and swap
    ///
    /// Returns `Ok(previous)` when the word held `current` and now holds
    /// `new`, otherwise `Err(actual)`.
    #[inline(always)]
    pub fn compare_exchange(&self, current: u32, new: u32) -> Result<u32, u32> {
        self.cell()
            .compare_exchange(current, new, Ordering::SeqCst, Ordering::SeqCst)
    }

    #[inline(always)]
    pub fn fetch_add(&self, delta: u32) -> u32 {
        self.cell().fetch_add(delta, Ordering::SeqCst)
    }

    #[inline(always)]
    pub fn fetch_sub(&self, delta: u32) -> u32 {
        self.cell().fetch_sub(delta, Ordering::SeqCst)
    }

    /// Block the calling thread while the word holds `expected`
    ///
    /// Returns once another agent wakes this word, immediately when the word
    /// already differs from `expected`, or when `timeout` elapses. `None`
    /// waits forever.
    #[inline]
    pub fn wait(&self, expected: u32, timeout: Option<Duration>) -> WaitOutcome {
        futex::wait(self.cell(), expected, timeout)
    }

    /// Wake up to `count` agents blocked on this word
    #[inline]
    pub fn wake(&self, count: usize) -> usize {
        futex::wake(self.cell(), count)
    }

    /// Wake every agent blocked on this word
    #[inline]
    pub fn wake_all(&self) -> usize {
        futex::wake(self.cell(), usize::MAX)
    }
}

impl fmt::Debug for AtomicWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicWord")
            .field("byte_offset", &self.byte_offset())
            .field("value", &self.load(Ordering::Relaxed))
            .finish()
    }
}
