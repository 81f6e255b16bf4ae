/*!
 * Futex-Style Wait/Wake
 *
 * Uses parking_lot_core to park threads on the address of a shared word.
 * On Linux this maps onto futex-like parking with minimal overhead.
 *
 * # Design
 *
 * Follows the Linux futex contract:
 * - The word's value is compared with the expected value while the parking
 *   bucket is locked, so a wake issued after a value change is never lost
 * - No kernel object or allocation per word; the key is the word's address
 * - Wakes only reach threads parked on the same address
 */

use parking_lot_core::{
    park, unpark_all, unpark_filter, FilterOp, ParkResult, ParkToken, DEFAULT_PARK_TOKEN,
    DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Result of a blocking wait on a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Another agent woke this one
    Woken,
    /// The word no longer held the expected value, so no wait happened
    Mismatch,
    /// The timeout elapsed first
    TimedOut,
}

impl WaitOutcome {
    /// Woken or changed: anything but a timeout
    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        !matches!(self, WaitOutcome::TimedOut)
    }

    #[inline(always)]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

#[inline]
fn key(atom: &AtomicU32) -> usize {
    atom as *const AtomicU32 as usize
}

/// Block while `atom` holds `expected`
pub(crate) fn wait(atom: &AtomicU32, expected: u32, timeout: Option<Duration>) -> WaitOutcome {
    if timeout == Some(Duration::ZERO) {
        return if atom.load(Ordering::SeqCst) == expected {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Mismatch
        };
    }

    // An overflowing deadline is as good as none
    let deadline = timeout.and_then(|d| Instant::now().checked_add(d));

    trace!(addr = key(atom), expected, ?timeout, "parking on word");

    // SAFETY: the validate callback only reads an atomic and the other
    // callbacks do nothing, so none of them can panic or re-enter
    // parking_lot_core.
    let result = unsafe {
        park(
            key(atom),
            || atom.load(Ordering::SeqCst) == expected,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            deadline,
        )
    };

    match result {
        ParkResult::Unparked(_) => WaitOutcome::Woken,
        ParkResult::Invalid => WaitOutcome::Mismatch,
        ParkResult::TimedOut => WaitOutcome::TimedOut,
    }
}

/// Wake up to `count` agents parked on `atom`, returning how many woke
pub(crate) fn wake(atom: &AtomicU32, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    if count == usize::MAX {
        // SAFETY: no callbacks run while the bucket lock is held.
        return unsafe { unpark_all(key(atom), DEFAULT_UNPARK_TOKEN) };
    }

    let mut remaining = count;
    // SAFETY: the filter and callback only touch local state.
    let result = unsafe {
        unpark_filter(
            key(atom),
            |_: ParkToken| {
                if remaining == 0 {
                    FilterOp::Stop
                } else {
                    remaining -= 1;
                    FilterOp::Unpark
                }
            },
            |_| DEFAULT_UNPARK_TOKEN,
        )
    };
    result.unparked_threads
}
