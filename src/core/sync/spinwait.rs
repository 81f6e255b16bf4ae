/*!
 * Spin-Wait
 *
 * Escalating spin/yield/sleep policy for short waits. Primitives run it
 * before committing to a blocking wait, and callers can use it directly to
 * poll a predicate.
 */

use super::config::{SpinAction, SpinPolicy};
use crate::core::limits::SPIN_COUNTER_WRAP;
use std::thread;
use std::time::{Duration, Instant};

/// Escalating spinner
///
/// # Performance
///
/// - First spins stay on the CPU for the lowest latency
/// - Every 5th spin yields, every 20th sleeps 1ms (default policy)
/// - The schedule depends only on the call counter
#[derive(Debug, Clone, Default)]
pub struct SpinWait {
    count: u32,
    policy: SpinPolicy,
}

impl SpinWait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SpinPolicy) -> Self {
        Self { count: 0, policy }
    }

    /// Number of spins since creation or the last reset
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Action the next `spin_once` will take
    #[inline]
    pub fn next_action(&self) -> SpinAction {
        self.policy.action(self.count)
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Spin once, escalating according to the policy
    pub fn spin_once(&mut self) -> SpinAction {
        let action = self.next_action();
        match action {
            SpinAction::Spin => std::hint::spin_loop(),
            SpinAction::Yield => thread::yield_now(),
            SpinAction::Sleep => thread::sleep(self.policy.sleep_duration),
        }
        self.count = if self.count >= SPIN_COUNTER_WRAP {
            0
        } else {
            self.count + 1
        };
        action
    }

    /// Spin until `condition` holds or `timeout` elapses
    ///
    /// Returns `true` if the condition became true in time. `None` spins
    /// forever; a zero timeout checks the condition exactly once.
    pub fn spin_until<F>(&mut self, mut condition: F, timeout: Option<Duration>) -> bool
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        loop {
            if condition() {
                return true;
            }
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return false;
                }
            }
            self.spin_once();
        }
    }
}
