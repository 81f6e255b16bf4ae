/*!
 * Synchronization Configuration
 *
 * Runtime tuning for spin-then-block behavior. Configuration lives in each
 * agent's handle, never in shared memory, so agents attached to the same
 * primitive may tune it differently.
 */

use crate::core::limits::{
    DEFAULT_SPIN_LIMIT, LOW_LATENCY_SPIN_LIMIT, SPIN_LIMIT_ENV, SPIN_SLEEP_DURATION,
    SPIN_SLEEP_INTERVAL, SPIN_YIELD_INTERVAL,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What one `SpinWait::spin_once` call does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinAction {
    /// Busy-spin on the CPU
    Spin,
    /// Give up the rest of the time slice
    Yield,
    /// Sleep for the policy's sleep duration
    Sleep,
}

/// Escalation schedule for spinning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinPolicy {
    /// Every Nth spin yields
    pub yield_interval: u32,
    /// Every Nth spin sleeps (wins over yielding)
    pub sleep_interval: u32,
    /// How long a sleeping spin lasts
    pub sleep_duration: Duration,
}

impl Default for SpinPolicy {
    fn default() -> Self {
        Self {
            yield_interval: SPIN_YIELD_INTERVAL,
            sleep_interval: SPIN_SLEEP_INTERVAL,
            sleep_duration: SPIN_SLEEP_DURATION,
        }
    }
}

impl SpinPolicy {
    /// Action taken by the spin with zero-based index `count`
    ///
    /// Pure function of the counter so the schedule is testable without a
    /// clock.
    #[inline]
    pub const fn action(&self, count: u32) -> SpinAction {
        if self.sleep_interval > 0 && count % self.sleep_interval == self.sleep_interval - 1 {
            SpinAction::Sleep
        } else if self.yield_interval > 0 && count % self.yield_interval == self.yield_interval - 1
        {
            SpinAction::Yield
        } else {
            SpinAction::Spin
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Spins attempted before committing to a blocking wait
    pub spin_limit: u32,
    /// Escalation used while spinning
    pub spin: SpinPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spin_limit: DEFAULT_SPIN_LIMIT,
            spin: SpinPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Configuration for critical sections expected to be very short
    pub fn low_latency() -> Self {
        Self {
            spin_limit: LOW_LATENCY_SPIN_LIMIT,
            spin: SpinPolicy::default(),
        }
    }

    /// Configuration for long holds: block without spinning
    pub fn long_wait() -> Self {
        Self {
            spin_limit: 0,
            spin: SpinPolicy::default(),
        }
    }

    /// Default configuration with overrides from the environment
    ///
    /// Environment variables:
    /// - AGENT_SYNC_SPIN_LIMIT: spins before blocking (default: 10)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(SPIN_LIMIT_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(limit) => config.spin_limit = limit,
                Err(e) => tracing::warn!(
                    var = SPIN_LIMIT_ENV,
                    value = %raw,
                    error = %e,
                    "ignoring unparsable spin limit"
                ),
            }
        }
        config
    }
}
