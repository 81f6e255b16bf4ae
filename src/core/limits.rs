/*!
 * Synchronization Limits and Constants
 *
 * Centralized location for the layout constants, thresholds, and spin tuning
 * shared by every primitive.
 *
 * ## Conventions
 * - Values are grouped by domain (layout, counts, spinning)
 * - Performance-critical constants are marked with [PERF]
 * - Constants that are part of the shared-memory layout are marked with [ABI]
 */

use std::time::Duration;

// =============================================================================
// SHARED MEMORY LAYOUT
// =============================================================================

/// Size of one control word in bytes
/// [ABI] Every primitive occupies a whole number of 32-bit words
pub const WORD_SIZE: usize = 4;

/// Bit position of the lowest type tag bit
/// [ABI] Tags are single bits at or above this position
pub const TAG_SHIFT: u32 = 16;

/// Bits of a control word reserved for the type tag
/// [ABI]
pub const TAG_MASK: u32 = 0xFFFF_0000;

/// Bits of a control word holding the state ordinal
/// [ABI]
pub const STATE_MASK: u32 = 0x0000_FFFF;

// =============================================================================
// COUNTS
// =============================================================================

/// Largest count a semaphore or countdown event will hold
/// Keeps counts representable as signed 32-bit values for agents that read
/// the region as `i32`
pub const MAX_COUNT: u32 = i32::MAX as u32;

// =============================================================================
// SPINNING
// =============================================================================

/// Every Nth spin yields the time slice
pub const SPIN_YIELD_INTERVAL: u32 = 5;

/// Every Nth spin sleeps for `SPIN_SLEEP_DURATION`
/// Takes precedence over the yield interval when both apply
pub const SPIN_SLEEP_INTERVAL: u32 = 20;

/// Sleep applied by the spin escalation
pub const SPIN_SLEEP_DURATION: Duration = Duration::from_millis(1);

/// Spin counter wraps back to zero after this value
pub const SPIN_COUNTER_WRAP: u32 = i32::MAX as u32;

/// Spins attempted before a primitive commits to a blocking wait
/// [PERF] Covers two yields; stays below the first 1ms sleep
pub const DEFAULT_SPIN_LIMIT: u32 = 10;

/// Spin limit for the low-latency preset
/// [PERF] Reaches several sleeps before blocking
pub const LOW_LATENCY_SPIN_LIMIT: u32 = 100;

/// Environment variable overriding the spin limit
pub const SPIN_LIMIT_ENV: &str = "AGENT_SYNC_SPIN_LIMIT";
