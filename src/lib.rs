/*!
 * Agent Sync Library
 * Synchronization primitives for agents that share only a memory region
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{SyncError, SyncResult};
pub use crate::core::sync::{
    decode, encode, identify, AtomicWord, AutoResetEvent, ConditionVariable, CountdownEvent,
    ManualResetEvent, Mutex, MutexGuard, PrimitiveKind, Semaphore, SharedPrimitive, SharedRegion,
    SpinAction, SpinPolicy, SpinWait, SyncConfig, WaitOutcome,
};
pub use monitoring::{init_tracing, try_init_tracing};
