/*!
 * Lock-Based Synchronization Primitives
 *
 * Primitives that guard a critical section or a pool of permits:
 * - Mutex (three-state futex lock with RAII guard)
 * - Condition variable (generation counter paired with a held mutex)
 * - Semaphore (bounded permit count)
 */

mod condvar;
mod mutex;
mod semaphore;

// Re-export public API
pub use condvar::ConditionVariable;
pub use mutex::{Mutex, MutexGuard};
pub use semaphore::Semaphore;
