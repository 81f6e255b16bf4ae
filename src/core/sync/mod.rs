/*!
 * Synchronization Primitives
 *
 * Blocking primitives whose entire state lives in a `SharedRegion`, so that
 * independent agents holding clones of the region coordinate through the
 * same control words:
 * - Locks: mutex, condition variable, semaphore
 * - Events: auto-reset, manual-reset, countdown
 * - SpinWait for escalating busy-waits
 *
 * # Architecture
 *
 * Every primitive is a CAS state machine over one or more `AtomicWord`s.
 * The first word of each primitive is its control word, carrying a type tag
 * (see `codec`) so that attaching to the wrong kind of primitive is caught.
 * The only suspension point is `AtomicWord::wait`, a futex-style park keyed
 * on the word's address.
 *
 * # Performance
 *
 * - Uncontended lock/unlock is a single CAS each
 * - Contended paths spin (bounded by `SyncConfig::spin_limit`) before parking
 * - Wakes are skipped when no waiter can be parked
 */

mod codec;
mod config;
mod deadline;
mod events;
mod locks;
mod region;
mod spinwait;
mod traits;
mod word;

pub use codec::{decode, encode, identify, PrimitiveKind};
pub use config::{SpinAction, SpinPolicy, SyncConfig};
pub use events::{AutoResetEvent, CountdownEvent, ManualResetEvent};
pub use locks::{ConditionVariable, Mutex, MutexGuard, Semaphore};
pub use region::SharedRegion;
pub use spinwait::SpinWait;
pub use traits::SharedPrimitive;
pub use word::{AtomicWord, WaitOutcome};
