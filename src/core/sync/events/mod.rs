/*!
 * Event Primitives
 *
 * Signaling primitives that carry no lock:
 * - Auto-reset event (one waiter per set)
 * - Manual-reset event (sticky until reset)
 * - Countdown event (set when a counter reaches zero)
 */

mod auto_reset;
mod countdown;
mod manual_reset;

pub use auto_reset::AutoResetEvent;
pub use countdown::CountdownEvent;
pub use manual_reset::ManualResetEvent;
