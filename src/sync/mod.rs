/*!
 * Synchronization Primitives
 * Payloads for events, semaphores, mutexes, timers and address arbiters
 *
 * Payloads only hold state. Signalling, waking and acquisition run in the
 * kernel, which owns the thread array the waitlists refer to.
 */

mod arbiter;
mod event;
mod mutex;
mod semaphore;
mod timer;
mod waitlist;

pub use arbiter::{AddressArbiter, ArbitrationType};
pub use event::{Event, EventCallback};
pub use mutex::Mutex;
pub use semaphore::Semaphore;
pub use timer::Timer;
pub use waitlist::WaitList;
