//! Host-RTOS primitives consumed by the adapter
//!
//! The adapter never polls and never spins: blocking waits go through a
//! counting semaphore provided by the host, and all mutual exclusion goes
//! through the [`mutex`] crate's [`BlockingMutex`](mutex::BlockingMutex).
//! Only the semaphore needs a trait of its own here.

/// Counting semaphore provided by the host RTOS.
///
/// `acquire` must block the calling thread until a permit is available.
/// The blocking bring-up path waits on one of these, and the wait is
/// always entered with no stack lock held, so an implementation may
/// suspend the caller indefinitely without wedging event delivery.
pub trait Semaphore {
    /// Block until a permit is available, then consume it.
    fn acquire(&self);

    /// Release one permit, waking a blocked waiter if any.
    fn release(&self);
}
