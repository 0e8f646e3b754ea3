//! Synchronization primitives
//!
//! Locks come from `spin`; this module adds the blocking handoffs the
//! lifecycle code needs on top of them. Blocking goes through the
//! [`Scheduler`] collaborator, so a waiting thread is descheduled instead of
//! burning its time slice.

pub mod oneshot;

/// Scheduler hooks for parking and waking kernel threads.
pub trait Scheduler: Send + Sync {
    /// Id of the thread running on this CPU.
    fn current(&self) -> usize;

    /// Deschedule the current thread until it is woken.
    ///
    /// A `wake` delivered before the thread blocks makes this return at
    /// once. Spurious returns are allowed; callers re-check their condition.
    fn block(&self);

    /// Make the thread `id` runnable again.
    fn wake(&self, id: usize);
}
