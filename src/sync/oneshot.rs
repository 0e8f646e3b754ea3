//! One-Shot Completion
//!
//! A single-producer, single-consumer channel that carries exactly one value.
//!
//! # Design
//! ```text
//!   Sender<T> ──send(v)──▶ [ EMPTY → FULL ] ──recv()──▶ Receiver<T>
//!        │                      │
//!        └─────drop────────▶ [ EMPTY → CLOSED ] ──recv()──▶ None
//! ```
//! - Neither end is `Clone`: a value is produced at most once and observed
//!   at most once, and both facts are enforced by ownership
//! - `send` and `recv` consume their end
//! - Dropping the sender unsent closes the channel so a receiver never
//!   blocks on a producer that no longer exists
//!
//! # Blocking
//! The receiver registers itself as the single waiter and parks through the
//! [`Scheduler`]. Whichever of `send` or the sender's drop moves the state
//! off `EMPTY` also takes the waiter out of its slot and wakes it. The
//! receiver re-checks the state after registering, so a wake can never be
//! lost between the check and the park.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU8, Ordering};

use spin::Mutex;

use super::Scheduler;

const EMPTY: u8 = 0;
const FULL: u8 = 1;
const CLOSED: u8 = 2;

/// A parked receiver and the scheduler that can wake it.
struct Waiter {
    id: usize,
    scheduler: Arc<dyn Scheduler>,
}

struct Slot<T> {
    state: AtomicU8,
    value: Mutex<Option<T>>,
    waiter: Mutex<Option<Waiter>>,
}

impl<T> Slot<T> {
    /// Publish `state` and hand the waiter, if any, back to its scheduler.
    fn complete(&self, state: u8) {
        self.state.store(state, Ordering::Release);
        if let Some(waiter) = self.waiter.lock().take() {
            waiter.scheduler.wake(waiter.id);
        }
    }
}

/// Producing end of a one-shot channel.
pub struct Sender<T> {
    slot: Option<Arc<Slot<T>>>,
}

/// Consuming end of a one-shot channel.
pub struct Receiver<T> {
    slot: Arc<Slot<T>>,
}

/// Create a connected sender/receiver pair.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let slot = Arc::new(Slot {
        state: AtomicU8::new(EMPTY),
        value: Mutex::new(None),
        waiter: Mutex::new(None),
    });
    (
        Sender {
            slot: Some(Arc::clone(&slot)),
        },
        Receiver { slot },
    )
}

impl<T> Sender<T> {
    /// Publish the value and wake the receiver, if it is parked.
    pub fn send(mut self, value: T) {
        if let Some(slot) = self.slot.take() {
            *slot.value.lock() = Some(value);
            slot.complete(FULL);
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.complete(CLOSED);
        }
    }
}

impl<T> Receiver<T> {
    /// Block until the sender fires or goes away.
    ///
    /// Returns `None` if the sender was dropped without sending.
    pub fn recv(self, scheduler: &Arc<dyn Scheduler>) -> Option<T> {
        loop {
            match self.slot.state.load(Ordering::Acquire) {
                FULL => return self.slot.value.lock().take(),
                CLOSED => return None,
                _ => {}
            }

            *self.slot.waiter.lock() = Some(Waiter {
                id: scheduler.current(),
                scheduler: Arc::clone(scheduler),
            });
            if self.slot.state.load(Ordering::Acquire) != EMPTY {
                self.slot.waiter.lock().take();
                continue;
            }
            scheduler.block();
        }
    }
}
