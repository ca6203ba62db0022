//! Binary semaphores guarding the shared resources
//!
//! One semaphore per fork, each starting with a single free permit.
//! `acquire` blocks until the permit is free; `release` hands it back and
//! wakes at most one waiter. Wakeup order among multiple waiters is whatever
//! the scheduler does; there is deliberately no fairness contract.

use parking_lot::{Condvar, Mutex};

use crate::core::types::ResourceId;

/// A semaphore with a single permit
///
/// Built from a `parking_lot` mutex and condvar. Unlike a mutex guard the
/// permit is not tied to the acquiring thread, which is what lets the agent
/// state machine hold it across its eating phase without a borrow in scope.
struct BinarySemaphore {
    free: Mutex<bool>,
    available: Condvar,
}

impl BinarySemaphore {
    fn new() -> Self {
        BinarySemaphore {
            free: Mutex::new(true),
            available: Condvar::new(),
        }
    }

    /// Block until the permit is free, then take it
    fn acquire(&self) {
        let mut free = self.free.lock();
        while !*free {
            self.available.wait(&mut free);
        }
        *free = false;
    }

    /// Take the permit only if it is free right now
    fn try_acquire(&self) -> bool {
        let mut free = self.free.lock();
        if *free {
            *free = false;
            true
        } else {
            false
        }
    }

    /// Return the permit and wake at most one waiter
    ///
    /// Releasing a permit that was never taken is a logic fault in the
    /// caller, checked only in debug builds.
    fn release(&self) {
        let mut free = self.free.lock();
        debug_assert!(!*free, "release without a matching acquire");
        *free = true;
        self.available.notify_one();
    }

    fn is_free(&self) -> bool {
        *self.free.lock()
    }
}

/// The table's forks: independent binary semaphores indexed by resource id
pub struct ResourceSet {
    slots: Vec<BinarySemaphore>,
}

impl ResourceSet {
    /// Create `count` resources, all free
    pub fn new(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, BinarySemaphore::new);
        ResourceSet { slots }
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the set holds no resources
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Block the calling thread until `resource` is free, then take it
    ///
    /// There is no timeout: if the permit never frees, this call never
    /// returns. That is the accepted shape of a genuine deadlock here.
    pub fn acquire(&self, resource: ResourceId) {
        self.slots[resource].acquire();
    }

    /// Take `resource` only if it is free right now
    pub fn try_acquire(&self, resource: ResourceId) -> bool {
        self.slots[resource].try_acquire()
    }

    /// Return `resource`'s permit, waking at most one blocked waiter
    pub fn release(&self, resource: ResourceId) {
        self.slots[resource].release();
    }

    /// True when `resource`'s permit is available
    ///
    /// Racy while other threads run; stable once they have quiesced, which
    /// is when the leak checks in the tests use it.
    pub fn is_free(&self, resource: ResourceId) -> bool {
        self.slots[resource].is_free()
    }
}
