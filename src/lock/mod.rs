/*!
 * Distributed Mutual-Exclusion Lock
 *
 * PE-facing lock entry points over [`SymLock`]. Every call validates the
 * lock, runs the MCS protocol under the serialization guard, and updates
 * the PE's lock counters.
 *
 * # Example
 *
 * ```ignore
 * let lock = pe.alloc_lock()?;
 * {
 *     let _held = pe.acquire(&lock);
 *     // critical section
 * }
 * ```
 */

mod mcs;
mod owner;
mod word;

pub(crate) use mcs::McsLock;
pub use mcs::{Acquisition, Release};
pub use owner::lock_owner;
pub use word::{decode_next, encode_next, LockWord, ACQUIRED, FREE, RESET};

use crate::core::errors::require;
use crate::core::types::{PeId, SymLock};
use crate::runtime::{Pe, SyncEvent};
use tracing::{debug, trace};

/// Result of a non-blocking acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAttempt {
    Acquired,
    Busy,
}

impl LockAttempt {
    /// 0 when acquired, 1 when busy
    pub const fn code(self) -> i32 {
        match self {
            LockAttempt::Acquired => 0,
            LockAttempt::Busy => 1,
        }
    }

    pub const fn is_acquired(self) -> bool {
        matches!(self, LockAttempt::Acquired)
    }
}

impl Pe {
    /// Block until the lock is held by this PE
    pub fn set_lock(&self, lock: &SymLock) {
        let mcs = self.validated_lock(lock);
        let outcome = self.guard().run(|| mcs.acquire());

        match outcome {
            Acquisition::Immediate => {
                self.sync_stats().record(SyncEvent::LockImmediate);
                trace!(pe = self.my_pe(), lock = %lock.addr(), "lock acquired");
            }
            Acquisition::Queued { predecessor } => {
                self.sync_stats().record(SyncEvent::LockQueued);
                debug!(pe = self.my_pe(), lock = %lock.addr(), predecessor, "lock acquired after queueing");
            }
        }
    }

    /// Release a lock held by this PE, handing it to the next waiter if any
    pub fn clear_lock(&self, lock: &SymLock) {
        let mcs = self.validated_lock(lock);
        let outcome = self.guard().run(|| mcs.release());

        match outcome {
            Release::Uncontended => {
                self.sync_stats().record(SyncEvent::ReleaseUncontended);
                trace!(pe = self.my_pe(), lock = %lock.addr(), "lock released");
            }
            Release::HandedOff { successor } => {
                self.sync_stats().record(SyncEvent::ReleaseHandoff);
                debug!(pe = self.my_pe(), lock = %lock.addr(), successor, "lock handed off");
            }
        }
    }

    /// Acquire only if the lock is free; never queues
    pub fn test_lock(&self, lock: &SymLock) -> LockAttempt {
        let mcs = self.validated_lock(lock);
        if self.guard().run(|| mcs.try_acquire()) {
            self.sync_stats().record(SyncEvent::LockImmediate);
            LockAttempt::Acquired
        } else {
            self.sync_stats().record(SyncEvent::LockBusy);
            LockAttempt::Busy
        }
    }

    /// Scoped [`set_lock`](Self::set_lock)
    pub fn acquire(&self, lock: &SymLock) -> SymLockGuard<'_> {
        self.set_lock(lock);
        SymLockGuard { pe: self, lock: *lock }
    }

    /// Scoped [`test_lock`](Self::test_lock)
    pub fn try_acquire(&self, lock: &SymLock) -> Option<SymLockGuard<'_>> {
        self.test_lock(lock)
            .is_acquired()
            .then(|| SymLockGuard { pe: self, lock: *lock })
    }

    /// PE hosting the lock's global word
    pub fn lock_owner(&self, lock: &SymLock) -> PeId {
        lock_owner(lock.addr(), self.n_pes(), self.config().lock_owner)
    }

    /// Current global state of the lock, read at its owner
    pub fn lock_state(&self, lock: &SymLock) -> LockWord {
        self.validated_lock(lock).peek()
    }

    fn validated_lock(&self, lock: &SymLock) -> McsLock<'_> {
        require(self.check_initialized());
        require(self.check_lock(*lock));
        McsLock::new(self, *lock)
    }
}

/// Holds a lock until dropped
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SymLockGuard<'a> {
    pe: &'a Pe,
    lock: SymLock,
}

impl SymLockGuard<'_> {
    pub fn lock(&self) -> &SymLock {
        &self.lock
    }

    pub fn release(self) {}
}

impl Drop for SymLockGuard<'_> {
    fn drop(&mut self) {
        self.pe.clear_lock(&self.lock);
    }
}

impl std::fmt::Debug for SymLockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymLockGuard")
            .field("pe", &self.pe.my_pe())
            .field("lock", &self.lock)
            .finish()
    }
}
