/*!
 * MCS Queue Lock Protocol
 *
 * Distributed queue lock over one symmetric slot. The global lock word lives
 * on the owner PE and records `{locked, tail}`; every PE's copy of the node
 * word records its own `{locked, next}` queue link. Waiters spin only on
 * their local node word, so a contended lock costs one remote swap per
 * acquire and one remote write per hand-off.
 *
 * # Protocol
 *
 * - Acquire swaps `{ACQUIRED, me}` into the lock word. A previously unlocked
 *   word means the lock is held. Otherwise the previous tail is linked to
 *   this PE and the caller spins until its predecessor resets its node.
 * - Release tries to swing the lock word from `{ACQUIRED, me}` back to
 *   unlocked. If a successor has swapped in, it waits for the successor's
 *   link and resets the successor's node instead.
 *
 * Quiet precedes every link announcement and the release CAS; a PE may only
 * be named as successor once its own node writes are complete.
 *
 * A node at rest always reads `{RESET, FREE}`: fresh symmetric memory is
 * zeroed, and release clears `next` once the successor has been consumed.
 * Nothing outside release writes the node's `next`, so a link that has
 * already arrived cannot be lost.
 */

use super::owner::lock_owner;
use super::word::{self, LockWord, ACQUIRED, RESET};
use crate::core::errors::{fatal, ShmemError};
use crate::core::types::{ContextId, PeId, SymAddr, SymLock, Width};
use crate::runtime::Pe;
use crate::transport::{Target, Transport};
use tracing::trace;

const CTX: ContextId = 0;

/// How an acquisition completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Immediate,
    Queued { predecessor: PeId },
}

/// How a release completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Uncontended,
    HandedOff { successor: PeId },
}

/// One PE's view of one lock; callers have already validated the lock
pub struct McsLock<'a> {
    pe: &'a Pe,
    lock: SymLock,
    owner: PeId,
    me: PeId,
}

impl<'a> McsLock<'a> {
    pub fn new(pe: &'a Pe, lock: SymLock) -> Self {
        Self {
            owner: lock_owner(lock.addr(), pe.n_pes(), pe.config().lock_owner),
            me: pe.my_pe(),
            lock,
            pe,
        }
    }

    pub fn owner(&self) -> PeId {
        self.owner
    }

    pub fn acquire(&self) -> Acquisition {
        let mine = LockWord::acquired_by(self.me);
        let prev = LockWord::from_bits(
            self.transport()
                .atomic_swap(CTX, self.lock_word(), u64::from(mine.bits())) as u32,
        );
        trace!(lock = %self.lock.addr(), owner = self.owner, ?prev, "lock word swapped");

        if !prev.is_locked() {
            return Acquisition::Immediate;
        }

        let Some(tail) = prev.next() else {
            fatal(ShmemError::CorruptedLock {
                addr: self.lock.addr(),
                detail: format!("held with no tail ({prev:?})"),
            });
        };

        self.store_node_locked(ACQUIRED);
        self.transport().put_value(
            CTX,
            self.node_field(tail, NodeField::Next),
            u64::from(word::encode_next(Some(self.me))),
        );
        self.transport().quiet(CTX);

        self.pe.spin().until(|| self.load_node_locked() == RESET);
        Acquisition::Queued { predecessor: tail }
    }

    pub fn release(&self) -> Release {
        self.transport().quiet(CTX);

        let successor = match self.load_node_next() {
            Some(successor) => successor,
            None => {
                let mine = LockWord::acquired_by(self.me);
                let prev = self.transport().atomic_compare_swap(
                    CTX,
                    self.lock_word(),
                    u64::from(mine.bits()),
                    u64::from(LockWord::UNLOCKED.bits()),
                );
                if prev as u32 == mine.bits() {
                    return Release::Uncontended;
                }
                // a successor swapped in; wait for its link
                self.pe.spin().until_some(|| self.load_node_next())
            }
        };

        // the link has been consumed; the node is private until the next enqueue
        self.store_node_next(None);
        self.transport().put_value(
            CTX,
            self.node_field(successor, NodeField::Locked),
            u64::from(RESET),
        );
        self.transport().quiet(CTX);
        Release::HandedOff { successor }
    }

    /// One CAS attempt; never queues and never touches the node
    pub fn try_acquire(&self) -> bool {
        let mine = LockWord::acquired_by(self.me);
        let prev = self.transport().atomic_compare_swap(
            CTX,
            self.lock_word(),
            u64::from(LockWord::UNLOCKED.bits()),
            u64::from(mine.bits()),
        );
        prev as u32 == LockWord::UNLOCKED.bits()
    }

    /// Current value of the global word, read at the owner
    pub fn peek(&self) -> LockWord {
        LockWord::from_bits(self.transport().atomic_fetch(CTX, self.lock_word()) as u32)
    }

    #[inline]
    fn transport(&self) -> &dyn Transport {
        self.pe.transport()
    }

    fn lock_word(&self) -> Target {
        Target::new(self.owner, self.lock.lock_word(), Width::W32)
    }

    fn node_field(&self, pe: PeId, field: NodeField) -> Target {
        Target::new(pe, field.addr(self.lock), Width::W16)
    }

    fn store_node_next(&self, next: Option<PeId>) {
        self.transport().store(
            NodeField::Next.addr(self.lock),
            Width::W16,
            u64::from(word::encode_next(next)),
        );
    }

    fn store_node_locked(&self, locked: u16) {
        self.transport()
            .store(NodeField::Locked.addr(self.lock), Width::W16, u64::from(locked));
    }

    fn load_node_next(&self) -> Option<PeId> {
        let raw = self.transport().load(NodeField::Next.addr(self.lock), Width::W16);
        word::decode_next(raw as u16)
    }

    fn load_node_locked(&self) -> u16 {
        self.transport()
            .load(NodeField::Locked.addr(self.lock), Width::W16) as u16
    }
}

#[derive(Clone, Copy)]
enum NodeField {
    Locked,
    Next,
}

impl NodeField {
    fn addr(self, lock: SymLock) -> SymAddr {
        match self {
            NodeField::Locked => lock.node_word(),
            NodeField::Next => lock.node_word().offset(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LockOwnerPolicy, ShmemConfig};
    use crate::runtime::World;

    #[test]
    fn test_uncontended_cycle_restores_word() {
        let world = World::new(ShmemConfig::new(2).with_symmetric_size(64)).unwrap();
        let outcomes = world.run(|pe| {
            let lock = pe.alloc_lock().unwrap();
            let mcs = McsLock::new(pe, lock);
            let mut outcomes = Vec::new();
            if pe.my_pe() == 1 {
                outcomes.push(format!("{:?}", mcs.acquire()));
                outcomes.push(format!("{:?}", mcs.peek()));
                outcomes.push(format!("{:?}", mcs.release()));
                outcomes.push(format!("{:?}", mcs.peek()));
            }
            outcomes
        });

        assert_eq!(
            outcomes[1],
            vec![
                "Immediate".to_string(),
                "LockWord { locked: 1, next: 1 }".to_string(),
                "Uncontended".to_string(),
                "LockWord { locked: 0, next: -1 }".to_string(),
            ]
        );
    }

    #[test]
    fn test_try_acquire_against_holder() {
        let config = ShmemConfig::new(2)
            .with_symmetric_size(64)
            .with_lock_owner(LockOwnerPolicy::HighestPe);
        let world = World::new(config).unwrap();
        let results = world.run(|pe| {
            let lock = pe.alloc_lock().unwrap();
            let mcs = McsLock::new(pe, lock);
            assert_eq!(mcs.owner(), 1);

            if pe.my_pe() == 0 {
                assert!(mcs.try_acquire());
            }
            pe.barrier_all();
            let attempt = if pe.my_pe() == 1 { Some(mcs.try_acquire()) } else { None };
            pe.barrier_all();
            if pe.my_pe() == 0 {
                assert_eq!(mcs.release(), Release::Uncontended);
            }
            attempt
        });
        assert_eq!(results, vec![None, Some(false)]);
    }

    #[test]
    fn test_handoff_follows_link_order() {
        const ROUNDS: usize = 40;
        let world = World::new(ShmemConfig::new(4).with_symmetric_size(1024)).unwrap();
        let logs = world.run(|pe| {
            let lock = pe.alloc_lock().unwrap();
            let next = pe.alloc::<u64>().unwrap();
            let log = pe.alloc_array::<i32>(4 * ROUNDS).unwrap();
            let mcs = McsLock::new(pe, lock);
            pe.barrier_all();

            for _ in 0..ROUNDS {
                // entry: holder * 16 + predecessor + 1, or holder * 16 when immediate
                let entry = match mcs.acquire() {
                    Acquisition::Immediate => pe.my_pe() as i32 * 16,
                    Acquisition::Queued { predecessor } => {
                        pe.my_pe() as i32 * 16 + predecessor as i32 + 1
                    }
                };
                let slot = pe.get_value(next, 0);
                pe.put_value(log.at(slot as usize), entry, 0);
                pe.put_value(next, slot + 1, 0);
                pe.quiet();
                mcs.release();
            }

            pe.barrier_all();
            (pe.my_pe() == 0).then(|| pe.read_array(log))
        });

        let log = logs[0].as_ref().unwrap();
        let mut queued = 0;
        for (i, entry) in log.iter().enumerate() {
            let predecessor = entry % 16;
            if predecessor == 0 {
                continue;
            }
            queued += 1;
            assert!(i > 0, "first holder cannot have a predecessor");
            assert_eq!(log[i - 1] / 16, predecessor - 1, "entry {i} of {log:?}");
        }
        assert!(queued > 0);
    }

    #[test]
    fn test_release_clears_consumed_link() {
        let world = World::new(ShmemConfig::new(2).with_symmetric_size(64)).unwrap();
        let outcomes = world.run(|pe| {
            let mcs = McsLock::new(pe, pe.alloc_lock().unwrap());
            if pe.my_pe() == 0 {
                assert_eq!(mcs.acquire(), Acquisition::Immediate);
            }
            pe.barrier_all();

            if pe.my_pe() == 0 {
                let successor = pe.spin().until_some(|| mcs.load_node_next());
                assert!(!mcs.try_acquire());
                assert_eq!(mcs.load_node_next(), Some(successor));
                (mcs.release(), mcs.load_node_next())
            } else {
                let acquired = mcs.acquire();
                assert_eq!(acquired, Acquisition::Queued { predecessor: 0 });
                (mcs.release(), mcs.load_node_next())
            }
        });

        assert_eq!(
            outcomes,
            vec![
                (Release::HandedOff { successor: 1 }, None),
                (Release::Uncontended, None),
            ]
        );
    }

    #[test]
    fn test_node_fields_share_the_lock_slot() {
        let lock = SymLock::new(SymAddr(16));
        assert_eq!(NodeField::Locked.addr(lock), SymAddr(20));
        assert_eq!(NodeField::Next.addr(lock), SymAddr(22));
    }
}
