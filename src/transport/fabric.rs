/*!
 * In-Process Fabric
 *
 * Connects PE threads of one process. Remote atomics execute directly on the
 * target partition. Elemental puts are either applied when issued (eager) or
 * buffered per (issuing PE, context) and applied in FIFO order when that PE
 * quiets, or when any PE drives progress (deferred).
 *
 * # Ordering
 *
 * A queue is drained while its owner's outbound lock is held, so two
 * concurrent drainers can never reorder puts of the same context.
 */

use super::heap::SymmetricHeap;
use super::{Target, Transport};
use crate::core::config::{DeliveryMode, ShmemConfig};
use crate::core::errors::{fatal, ShmemError};
use crate::core::types::{ContextId, PeId, SymAddr, Width};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{self, Ordering};
use std::sync::{Arc, Barrier};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct PendingPut {
    target: Target,
    bits: u64,
}

type Outbound = AHashMap<ContextId, VecDeque<PendingPut>>;

struct Partition {
    heap: SymmetricHeap,
    outbound: Mutex<Outbound>,
}

pub struct LocalFabric {
    partitions: Vec<Partition>,
    barrier: Barrier,
    delivery: DeliveryMode,
    heap_len: usize,
}

impl LocalFabric {
    pub fn new(config: &ShmemConfig) -> Arc<Self> {
        let partitions = (0..config.n_pes)
            .map(|_| Partition {
                heap: SymmetricHeap::new(config.symmetric_size),
                outbound: Mutex::new(Outbound::default()),
            })
            .collect();

        Arc::new(Self {
            partitions,
            barrier: Barrier::new(config.n_pes),
            delivery: config.delivery,
            heap_len: config.symmetric_size,
        })
    }

    /// Transport endpoint for `pe`
    pub fn transport(self: &Arc<Self>, pe: PeId) -> LocalTransport {
        LocalTransport {
            fabric: Arc::clone(self),
            me: pe,
        }
    }

    pub fn n_pes(&self) -> usize {
        self.partitions.len()
    }

    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Direct view of a partition, for inspection outside PE threads
    pub fn heap(&self, pe: PeId) -> &SymmetricHeap {
        &self.partition(pe).heap
    }

    /// Number of puts issued by `pe` that are not yet visible
    pub fn pending_puts(&self, pe: PeId) -> usize {
        self.partition(pe)
            .outbound
            .lock()
            .values()
            .map(VecDeque::len)
            .sum()
    }

    fn partition(&self, pe: PeId) -> &Partition {
        match self.partitions.get(pe) {
            Some(partition) => partition,
            None => fatal(ShmemError::InvalidPe {
                pe,
                size: self.partitions.len(),
            }),
        }
    }

    #[inline]
    fn apply(&self, put: &PendingPut) {
        self.partition(put.target.pe)
            .heap
            .store(put.target.addr, put.target.width, put.bits);
    }

    fn enqueue(&self, from: PeId, ctx: ContextId, put: PendingPut) {
        match self.delivery {
            DeliveryMode::Eager => self.apply(&put),
            DeliveryMode::Deferred => {
                self.partition(from)
                    .outbound
                    .lock()
                    .entry(ctx)
                    .or_default()
                    .push_back(put);
            }
        }
    }

    fn drain(&self, queue: &mut VecDeque<PendingPut>) -> usize {
        let count = queue.len();
        for put in queue.drain(..) {
            self.apply(&put);
        }
        count
    }

    /// Apply every pending put `pe` issued through `ctx`
    fn flush_context(&self, pe: PeId, ctx: ContextId) {
        let mut outbound = self.partition(pe).outbound.lock();
        if let Some(queue) = outbound.get_mut(&ctx) {
            self.drain(queue);
        }
    }

    /// Apply every pending put `pe` issued through any context
    fn flush_pe(&self, pe: PeId) {
        let mut outbound = self.partition(pe).outbound.lock();
        for queue in outbound.values_mut() {
            self.drain(queue);
        }
    }

    /// Opportunistic flush of every PE's queues, skipping busy ones
    fn service(&self) {
        for (pe, partition) in self.partitions.iter().enumerate() {
            if let Some(mut outbound) = partition.outbound.try_lock() {
                let applied: usize = outbound.values_mut().map(|q| self.drain(q)).sum();
                if applied > 0 {
                    trace!(pe, applied, "progress delivered puts");
                }
            }
        }
    }

    fn release(&self, pe: PeId, ctx: ContextId) {
        let mut outbound = self.partition(pe).outbound.lock();
        if let Some(mut queue) = outbound.remove(&ctx) {
            self.drain(&mut queue);
        }
    }
}

impl std::fmt::Debug for LocalFabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFabric")
            .field("n_pes", &self.partitions.len())
            .field("heap_len", &self.heap_len)
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// One PE's endpoint on a [`LocalFabric`]
#[derive(Clone)]
pub struct LocalTransport {
    fabric: Arc<LocalFabric>,
    me: PeId,
}

impl LocalTransport {
    pub fn fabric(&self) -> &Arc<LocalFabric> {
        &self.fabric
    }

    #[inline]
    fn heap_of(&self, pe: PeId) -> &SymmetricHeap {
        &self.fabric.partition(pe).heap
    }
}

impl std::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTransport").field("me", &self.me).finish()
    }
}

impl Transport for LocalTransport {
    fn my_pe(&self) -> PeId {
        self.me
    }

    fn n_pes(&self) -> usize {
        self.fabric.n_pes()
    }

    fn heap_len(&self) -> usize {
        self.fabric.heap_len
    }

    fn progress(&self) {
        if self.fabric.delivery == DeliveryMode::Deferred {
            self.fabric.service();
        }
        std::hint::spin_loop();
    }

    fn quiet(&self, ctx: ContextId) {
        self.fabric.flush_context(self.me, ctx);
        atomic::fence(Ordering::SeqCst);
    }

    fn quiet_all(&self) {
        self.fabric.flush_pe(self.me);
        atomic::fence(Ordering::SeqCst);
    }

    fn fence(&self, _ctx: ContextId) {
        // per-context queues are already FIFO
        atomic::fence(Ordering::Release);
    }

    fn barrier_all(&self) {
        self.quiet_all();
        self.fabric.barrier.wait();
    }

    fn release_context(&self, ctx: ContextId) {
        self.fabric.release(self.me, ctx);
        atomic::fence(Ordering::SeqCst);
    }

    fn load(&self, addr: SymAddr, width: Width) -> u64 {
        self.heap_of(self.me).load(addr, width)
    }

    fn store(&self, addr: SymAddr, width: Width, bits: u64) {
        self.heap_of(self.me).store(addr, width, bits)
    }

    fn put_value(&self, ctx: ContextId, target: Target, bits: u64) {
        self.fabric
            .enqueue(self.me, ctx, PendingPut { target, bits });
    }

    fn get_value(&self, _ctx: ContextId, target: Target) -> u64 {
        self.heap_of(target.pe).load(target.addr, target.width)
    }

    fn atomic_fetch(&self, _ctx: ContextId, target: Target) -> u64 {
        self.heap_of(target.pe).load(target.addr, target.width)
    }

    fn atomic_set(&self, _ctx: ContextId, target: Target, bits: u64) {
        self.heap_of(target.pe).store(target.addr, target.width, bits)
    }

    fn atomic_swap(&self, _ctx: ContextId, target: Target, bits: u64) -> u64 {
        self.heap_of(target.pe).swap(target.addr, target.width, bits)
    }

    fn atomic_compare_swap(&self, _ctx: ContextId, target: Target, cond: u64, bits: u64) -> u64 {
        self.heap_of(target.pe)
            .compare_swap(target.addr, target.width, cond, bits)
    }

    fn atomic_fetch_add(&self, _ctx: ContextId, target: Target, bits: u64) -> u64 {
        self.heap_of(target.pe)
            .fetch_add(target.addr, target.width, bits)
    }
}
