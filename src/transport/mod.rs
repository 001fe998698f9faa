/*!
 * Transport Interface
 *
 * The primitive operations the synchronization layer consumes from the
 * communication substrate: identity, progress, completion fences, remote
 * atomics, and elemental put/get. Values cross this boundary as zero-extended
 * bit patterns tagged with their width, so one object-safe trait serves every
 * integer type.
 *
 * # Implementations
 *
 * - [`LocalTransport`]: in-process fabric where every PE is a thread and each
 *   partition is a slot array of 64-bit atomics
 */

mod fabric;
mod heap;

pub use fabric::{LocalFabric, LocalTransport};
pub use heap::SymmetricHeap;

use crate::core::types::{ContextId, PeId, SymAddr, Width};

/// A remote (or local) element: PE, symmetric address, and width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub pe: PeId,
    pub addr: SymAddr,
    pub width: Width,
}

impl Target {
    #[inline(always)]
    pub const fn new(pe: PeId, addr: SymAddr, width: Width) -> Self {
        Self { pe, addr, width }
    }
}

/// Communication substrate for one PE
///
/// All methods are non-blocking except `quiet`, `release_context`, and
/// `barrier_all`. Implementations must tolerate `progress` being called in
/// a tight loop from several local threads.
pub trait Transport: Send + Sync {
    fn my_pe(&self) -> PeId;

    fn n_pes(&self) -> usize;

    /// Bytes in each symmetric partition
    fn heap_len(&self) -> usize;

    /// Whether `addr` lies inside the symmetric partition
    fn global_address(&self, addr: SymAddr) -> bool {
        addr.as_usize() < self.heap_len()
    }

    /// Drive one step of completion service
    fn progress(&self);

    /// Block until every put previously issued through `ctx` is visible
    fn quiet(&self, ctx: ContextId);

    /// Quiet every context of this PE
    fn quiet_all(&self);

    /// Order puts issued through `ctx` before and after this call
    fn fence(&self, ctx: ContextId);

    /// Quiet, then wait for every PE to arrive
    fn barrier_all(&self);

    /// Flush and forget per-context state
    fn release_context(&self, ctx: ContextId);

    /// Read this PE's own partition
    fn load(&self, addr: SymAddr, width: Width) -> u64;

    /// Write this PE's own partition
    fn store(&self, addr: SymAddr, width: Width, bits: u64);

    /// Asynchronous single-element write
    fn put_value(&self, ctx: ContextId, target: Target, bits: u64);

    /// Blocking single-element read
    fn get_value(&self, ctx: ContextId, target: Target) -> u64;

    fn atomic_fetch(&self, ctx: ContextId, target: Target) -> u64;

    fn atomic_set(&self, ctx: ContextId, target: Target, bits: u64);

    fn atomic_swap(&self, ctx: ContextId, target: Target, bits: u64) -> u64;

    /// Returns the previous value; the swap happened iff it equals `cond`
    fn atomic_compare_swap(&self, ctx: ContextId, target: Target, cond: u64, bits: u64) -> u64;

    /// Wrapping add at `target.width`; returns the previous value
    fn atomic_fetch_add(&self, ctx: ContextId, target: Target, bits: u64) -> u64;
}
