/*!
 * PE Handle
 *
 * The calling PE's view of the library: identity, initialization state,
 * symmetric allocation, local access, contexts, and the precondition checks
 * every entry point runs before touching remote memory. The lock, atomic,
 * RMA, and wait/test entry points extend this type from their own modules.
 */

use super::alloc::SymmetricAllocator;
use super::stats::{SyncStats, SyncStatsSnapshot};
use crate::context::{Context, ContextManager, ContextOptions, Team};
use crate::core::config::ShmemConfig;
use crate::core::errors::{fatal, require, ShmemError};
use crate::core::serial::SerialGuard;
use crate::core::types::{PeId, ShmemInt, ShmemResult, SymAddr, SymArray, SymLock, SymPtr, SLOT_BYTES};
use crate::sync::ProgressSpin;
use crate::transport::{Target, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Pe {
    transport: Arc<dyn Transport>,
    config: Arc<ShmemConfig>,
    guard: SerialGuard,
    contexts: ContextManager,
    allocator: SymmetricAllocator,
    initialized: AtomicBool,
    stats: SyncStats,
}

impl Pe {
    /// Initialize the calling PE on top of `transport`
    pub fn init(transport: Arc<dyn Transport>, config: Arc<ShmemConfig>) -> Self {
        let world = Team::world(transport.n_pes());
        let pe = Self {
            guard: SerialGuard::new(config.thread_level),
            contexts: ContextManager::new(world, config.max_contexts),
            allocator: SymmetricAllocator::new(transport.heap_len()),
            initialized: AtomicBool::new(true),
            stats: SyncStats::default(),
            transport,
            config,
        };

        debug!(
            pe = pe.my_pe(),
            n_pes = pe.n_pes(),
            thread_level = ?pe.config.thread_level,
            serialized = pe.guard.is_active(),
            "PE initialized"
        );
        pe
    }

    /// Flush outstanding puts, synchronize with every PE, and stop accepting calls
    ///
    /// Collective; later calls are no-ops.
    pub fn finalize(&self) {
        if !self.initialized.load(Ordering::Acquire) {
            return;
        }
        self.transport.quiet_all();
        self.transport.barrier_all();
        self.initialized.store(false, Ordering::Release);
        debug!(pe = self.my_pe(), stats = ?self.stats(), "PE finalized");
    }

    #[inline]
    pub fn my_pe(&self) -> PeId {
        self.transport.my_pe()
    }

    #[inline]
    pub fn n_pes(&self) -> usize {
        self.transport.n_pes()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ShmemConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn contexts(&self) -> &ContextManager {
        &self.contexts
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn sync_stats(&self) -> &SyncStats {
        &self.stats
    }

    pub(crate) fn guard(&self) -> &SerialGuard {
        &self.guard
    }

    pub(crate) fn spin(&self) -> ProgressSpin<'_> {
        ProgressSpin::new(self.transport.as_ref(), self.config.spin)
    }

    // ---------------------------------------------------------------------
    // Symmetric allocation
    // ---------------------------------------------------------------------

    /// Allocate one zeroed element; every PE must make the same call sequence
    pub fn alloc<T: ShmemInt>(&self) -> ShmemResult<SymPtr<T>> {
        require(self.check_initialized());
        let addr = self.allocator.alloc(T::WIDTH.bytes())?;
        Ok(SymPtr::new(addr))
    }

    /// Allocate `len` zeroed, densely packed elements
    pub fn alloc_array<T: ShmemInt>(&self, len: usize) -> ShmemResult<SymArray<T>> {
        require(self.check_initialized());
        let bytes = len
            .checked_mul(T::WIDTH.bytes())
            .ok_or_else(|| ShmemError::HeapExhausted {
                requested: usize::MAX,
                available: self.allocator.available(),
            })?;
        let addr = self.allocator.alloc(bytes)?;
        Ok(SymArray::new(addr, len))
    }

    /// Allocate a lock; fresh symmetric memory is already `{RESET, FREE}`
    pub fn alloc_lock(&self) -> ShmemResult<SymLock> {
        require(self.check_initialized());
        let addr = self.allocator.alloc(SymLock::SIZE)?;
        Ok(SymLock::new(addr))
    }

    /// Bytes of the partition not yet allocated
    pub fn heap_available(&self) -> usize {
        self.allocator.available()
    }

    // ---------------------------------------------------------------------
    // Local access
    // ---------------------------------------------------------------------

    /// Read an element of this PE's partition
    pub fn read<T: ShmemInt>(&self, ptr: SymPtr<T>) -> T {
        require(self.check_initialized());
        require(self.check_element::<T>(ptr.addr()));
        T::from_bits(self.transport.load(ptr.addr(), T::WIDTH))
    }

    /// Write an element of this PE's partition
    pub fn write<T: ShmemInt>(&self, ptr: SymPtr<T>, value: T) {
        require(self.check_initialized());
        require(self.check_element::<T>(ptr.addr()));
        self.transport.store(ptr.addr(), T::WIDTH, value.to_bits());
    }

    /// Snapshot of a local array, element by element
    pub fn read_array<T: ShmemInt>(&self, array: SymArray<T>) -> Vec<T> {
        require(self.check_initialized());
        require(self.check_symmetric(array.addr(), array.byte_len(), T::WIDTH.bytes()));
        array
            .iter()
            .map(|ptr| T::from_bits(self.transport.load(ptr.addr(), T::WIDTH)))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Contexts
    // ---------------------------------------------------------------------

    /// Create a context bound to `team` (world when `None`)
    pub fn ctx_create(&self, options: ContextOptions, team: Option<Team>) -> ShmemResult<Context> {
        require(self.check_initialized());
        self.guard.run(|| self.contexts.create(options, team))
    }

    /// Quiet and destroy a context; must run on the creating thread
    pub fn ctx_destroy(&self, ctx: Context) {
        require(self.check_initialized());
        self.guard.run(|| {
            if let Some(entry) = self.contexts.get(ctx) {
                if entry.created_by_current_thread() {
                    self.transport.release_context(ctx.id());
                }
            }
            if let Err(err) = self.contexts.destroy(ctx) {
                fatal(err);
            }
        });
    }

    // ---------------------------------------------------------------------
    // Preconditions
    // ---------------------------------------------------------------------

    pub(crate) fn check_initialized(&self) -> ShmemResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ShmemError::NotInitialized)
        }
    }

    /// `[addr, addr + len)` lies in the partition and `addr` is `align`-aligned
    pub(crate) fn check_symmetric(&self, addr: SymAddr, len: usize, align: usize) -> ShmemResult<()> {
        if !addr.is_aligned_to(align) {
            return Err(ShmemError::Misaligned {
                addr,
                alignment: align,
            });
        }

        let heap_len = self.transport.heap_len();
        let in_range = addr
            .as_usize()
            .checked_add(len)
            .is_some_and(|end| end <= heap_len)
            && (len == 0 || self.transport.global_address(addr));

        if in_range {
            Ok(())
        } else {
            Err(ShmemError::NotSymmetric {
                addr,
                len,
                heap_len,
            })
        }
    }

    pub(crate) fn check_element<T: ShmemInt>(&self, addr: SymAddr) -> ShmemResult<()> {
        self.check_symmetric(addr, T::WIDTH.bytes(), T::WIDTH.bytes())
    }

    pub(crate) fn check_lock(&self, lock: SymLock) -> ShmemResult<()> {
        self.check_symmetric(lock.addr(), SymLock::SIZE, SLOT_BYTES)
    }

    /// Resolve a context-relative element on `pe`, aborting on any violation
    pub(crate) fn remote_target<T: ShmemInt>(&self, ctx: &Context, ptr: SymPtr<T>, pe: PeId) -> Target {
        let resolved = self.check_initialized().and_then(|_| {
            let world_pe = self.contexts.team_of(*ctx)?.translate(pe)?;
            self.check_element::<T>(ptr.addr())?;
            Ok(world_pe)
        });

        match resolved {
            Ok(world_pe) => Target::new(world_pe, ptr.addr(), T::WIDTH),
            Err(err) => fatal(err),
        }
    }
}

impl std::fmt::Debug for Pe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pe")
            .field("my_pe", &self.my_pe())
            .field("n_pes", &self.n_pes())
            .field("initialized", &self.is_initialized())
            .field("guard", &self.guard)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

impl Drop for Pe {
    fn drop(&mut self) {
        if self.is_initialized() {
            info!(pe = self.my_pe(), "PE dropped without finalize; flushing puts");
            self.transport.quiet_all();
        }
    }
}
