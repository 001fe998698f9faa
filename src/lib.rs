/*!
 * Shmem Sync Library
 * PE-facing synchronization layer of a partitioned global address space
 *
 * Cooperating PEs share a symmetric heap and synchronize through one-sided
 * operations only: an MCS queue lock built from remote swap/CAS and remote
 * writes, the `wait_until*`/`test*` point-to-point family, remote atomics,
 * and communication contexts. The transport is consumed through
 * [`Transport`]; [`World`] runs every PE as a thread over the in-process
 * [`LocalFabric`].
 */

pub mod atomic;
pub mod context;
pub mod core;
pub mod lock;
pub mod monitoring;
pub mod runtime;
pub mod sync;
pub mod transport;

// Re-exports
pub use atomic::RemoteAtomics;
pub use context::{Context, ContextManager, ContextOptions, Team};
pub use crate::core::{
    fatal, DeliveryMode, LockOwnerPolicy, PeId, SerialGuard, ShmemConfig, ShmemError, ShmemInt,
    ShmemResult, SpinConfig, SymAddr, SymArray, SymLock, SymPtr, ThreadLevel, Width,
};
pub use lock::{LockAttempt, LockWord, SymLockGuard};
pub use monitoring::init_tracing;
pub use runtime::{Pe, SyncStatsSnapshot, World};
pub use sync::{CmpCode, CmpOp, CMP_EQ, CMP_GE, CMP_GT, CMP_LE, CMP_LT, CMP_NE};
pub use transport::{LocalFabric, LocalTransport, Transport};
