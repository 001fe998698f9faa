/*!
 * Runtime
 *
 * Per-PE state ([`Pe`]), the in-process launcher ([`World`]), symmetric
 * allocation, and synchronization counters.
 */

mod alloc;
mod pe;
mod stats;
mod world;

pub use alloc::SymmetricAllocator;
pub use pe::Pe;
pub use stats::{SyncEvent, SyncStats, SyncStatsSnapshot};
pub use world::World;
