/*!
 * Lock Ownership
 * Which PE hosts the global word of a lock
 */

use crate::core::config::LockOwnerPolicy;
use crate::core::types::{PeId, SymAddr};

/// Owner of the lock at `addr`; identical on every PE
///
/// `Hashed` spreads locks across PEs by 8-byte slot, so addresses that
/// differ only below bit 3 share an owner. `HighestPe` pins every lock to
/// the last PE.
#[inline]
pub fn lock_owner(addr: SymAddr, n_pes: usize, policy: LockOwnerPolicy) -> PeId {
    match policy {
        LockOwnerPolicy::Hashed => (addr.as_usize() >> 3) % n_pes,
        LockOwnerPolicy::HighestPe => n_pes - 1,
    }
}
