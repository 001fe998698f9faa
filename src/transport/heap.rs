/*!
 * Symmetric Partition
 *
 * One PE's share of the symmetric heap: a zeroed array of 64-bit atomic
 * slots. Narrower elements occupy their natural byte lanes inside a slot,
 * and every narrow write is a read-modify-write of the whole slot that only
 * replaces its own lanes, so neighbours packed into the same slot never
 * clobber each other.
 */

use crate::core::errors::{fatal, ShmemError};
use crate::core::types::{SymAddr, Width, SLOT_BYTES};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct SymmetricHeap {
    slots: Box<[AtomicU64]>,
}

impl SymmetricHeap {
    /// Allocate a zeroed partition of `bytes` (rounded up to whole slots)
    pub fn new(bytes: usize) -> Self {
        let count = bytes.div_ceil(SLOT_BYTES);
        let slots = (0..count).map(|_| AtomicU64::new(0)).collect();
        Self { slots }
    }

    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.slots.len() * SLOT_BYTES
    }

    #[inline]
    fn slot(&self, addr: SymAddr, width: Width) -> &AtomicU64 {
        match self.slots.get(addr.slot()) {
            Some(slot) => slot,
            None => fatal(ShmemError::NotSymmetric {
                addr,
                len: width.bytes(),
                heap_len: self.len_bytes(),
            }),
        }
    }

    #[inline]
    pub fn load(&self, addr: SymAddr, width: Width) -> u64 {
        let word = self.slot(addr, width).load(Ordering::Acquire);
        (word >> addr.shift()) & width.mask()
    }

    #[inline]
    pub fn store(&self, addr: SymAddr, width: Width, bits: u64) {
        if width == Width::W64 {
            self.slot(addr, width).store(bits, Ordering::SeqCst);
        } else {
            self.swap(addr, width, bits);
        }
    }

    /// Replace the `width` lanes at `addr`, returning the previous value
    pub fn swap(&self, addr: SymAddr, width: Width, bits: u64) -> u64 {
        match self.update(addr, width, |_| Some(bits)) {
            Ok(prev) | Err(prev) => prev,
        }
    }

    pub fn compare_swap(&self, addr: SymAddr, width: Width, cond: u64, bits: u64) -> u64 {
        let cond = cond & width.mask();
        match self.update(addr, width, |field| (field == cond).then_some(bits)) {
            Ok(prev) | Err(prev) => prev,
        }
    }

    pub fn fetch_add(&self, addr: SymAddr, width: Width, bits: u64) -> u64 {
        match self.update(addr, width, |field| Some(field.wrapping_add(bits))) {
            Ok(prev) | Err(prev) => prev,
        }
    }

    /// Atomically replace the `width` lanes at `addr` with `f(old)`
    ///
    /// Returns `Ok(old)` when `f` produced a value, `Err(old)` when it declined.
    fn update<F>(&self, addr: SymAddr, width: Width, mut f: F) -> Result<u64, u64>
    where
        F: FnMut(u64) -> Option<u64>,
    {
        let shift = addr.shift();
        let mask = width.mask();
        let lanes = mask << shift;

        self.slot(addr, width)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                let field = (word >> shift) & mask;
                f(field).map(|new| (word & !lanes) | ((new & mask) << shift))
            })
            .map(|word| (word >> shift) & mask)
            .map_err(|word| (word >> shift) & mask)
    }
}

impl std::fmt::Debug for SymmetricHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricHeap")
            .field("bytes", &self.len_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let heap = SymmetricHeap::new(64);
        assert_eq!(heap.len_bytes(), 64);
        for slot in 0..8 {
            assert_eq!(heap.load(SymAddr(slot * 8), Width::W64), 0);
        }
    }

    #[test]
    fn test_narrow_lanes_are_independent() {
        let heap = SymmetricHeap::new(16);
        heap.store(SymAddr(0), Width::W16, 0xAAAA);
        heap.store(SymAddr(2), Width::W16, 0xBBBB);
        heap.store(SymAddr(4), Width::W32, 0x1234_5678);

        assert_eq!(heap.load(SymAddr(0), Width::W16), 0xAAAA);
        assert_eq!(heap.load(SymAddr(2), Width::W16), 0xBBBB);
        assert_eq!(heap.load(SymAddr(4), Width::W32), 0x1234_5678);
        assert_eq!(heap.load(SymAddr(0), Width::W64), 0x1234_5678_BBBB_AAAA);
    }

    #[test]
    fn test_fetch_add_wraps_at_width() {
        let heap = SymmetricHeap::new(8);
        heap.store(SymAddr(0), Width::W16, 0xFFFF);
        heap.store(SymAddr(2), Width::W16, 7);

        let prev = heap.fetch_add(SymAddr(0), Width::W16, 1);
        assert_eq!(prev, 0xFFFF);
        assert_eq!(heap.load(SymAddr(0), Width::W16), 0);
        // carry must not leak into the neighbouring lane
        assert_eq!(heap.load(SymAddr(2), Width::W16), 7);
    }

    #[test]
    fn test_compare_swap() {
        let heap = SymmetricHeap::new(8);
        heap.store(SymAddr(4), Width::W32, 5);

        assert_eq!(heap.compare_swap(SymAddr(4), Width::W32, 4, 9), 5);
        assert_eq!(heap.load(SymAddr(4), Width::W32), 5);

        assert_eq!(heap.compare_swap(SymAddr(4), Width::W32, 5, 9), 5);
        assert_eq!(heap.load(SymAddr(4), Width::W32), 9);
    }

    #[test]
    fn test_swap_returns_previous() {
        let heap = SymmetricHeap::new(8);
        assert_eq!(heap.swap(SymAddr(0), Width::W64, 42), 0);
        assert_eq!(heap.swap(SymAddr(0), Width::W64, 43), 42);

        heap.store(SymAddr(6), Width::W16, 3);
        assert_eq!(heap.swap(SymAddr(6), Width::W16, 4), 3);
        assert_eq!(heap.load(SymAddr(0), Width::W64), 0x0004_0000_0000_002B);
    }
}
