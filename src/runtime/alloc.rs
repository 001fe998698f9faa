/*!
 * Symmetric Allocator
 *
 * Deterministic bump allocation over a PE's partition. Every PE runs the same
 * allocation sequence, so the same call returns the same offset everywhere,
 * with no communication. Memory is never reused, so allocations start zeroed.
 */

use crate::core::errors::ShmemError;
use crate::core::types::{ShmemResult, SymAddr, SLOT_BYTES};
use parking_lot::Mutex;

pub struct SymmetricAllocator {
    next: Mutex<usize>,
    limit: usize,
}

impl SymmetricAllocator {
    pub fn new(limit: usize) -> Self {
        Self {
            next: Mutex::new(0),
            limit,
        }
    }

    /// Reserve `bytes`, slot aligned
    pub fn alloc(&self, bytes: usize) -> ShmemResult<SymAddr> {
        let mut next = self.next.lock();
        let start = *next;
        let available = self.limit - start;
        let padded = bytes
            .div_ceil(SLOT_BYTES)
            .checked_mul(SLOT_BYTES)
            .filter(|&padded| padded <= available)
            .ok_or(ShmemError::HeapExhausted {
                requested: bytes,
                available,
            })?;

        *next = start + padded;
        Ok(SymAddr(start))
    }

    pub fn used(&self) -> usize {
        *self.next.lock()
    }

    pub fn available(&self) -> usize {
        self.limit - self.used()
    }
}

impl std::fmt::Debug for SymmetricAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricAllocator")
            .field("used", &self.used())
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_aligned_bump() {
        let alloc = SymmetricAllocator::new(64);
        assert_eq!(alloc.alloc(6).unwrap(), SymAddr(0));
        assert_eq!(alloc.alloc(8).unwrap(), SymAddr(8));
        assert_eq!(alloc.alloc(1).unwrap(), SymAddr(16));
        assert_eq!(alloc.used(), 24);
    }

    #[test]
    fn test_zero_length() {
        let alloc = SymmetricAllocator::new(16);
        assert_eq!(alloc.alloc(0).unwrap(), SymAddr(0));
        assert_eq!(alloc.alloc(0).unwrap(), SymAddr(0));
        assert_eq!(alloc.available(), 16);
    }

    #[test]
    fn test_exhaustion() {
        let alloc = SymmetricAllocator::new(16);
        alloc.alloc(12).unwrap();
        assert_eq!(
            alloc.alloc(1),
            Err(ShmemError::HeapExhausted {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_padding_overflow_is_exhaustion() {
        let alloc = SymmetricAllocator::new(16);
        assert_eq!(
            alloc.alloc(usize::MAX - 3),
            Err(ShmemError::HeapExhausted {
                requested: usize::MAX - 3,
                available: 16
            })
        );
        assert_eq!(alloc.used(), 0);
    }

    #[test]
    fn test_identical_sequences_agree() {
        let a = SymmetricAllocator::new(1024);
        let b = SymmetricAllocator::new(1024);
        for bytes in [3, 16, 40, 2] {
            assert_eq!(a.alloc(bytes).unwrap(), b.alloc(bytes).unwrap());
        }
    }
}
