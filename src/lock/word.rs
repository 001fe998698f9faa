/*!
 * Lock Word
 *
 * Packed 32-bit value shared by the global lock word and each PE's node
 * word. Bits 0..16 hold `locked`; bits 16..32 hold `next`, the queue
 * successor or tail, stored as `pe + 1` so that zero means FREE. An all-zero
 * word is therefore `{RESET, FREE}`, the state of fresh symmetric memory.
 */

use crate::core::types::PeId;
use std::fmt;

pub const RESET: u16 = 0;
pub const ACQUIRED: u16 = 1;

/// Raw `next` value meaning "no PE"
pub const FREE: u16 = 0;

const LOCKED_MASK: u32 = 0xFFFF;
const NEXT_SHIFT: u32 = 16;

/// Encode an optional PE into the biased 16-bit `next` field
#[inline]
pub fn encode_next(pe: Option<PeId>) -> u16 {
    match pe {
        Some(pe) => (pe + 1) as u16,
        None => FREE,
    }
}

#[inline]
pub fn decode_next(raw: u16) -> Option<PeId> {
    match raw {
        FREE => None,
        biased => Some(usize::from(biased) - 1),
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LockWord(u32);

impl LockWord {
    pub const UNLOCKED: LockWord = LockWord(0);

    pub fn new(locked: u16, next: Option<PeId>) -> Self {
        LockWord(u32::from(locked) | (u32::from(encode_next(next)) << NEXT_SHIFT))
    }

    /// `{ACQUIRED, pe}`: held, with `pe` as queue tail
    pub fn acquired_by(pe: PeId) -> Self {
        Self::new(ACQUIRED, Some(pe))
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        LockWord(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn locked(self) -> u16 {
        (self.0 & LOCKED_MASK) as u16
    }

    #[inline]
    pub const fn is_locked(self) -> bool {
        self.locked() != RESET
    }

    #[inline]
    pub fn next(self) -> Option<PeId> {
        decode_next((self.0 >> NEXT_SHIFT) as u16)
    }

    /// `next` as a signed PE number, -1 for FREE
    pub fn next_raw(self) -> i32 {
        self.next().map_or(-1, |pe| pe as i32)
    }
}

impl fmt::Debug for LockWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockWord")
            .field("locked", &self.locked())
            .field("next", &self.next_raw())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MAX_PES;

    #[test]
    fn test_zero_is_reset_free() {
        let word = LockWord::from_bits(0);
        assert_eq!(word, LockWord::UNLOCKED);
        assert!(!word.is_locked());
        assert_eq!(word.next(), None);
        assert_eq!(word.next_raw(), -1);
    }

    #[test]
    fn test_acquired_by_packs_both_fields() {
        let word = LockWord::acquired_by(0);
        assert_eq!(word.bits(), 0x0001_0001);
        assert!(word.is_locked());
        assert_eq!(word.next(), Some(0));

        let tail = LockWord::acquired_by(MAX_PES - 1);
        assert_eq!(tail.next(), Some(MAX_PES - 1));
        assert_eq!(tail.bits() >> 16, 0xFFFE);
    }

    #[test]
    fn test_next_encoding() {
        assert_eq!(encode_next(None), FREE);
        assert_eq!(decode_next(encode_next(Some(41))), Some(41));
        assert_eq!(LockWord::new(RESET, Some(3)).locked(), RESET);
    }
}
