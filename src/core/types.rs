/*!
 * Core Types
 * Common types used across the symmetric-memory layer
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Processing element (PE) number within the world team
pub type PeId = usize;

/// Context identifier (0 is the default context)
pub type ContextId = u32;

/// Team identifier (0 is the world team)
pub type TeamId = u32;

/// Common result type for fallible operations
pub type ShmemResult<T> = Result<T, super::errors::ShmemError>;

/// Bytes per backing slot of a symmetric partition
pub const SLOT_BYTES: usize = 8;

/// Largest PE count representable in the 16-bit biased `next` field of a lock word
pub const MAX_PES: usize = 0xFFFE;

/// Byte offset into the symmetric heap
///
/// The same offset names the corresponding object on every PE, which is what
/// makes remote addressing possible without exchanging handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymAddr(pub usize);

impl SymAddr {
    #[inline(always)]
    pub const fn offset(self, bytes: usize) -> Self {
        Self(self.0 + bytes)
    }

    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Index of the backing slot holding this byte
    #[inline(always)]
    pub const fn slot(self) -> usize {
        self.0 / SLOT_BYTES
    }

    /// Bit shift of this byte inside its slot
    #[inline(always)]
    pub const fn shift(self) -> u32 {
        ((self.0 % SLOT_BYTES) * 8) as u32
    }

    #[inline(always)]
    pub const fn is_aligned_to(self, align: usize) -> bool {
        self.0 % align == 0
    }
}

impl fmt::Display for SymAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym+0x{:x}", self.0)
    }
}

/// Element width of a symmetric integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Width {
    W16,
    W32,
    W64,
}

impl Width {
    #[inline(always)]
    pub const fn bytes(self) -> usize {
        match self {
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    /// Mask selecting the low `bytes() * 8` bits
    #[inline(always)]
    pub const fn mask(self) -> u64 {
        match self {
            Width::W16 => 0xFFFF,
            Width::W32 => 0xFFFF_FFFF,
            Width::W64 => u64::MAX,
        }
    }
}

/// Integer types that may live in symmetric memory and be targeted by
/// atomics and the wait/test family.
///
/// Values cross the transport as zero-extended bit patterns of `WIDTH`;
/// additions wrap at that width, so signed and unsigned types share one path.
pub trait ShmemInt:
    Copy + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    const WIDTH: Width;
    const NAME: &'static str;

    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;

    fn one() -> Self {
        Self::from_bits(1)
    }
}

macro_rules! impl_shmem_int {
    ($($ty:ty => $unsigned:ty, $width:expr;)*) => {
        $(
            impl ShmemInt for $ty {
                const WIDTH: Width = $width;
                const NAME: &'static str = stringify!($ty);

                #[inline(always)]
                fn to_bits(self) -> u64 {
                    self as $unsigned as u64
                }

                #[inline(always)]
                fn from_bits(bits: u64) -> Self {
                    bits as $unsigned as $ty
                }
            }
        )*
    };
}

impl_shmem_int! {
    i16 => u16, Width::W16;
    u16 => u16, Width::W16;
    i32 => u32, Width::W32;
    u32 => u32, Width::W32;
    i64 => u64, Width::W64;
    u64 => u64, Width::W64;
    isize => u64, Width::W64;
    usize => u64, Width::W64;
}

/// Typed pointer to one symmetric element
pub struct SymPtr<T> {
    addr: SymAddr,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SymPtr<T> {
    pub const fn new(addr: SymAddr) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn addr(self) -> SymAddr {
        self.addr
    }
}

impl<T> Clone for SymPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SymPtr<T> {}

impl<T> PartialEq for SymPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for SymPtr<T> {}

impl<T> fmt::Debug for SymPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SymPtr").field(&self.addr).finish()
    }
}

/// Typed, densely packed array in symmetric memory
pub struct SymArray<T> {
    addr: SymAddr,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SymArray<T> {
    pub const fn new(addr: SymAddr, len: usize) -> Self {
        Self {
            addr,
            len,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn addr(&self) -> SymAddr {
        self.addr
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the array in bytes
    pub const fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Pointer to element `index`
    ///
    /// Bounds are checked by the entry points that consume the pointer; an
    /// out-of-range pointer fails the symmetric-address precondition there.
    #[inline(always)]
    pub const fn at(&self, index: usize) -> SymPtr<T> {
        SymPtr::new(self.addr.offset(index * std::mem::size_of::<T>()))
    }

    pub fn iter(&self) -> impl Iterator<Item = SymPtr<T>> + '_ {
        (0..self.len).map(move |i| self.at(i))
    }
}

impl<T> Clone for SymArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SymArray<T> {}

impl<T> fmt::Debug for SymArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymArray")
            .field("addr", &self.addr)
            .field("len", &self.len)
            .finish()
    }
}

/// Symmetric lock: lock word and node word packed into one 8-byte slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymLock {
    addr: SymAddr,
}

impl SymLock {
    /// Bytes occupied by a lock (one slot)
    pub const SIZE: usize = SLOT_BYTES;

    pub const fn new(addr: SymAddr) -> Self {
        Self { addr }
    }

    #[inline(always)]
    pub const fn addr(self) -> SymAddr {
        self.addr
    }

    /// Global arbitration word, meaningful on the owner PE
    #[inline(always)]
    pub const fn lock_word(self) -> SymAddr {
        self.addr
    }

    /// Per-PE queue link word
    #[inline(always)]
    pub const fn node_word(self) -> SymAddr {
        self.addr.offset(4)
    }
}
