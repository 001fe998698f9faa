/*!
 * Context Types
 * Handles, options, and team descriptions
 */

use crate::core::errors::ShmemError;
use crate::core::types::{ContextId, PeId, ShmemResult, TeamId};
use serde::{Deserialize, Serialize};

/// Opaque communication context handle
///
/// Qualifies one-sided and atomic operations. The default context is always
/// valid; others come from [`ContextManager::create`](super::ContextManager::create).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    id: ContextId,
}

impl Context {
    pub const DEFAULT: Context = Context { id: 0 };

    pub(crate) const fn from_id(id: ContextId) -> Self {
        Self { id }
    }

    #[inline(always)]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    #[inline(always)]
    pub const fn is_default(&self) -> bool {
        self.id == 0
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Context creation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextOptions {
    /// The application serializes all use of the context
    pub serialized: bool,
    /// Only the creating thread uses the context
    pub private: bool,
    /// No store operations will be issued through the context
    pub nostore: bool,
}

impl ContextOptions {
    pub fn serialized() -> Self {
        Self {
            serialized: true,
            ..Default::default()
        }
    }

    pub fn private() -> Self {
        Self {
            private: true,
            ..Default::default()
        }
    }
}

/// Strided set of world PEs
///
/// Team formation is outside this layer; teams are described, not negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    start: PeId,
    stride: usize,
    size: usize,
}

impl Team {
    pub const WORLD_ID: TeamId = 0;

    /// All PEs, in order
    pub const fn world(n_pes: usize) -> Self {
        Self {
            id: Self::WORLD_ID,
            start: 0,
            stride: 1,
            size: n_pes,
        }
    }

    /// PEs `start, start + stride, ...` (`size` members) of a world of `n_pes`
    pub fn strided(
        id: TeamId,
        start: PeId,
        stride: usize,
        size: usize,
        n_pes: usize,
    ) -> ShmemResult<Self> {
        if size == 0 || stride == 0 {
            return Err(ShmemError::InvalidConfig(format!(
                "team {id}: size and stride must be non-zero"
            )));
        }
        let last = start + stride * (size - 1);
        if last >= n_pes {
            return Err(ShmemError::InvalidPe {
                pe: last,
                size: n_pes,
            });
        }
        Ok(Self {
            id,
            start,
            stride,
            size,
        })
    }

    #[inline]
    pub const fn id(&self) -> TeamId {
        self.id
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// World PE number of team member `pe`
    #[inline]
    pub fn translate(&self, pe: PeId) -> ShmemResult<PeId> {
        if pe < self.size {
            Ok(self.start + pe * self.stride)
        } else {
            Err(ShmemError::InvalidPe {
                pe,
                size: self.size,
            })
        }
    }

    /// Team-relative number of world PE `world_pe`, if it is a member
    pub fn rank_of(&self, world_pe: PeId) -> Option<PeId> {
        let offset = world_pe.checked_sub(self.start)?;
        (offset % self.stride == 0 && offset / self.stride < self.size)
            .then(|| offset / self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_translation_is_identity() {
        let world = Team::world(4);
        assert_eq!(world.translate(3).unwrap(), 3);
        assert!(world.translate(4).is_err());
    }

    #[test]
    fn test_strided_team() {
        let odd = Team::strided(7, 1, 2, 3, 6).unwrap();
        assert_eq!(odd.translate(0).unwrap(), 1);
        assert_eq!(odd.translate(2).unwrap(), 5);
        assert_eq!(odd.rank_of(3), Some(1));
        assert_eq!(odd.rank_of(2), None);
        assert_eq!(odd.rank_of(0), None);

        assert!(Team::strided(8, 1, 2, 4, 6).is_err());
        assert!(Team::strided(9, 0, 0, 2, 6).is_err());
    }

    #[test]
    fn test_default_context() {
        assert!(Context::default().is_default());
        assert_eq!(Context::DEFAULT.id(), 0);
    }
}
