/*!
 * Scan Core
 *
 * One implementation of the point-to-point check, shared by every wait and
 * test variant: which indices are selected, what each is compared against,
 * and how a single pass over the array is summarized. A pass reads each
 * selected element once; nothing is atomic across elements.
 */

use super::cmp::{CmpCode, CmpOp};
use crate::core::errors::{fatal, ShmemError};
use crate::core::types::{ShmemInt, ShmemResult, SymArray};
use crate::runtime::Pe;

/// Right-hand side of the comparison
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T> {
    /// Same value for every element
    Scalar(T),
    /// Per-element values, indexed like the ivars
    Vector(&'a [T]),
}

impl<T: ShmemInt> Operand<'_, T> {
    #[inline]
    fn at(&self, index: usize) -> T {
        match self {
            Operand::Scalar(value) => *value,
            Operand::Vector(values) => values[index],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scan<'a, T> {
    len: usize,
    op: CmpOp,
    status: Option<&'a [i32]>,
    operand: Operand<'a, T>,
}

impl<'a, T: ShmemInt> Scan<'a, T> {
    /// Validate slice lengths against `len` elements
    pub fn new(
        len: usize,
        op: CmpOp,
        status: Option<&'a [i32]>,
        operand: Operand<'a, T>,
    ) -> ShmemResult<Self> {
        if let Some(status) = status {
            check_len("status", len, status.len())?;
        }
        if let Operand::Vector(values) = operand {
            check_len("cmp_values", len, values.len())?;
        }
        Ok(Self {
            len,
            op,
            status,
            operand,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    /// Non-zero status entries select; no status selects everything
    #[inline]
    pub fn selected(&self, index: usize) -> bool {
        self.status.map_or(true, |status| status[index] != 0)
    }

    #[inline]
    pub fn satisfied(&self, index: usize, value: T) -> bool {
        self.op.compare(value, self.operand.at(index))
    }

    pub fn any_selected(&self) -> bool {
        (0..self.len).any(|i| self.selected(i))
    }

    /// Every selected element satisfies (vacuously true)
    pub fn all(&self, load: impl Fn(usize) -> T) -> bool {
        (0..self.len)
            .filter(|&i| self.selected(i))
            .all(|i| self.satisfied(i, load(i)))
    }

    /// Lowest selected index that satisfies
    pub fn first(&self, load: impl Fn(usize) -> T) -> Option<usize> {
        (0..self.len)
            .filter(|&i| self.selected(i))
            .find(|&i| self.satisfied(i, load(i)))
    }

    /// Every selected index that satisfies, ascending
    pub fn some(&self, load: impl Fn(usize) -> T) -> Vec<usize> {
        (0..self.len)
            .filter(|&i| self.selected(i))
            .filter(|&i| self.satisfied(i, load(i)))
            .collect()
    }
}

impl Pe {
    /// Run every precondition of a wait/test call; any violation is fatal
    ///
    /// The comparison code is resolved first so an unknown operator aborts
    /// before the array is touched.
    pub(crate) fn prepare_scan<'a, T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&'a [i32]>,
        cmp: CmpCode,
        operand: Operand<'a, T>,
    ) -> Scan<'a, T> {
        let prepared = self
            .check_initialized()
            .and_then(|_| cmp.resolve())
            .and_then(|op| {
                self.check_symmetric(ivars.addr(), ivars.byte_len(), T::WIDTH.bytes())?;
                Scan::new(ivars.len(), op, status, operand)
            });

        match prepared {
            Ok(scan) => scan,
            Err(err) => fatal(err),
        }
    }

    /// Current local value of `ivars[index]`
    #[inline]
    pub(crate) fn load_ivar<T: ShmemInt>(&self, ivars: SymArray<T>, index: usize) -> T {
        T::from_bits(self.transport().load(ivars.at(index).addr(), T::WIDTH))
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> ShmemResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShmemError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
