/*!
 * Comparison Operators
 *
 * The fixed operator set of the point-to-point synchronization routines.
 * Callers may pass a typed [`CmpOp`] or a raw integer code; raw codes are
 * resolved once per call, before any element is inspected.
 */

use crate::core::errors::ShmemError;
use crate::core::types::ShmemResult;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CMP_EQ: i32 = 1;
pub const CMP_NE: i32 = 2;
pub const CMP_GT: i32 = 3;
pub const CMP_LE: i32 = 4;
pub const CMP_LT: i32 = 5;
pub const CMP_GE: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CmpOp {
    Eq = CMP_EQ,
    Ne = CMP_NE,
    Gt = CMP_GT,
    Le = CMP_LE,
    Lt = CMP_LT,
    Ge = CMP_GE,
}

impl CmpOp {
    pub const ALL: [CmpOp; 6] = [
        CmpOp::Eq,
        CmpOp::Ne,
        CmpOp::Gt,
        CmpOp::Le,
        CmpOp::Lt,
        CmpOp::Ge,
    ];

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// `lhs <op> rhs`
    #[inline]
    pub fn compare<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<i32> for CmpOp {
    type Error = ShmemError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            CMP_EQ => Ok(CmpOp::Eq),
            CMP_NE => Ok(CmpOp::Ne),
            CMP_GT => Ok(CmpOp::Gt),
            CMP_LE => Ok(CmpOp::Le),
            CMP_LT => Ok(CmpOp::Lt),
            CMP_GE => Ok(CmpOp::Ge),
            other => Err(ShmemError::UnknownComparison(other)),
        }
    }
}

/// Comparison argument as received at an entry point, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmpCode(pub i32);

impl CmpCode {
    pub fn resolve(self) -> ShmemResult<CmpOp> {
        CmpOp::try_from(self.0)
    }
}

impl From<CmpOp> for CmpCode {
    fn from(op: CmpOp) -> Self {
        CmpCode(op.code())
    }
}

impl From<i32> for CmpCode {
    fn from(code: i32) -> Self {
        CmpCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_codes_roundtrip() {
        for op in CmpOp::ALL {
            assert_eq!(CmpCode::from(op).resolve(), Ok(op));
        }
        assert_eq!(CmpOp::Ge.code(), 6);
        assert_eq!(CmpCode(0).resolve(), Err(ShmemError::UnknownComparison(0)));
        assert_eq!(CmpCode(99).resolve(), Err(ShmemError::UnknownComparison(99)));
    }

    #[test]
    fn test_signed_compare() {
        assert!(CmpOp::Lt.compare(-1i16, 0));
        assert!(CmpOp::Ge.compare(5i32, 5));
        assert!(!CmpOp::Gt.compare(i64::MIN, 0));
    }

    proptest! {
        #[test]
        fn prop_complementary_pairs(a in any::<i32>(), b in any::<i32>()) {
            prop_assert_ne!(CmpOp::Eq.compare(a, b), CmpOp::Ne.compare(a, b));
            prop_assert_ne!(CmpOp::Lt.compare(a, b), CmpOp::Ge.compare(a, b));
            prop_assert_ne!(CmpOp::Gt.compare(a, b), CmpOp::Le.compare(a, b));
        }
    }
}
