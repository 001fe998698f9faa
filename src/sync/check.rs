/*!
 * Non-Blocking Point-to-Point Synchronization
 *
 * `test*` run exactly one pass. A negative result drives progress once
 * before returning so that a caller polling in its own loop still lets
 * buffered puts land.
 */

use super::cmp::CmpCode;
use super::scan::Operand;
use crate::core::types::{ShmemInt, SymArray, SymPtr};
use crate::runtime::{Pe, SyncEvent};

impl Pe {
    /// Whether `ivar <cmp> value` holds now
    pub fn test<T: ShmemInt>(&self, ivar: SymPtr<T>, cmp: impl Into<CmpCode>, value: T) -> bool {
        self.test_all(SymArray::new(ivar.addr(), 1), None, cmp, value)
    }

    /// Whether every selected element satisfies (true when nothing is selected)
    pub fn test_all<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) -> bool {
        self.test_all_with(ivars, status, cmp.into(), Operand::Scalar(value))
    }

    pub fn test_all_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) -> bool {
        self.test_all_with(ivars, status, cmp.into(), Operand::Vector(values))
    }

    /// Lowest selected index that satisfies, if any
    pub fn test_any<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) -> Option<usize> {
        self.test_any_with(ivars, status, cmp.into(), Operand::Scalar(value))
    }

    pub fn test_any_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) -> Option<usize> {
        self.test_any_with(ivars, status, cmp.into(), Operand::Vector(values))
    }

    /// Every selected index that satisfies, ascending; the count is the length
    pub fn test_some<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) -> Vec<usize> {
        self.test_some_with(ivars, status, cmp.into(), Operand::Scalar(value))
    }

    pub fn test_some_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) -> Vec<usize> {
        self.test_some_with(ivars, status, cmp.into(), Operand::Vector(values))
    }

    fn test_all_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) -> bool {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        self.single_pass(|| scan.all(|i| self.load_ivar(ivars, i)), |&all| all)
    }

    fn test_any_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) -> Option<usize> {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        self.single_pass(|| scan.first(|i| self.load_ivar(ivars, i)), Option::is_some)
    }

    fn test_some_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) -> Vec<usize> {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        self.single_pass(|| scan.some(|i| self.load_ivar(ivars, i)), |found| !found.is_empty())
    }

    fn single_pass<R>(&self, pass: impl FnOnce() -> R, hit: impl FnOnce(&R) -> bool) -> R {
        let result = self.guard().run(pass);
        self.sync_stats().record(SyncEvent::Test);
        if !hit(&result) {
            self.transport().progress();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::ShmemConfig;
    use crate::runtime::World;
    use crate::sync::{CmpOp, CMP_GT};
    use pretty_assertions::assert_eq;

    fn solo() -> World {
        World::new(ShmemConfig::new(1).with_symmetric_size(128)).unwrap()
    }

    #[test]
    fn test_single_element() {
        solo().run(|pe| {
            let ivar = pe.alloc::<u32>().unwrap();
            pe.write(ivar, 3);
            assert!(pe.test(ivar, CmpOp::Eq, 3));
            assert!(pe.test(ivar, CMP_GT, 2));
            assert!(!pe.test(ivar, CmpOp::Lt, 3));
        });
    }

    #[test]
    fn test_any_and_some_vector() {
        solo().run(|pe| {
            let ivars = pe.alloc_array::<i16>(4).unwrap();
            for (i, v) in [-2i16, 7, 0, 7].into_iter().enumerate() {
                pe.write(ivars.at(i), v);
            }
            let values = [-2, 6, 1, 7];

            assert_eq!(pe.test_any_vector(ivars, None, CmpOp::Eq, &values), Some(0));
            assert_eq!(pe.test_some_vector(ivars, None, CmpOp::Eq, &values), vec![0, 3]);
            assert!(!pe.test_all_vector(ivars, None, CmpOp::Eq, &values));
            assert!(pe.test_all_vector(ivars, Some(&[1, 0, 0, 1][..]), CmpOp::Eq, &values));
        });
    }

    #[test]
    fn test_vacuous_results() {
        solo().run(|pe| {
            let ivars = pe.alloc_array::<u64>(2).unwrap();
            let none: &[i32] = &[0, 0];
            assert!(pe.test_all(ivars, Some(none), CmpOp::Ne, 0));
            assert_eq!(pe.test_any(ivars, Some(none), CmpOp::Eq, 0), None);
            assert!(pe.test_some(ivars, Some(none), CmpOp::Eq, 0).is_empty());
        });
    }

    #[test]
    fn test_counts_tests() {
        let stats = solo().run(|pe| {
            let ivar = pe.alloc::<i64>().unwrap();
            pe.test(ivar, CmpOp::Eq, 0);
            pe.test(ivar, CmpOp::Eq, 1);
            pe.stats()
        });
        assert_eq!(stats[0].tests, 2);
    }
}
