/*!
 * Blocking Point-to-Point Synchronization
 *
 * `wait_until*` spin on progress until the local ivars satisfy the
 * comparison. Each pass re-reads every selected element under the
 * serialization guard; the guard is dropped between passes so remote
 * writers and other local threads are not starved.
 */

use super::cmp::CmpCode;
use super::scan::{Operand, Scan};
use crate::core::types::{ShmemInt, SymArray, SymPtr};
use crate::runtime::Pe;
use tracing::trace;

impl Pe {
    /// Block until `ivar <cmp> value`
    pub fn wait_until<T: ShmemInt>(&self, ivar: SymPtr<T>, cmp: impl Into<CmpCode>, value: T) {
        self.wait_until_all(SymArray::new(ivar.addr(), 1), None, cmp, value);
    }

    /// Block until every selected element satisfies `ivars[i] <cmp> value`
    ///
    /// Elements are selected by non-zero `status` entries, or all of them
    /// when `status` is `None`. Returns once a single pass sees every
    /// selected element satisfied; elements may change again afterwards.
    pub fn wait_until_all<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) {
        self.wait_all_with(ivars, status, cmp.into(), Operand::Scalar(value));
    }

    /// [`wait_until_all`](Self::wait_until_all) with per-element `values`
    pub fn wait_until_all_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) {
        self.wait_all_with(ivars, status, cmp.into(), Operand::Vector(values));
    }

    /// Block until some selected element satisfies; returns its index
    ///
    /// `None` without blocking when nothing is selected.
    pub fn wait_until_any<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) -> Option<usize> {
        self.wait_any_with(ivars, status, cmp.into(), Operand::Scalar(value))
    }

    pub fn wait_until_any_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) -> Option<usize> {
        self.wait_any_with(ivars, status, cmp.into(), Operand::Vector(values))
    }

    /// Block until at least one selected element satisfies; returns every
    /// satisfying index of that pass, ascending
    pub fn wait_until_some<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        value: T,
    ) -> Vec<usize> {
        self.wait_some_with(ivars, status, cmp.into(), Operand::Scalar(value))
    }

    pub fn wait_until_some_vector<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: impl Into<CmpCode>,
        values: &[T],
    ) -> Vec<usize> {
        self.wait_some_with(ivars, status, cmp.into(), Operand::Vector(values))
    }

    fn wait_all_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        self.block_on(&scan, || scan.all(|i| self.load_ivar(ivars, i)).then_some(()));
    }

    fn wait_any_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) -> Option<usize> {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        if !scan.any_selected() {
            return None;
        }
        Some(self.block_on(&scan, || scan.first(|i| self.load_ivar(ivars, i))))
    }

    fn wait_some_with<T: ShmemInt>(
        &self,
        ivars: SymArray<T>,
        status: Option<&[i32]>,
        cmp: CmpCode,
        operand: Operand<'_, T>,
    ) -> Vec<usize> {
        let scan = self.prepare_scan(ivars, status, cmp, operand);
        if !scan.any_selected() {
            return Vec::new();
        }
        self.block_on(&scan, || {
            let found = scan.some(|i| self.load_ivar(ivars, i));
            (!found.is_empty()).then_some(found)
        })
    }

    /// Repeat `pass` under the guard until it yields, polling progress between passes
    fn block_on<T: ShmemInt, R>(&self, scan: &Scan<'_, T>, mut pass: impl FnMut() -> Option<R>) -> R {
        let spin = self.spin();
        let result = spin.until_some(|| self.guard().run(&mut pass));

        self.sync_stats().record_wait(spin.polls());
        trace!(
            pe = self.my_pe(),
            ty = T::NAME,
            op = %scan.op(),
            len = scan.len(),
            polls = spin.polls(),
            "wait satisfied"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::ShmemConfig;
    use crate::runtime::World;
    use crate::sync::CmpOp;

    #[test]
    fn test_wait_until_sees_remote_put() {
        let world = World::new(ShmemConfig::new(2).with_symmetric_size(64)).unwrap();
        let seen = world.run(|pe| {
            let flag = pe.alloc::<i32>().unwrap();
            if pe.my_pe() == 0 {
                pe.put_value(flag, 42, 1);
                pe.quiet();
                None
            } else {
                pe.wait_until(flag, CmpOp::Eq, 42);
                Some(pe.read(flag))
            }
        });
        assert_eq!(seen, vec![None, Some(42)]);
    }

    #[test]
    fn test_empty_selection_does_not_block() {
        let world = World::new(ShmemConfig::new(1).with_symmetric_size(64)).unwrap();
        world.run(|pe| {
            let ivars = pe.alloc_array::<u16>(3).unwrap();
            let status: &[i32] = &[0, 0, 0];
            pe.wait_until_all(ivars, Some(status), CmpOp::Eq, 7);
            assert_eq!(pe.wait_until_any(ivars, Some(status), CmpOp::Eq, 7), None);
            assert!(pe.wait_until_some(ivars, Some(status), CmpOp::Eq, 7).is_empty());
        });
    }

    #[test]
    fn test_satisfied_wait_records_zero_polls() {
        let world = World::new(ShmemConfig::new(1).with_symmetric_size(64)).unwrap();
        let stats = world.run(|pe| {
            let ivars = pe.alloc_array::<i64>(2).unwrap();
            pe.wait_until_all_vector(ivars, None, CmpOp::Le, &[0, 1]);
            pe.stats()
        });
        assert_eq!(stats[0].waits, 1);
        assert_eq!(stats[0].wait_polls, 0);
    }
}
