/*!
 * Remote Atomic Operations
 *
 * Type-generic atomic memory operations on a symmetric element of any PE.
 * Each operation has a context-qualified form (`ctx_*`) and a default-context
 * form that forwards to [`Context::DEFAULT`]. The layer is stateless: every
 * call resolves its target and hands the bit pattern to the transport.
 *
 * Elemental put/get, quiet, fence, and barrier live in [`rma`].
 */

pub mod rma;

use crate::context::Context;
use crate::core::types::{PeId, ShmemInt, SymPtr};
use crate::runtime::Pe;

pub trait RemoteAtomics {
    fn ctx_atomic_fetch<T: ShmemInt>(&self, ctx: &Context, source: SymPtr<T>, pe: PeId) -> T;

    fn ctx_atomic_set<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId);

    fn ctx_atomic_swap<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) -> T;

    /// Store `value` iff the element equals `cond`; returns the prior value
    fn ctx_atomic_compare_swap<T: ShmemInt>(
        &self,
        ctx: &Context,
        dest: SymPtr<T>,
        cond: T,
        value: T,
        pe: PeId,
    ) -> T;

    /// Wrapping add; returns the prior value
    fn ctx_atomic_fetch_add<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) -> T;

    fn ctx_atomic_add<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) {
        self.ctx_atomic_fetch_add(ctx, dest, value, pe);
    }

    fn ctx_atomic_fetch_inc<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, pe: PeId) -> T {
        self.ctx_atomic_fetch_add(ctx, dest, T::one(), pe)
    }

    fn ctx_atomic_inc<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, pe: PeId) {
        self.ctx_atomic_fetch_add(ctx, dest, T::one(), pe);
    }

    // Default-context forms

    fn atomic_fetch<T: ShmemInt>(&self, source: SymPtr<T>, pe: PeId) -> T {
        self.ctx_atomic_fetch(&Context::DEFAULT, source, pe)
    }

    fn atomic_set<T: ShmemInt>(&self, dest: SymPtr<T>, value: T, pe: PeId) {
        self.ctx_atomic_set(&Context::DEFAULT, dest, value, pe)
    }

    fn atomic_swap<T: ShmemInt>(&self, dest: SymPtr<T>, value: T, pe: PeId) -> T {
        self.ctx_atomic_swap(&Context::DEFAULT, dest, value, pe)
    }

    fn atomic_compare_swap<T: ShmemInt>(&self, dest: SymPtr<T>, cond: T, value: T, pe: PeId) -> T {
        self.ctx_atomic_compare_swap(&Context::DEFAULT, dest, cond, value, pe)
    }

    fn atomic_fetch_add<T: ShmemInt>(&self, dest: SymPtr<T>, value: T, pe: PeId) -> T {
        self.ctx_atomic_fetch_add(&Context::DEFAULT, dest, value, pe)
    }

    fn atomic_add<T: ShmemInt>(&self, dest: SymPtr<T>, value: T, pe: PeId) {
        self.ctx_atomic_add(&Context::DEFAULT, dest, value, pe)
    }

    fn atomic_fetch_inc<T: ShmemInt>(&self, dest: SymPtr<T>, pe: PeId) -> T {
        self.ctx_atomic_fetch_inc(&Context::DEFAULT, dest, pe)
    }

    fn atomic_inc<T: ShmemInt>(&self, dest: SymPtr<T>, pe: PeId) {
        self.ctx_atomic_inc(&Context::DEFAULT, dest, pe)
    }
}

impl RemoteAtomics for Pe {
    fn ctx_atomic_fetch<T: ShmemInt>(&self, ctx: &Context, source: SymPtr<T>, pe: PeId) -> T {
        let target = self.remote_target(ctx, source, pe);
        T::from_bits(self.transport().atomic_fetch(ctx.id(), target))
    }

    fn ctx_atomic_set<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) {
        let target = self.remote_target(ctx, dest, pe);
        self.transport().atomic_set(ctx.id(), target, value.to_bits());
    }

    fn ctx_atomic_swap<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) -> T {
        let target = self.remote_target(ctx, dest, pe);
        T::from_bits(self.transport().atomic_swap(ctx.id(), target, value.to_bits()))
    }

    fn ctx_atomic_compare_swap<T: ShmemInt>(
        &self,
        ctx: &Context,
        dest: SymPtr<T>,
        cond: T,
        value: T,
        pe: PeId,
    ) -> T {
        let target = self.remote_target(ctx, dest, pe);
        let prior = self
            .transport()
            .atomic_compare_swap(ctx.id(), target, cond.to_bits(), value.to_bits());
        T::from_bits(prior)
    }

    fn ctx_atomic_fetch_add<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) -> T {
        let target = self.remote_target(ctx, dest, pe);
        T::from_bits(self.transport().atomic_fetch_add(ctx.id(), target, value.to_bits()))
    }
}
