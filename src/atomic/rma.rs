/*!
 * Elemental RMA and Completion
 *
 * Single-element put/get plus the completion operations that order them.
 * Puts are asynchronous: they are only guaranteed visible at the target
 * after `quiet` on the issuing context. None of these run under the
 * serialization guard.
 */

use crate::context::Context;
use crate::core::errors::require;
use crate::core::types::{PeId, ShmemInt, SymPtr};
use crate::runtime::Pe;

impl Pe {
    pub fn ctx_put_value<T: ShmemInt>(&self, ctx: &Context, dest: SymPtr<T>, value: T, pe: PeId) {
        let target = self.remote_target(ctx, dest, pe);
        self.transport().put_value(ctx.id(), target, value.to_bits());
    }

    /// Write `value` to `dest` on `pe` through the default context
    pub fn put_value<T: ShmemInt>(&self, dest: SymPtr<T>, value: T, pe: PeId) {
        self.ctx_put_value(&Context::DEFAULT, dest, value, pe)
    }

    pub fn ctx_get_value<T: ShmemInt>(&self, ctx: &Context, source: SymPtr<T>, pe: PeId) -> T {
        let target = self.remote_target(ctx, source, pe);
        T::from_bits(self.transport().get_value(ctx.id(), target))
    }

    pub fn get_value<T: ShmemInt>(&self, source: SymPtr<T>, pe: PeId) -> T {
        self.ctx_get_value(&Context::DEFAULT, source, pe)
    }

    /// Complete every put issued through `ctx`
    pub fn ctx_quiet(&self, ctx: &Context) {
        require(self.check_initialized());
        self.transport().quiet(ctx.id());
    }

    pub fn quiet(&self) {
        self.ctx_quiet(&Context::DEFAULT)
    }

    /// Order puts through `ctx` issued before this call ahead of later ones
    pub fn ctx_fence(&self, ctx: &Context) {
        require(self.check_initialized());
        self.transport().fence(ctx.id());
    }

    pub fn fence(&self) {
        self.ctx_fence(&Context::DEFAULT)
    }

    /// Complete this PE's puts on every context and wait for all PEs
    pub fn barrier_all(&self) {
        require(self.check_initialized());
        self.transport().barrier_all();
    }
}
