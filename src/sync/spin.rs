/*!
 * Progress Spin
 *
 * Busy-wait loop that alternates a condition check with a call into the
 * transport's progress engine. Never parks; every `yield_interval` polls the
 * OS thread is yielded so oversubscribed PEs keep running.
 */

use crate::core::config::SpinConfig;
use crate::transport::Transport;
use std::cell::Cell;
use std::thread;

pub struct ProgressSpin<'a> {
    transport: &'a dyn Transport,
    yield_interval: u32,
    polls: Cell<u64>,
}

impl<'a> ProgressSpin<'a> {
    pub fn new(transport: &'a dyn Transport, config: SpinConfig) -> Self {
        Self {
            transport,
            yield_interval: config.yield_interval.max(1),
            polls: Cell::new(0),
        }
    }

    /// Spin until `check` yields a value
    pub fn until_some<R>(&self, mut check: impl FnMut() -> Option<R>) -> R {
        loop {
            if let Some(value) = check() {
                return value;
            }
            self.poll();
        }
    }

    /// Spin until `check` holds
    pub fn until(&self, mut check: impl FnMut() -> bool) {
        self.until_some(|| check().then_some(()))
    }

    /// Progress calls made so far
    pub fn polls(&self) -> u64 {
        self.polls.get()
    }

    #[inline]
    fn poll(&self) {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        self.transport.progress();
        if polls % u64::from(self.yield_interval) == 0 {
            thread::yield_now();
        }
    }
}
