/*!
 * Serialization Guard
 *
 * Process-wide mutual exclusion applied by a thin wrapper around every
 * state-mutating entry point. Active only when the thread level asks the
 * library to serialize concurrent local callers; otherwise a no-op.
 */

use super::config::ThreadLevel;
use parking_lot::Mutex;

pub struct SerialGuard {
    mutex: Option<Mutex<()>>,
}

impl SerialGuard {
    pub fn new(level: ThreadLevel) -> Self {
        Self {
            mutex: level.requires_serialization().then(|| Mutex::new(())),
        }
    }

    /// Whether calls are actually serialized
    #[inline]
    pub fn is_active(&self) -> bool {
        self.mutex.is_some()
    }

    /// Run `f` under the guard
    #[inline]
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.mutex {
            Some(mutex) => {
                let _held = mutex.lock();
                f()
            }
            None => f(),
        }
    }
}

impl std::fmt::Debug for SerialGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialGuard")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_inactive_guard_is_passthrough() {
        let guard = SerialGuard::new(ThreadLevel::Single);
        assert!(!guard.is_active());
        assert_eq!(guard.run(|| 7), 7);
    }

    #[test]
    fn test_active_guard_serializes() {
        let guard = Arc::new(SerialGuard::new(ThreadLevel::Multiple));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        guard.run(|| {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
