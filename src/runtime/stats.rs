/*!
 * Synchronization Statistics
 * Per-PE counters for lock and wait/test activity
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    LockImmediate,
    LockQueued,
    LockBusy,
    ReleaseUncontended,
    ReleaseHandoff,
    Test,
}

#[derive(Debug, Default)]
pub struct SyncStats {
    lock_immediate: AtomicU64,
    lock_queued: AtomicU64,
    lock_busy: AtomicU64,
    release_uncontended: AtomicU64,
    release_handoff: AtomicU64,
    waits: AtomicU64,
    wait_polls: AtomicU64,
    tests: AtomicU64,
}

impl SyncStats {
    #[inline]
    pub fn record(&self, event: SyncEvent) {
        let counter = match event {
            SyncEvent::LockImmediate => &self.lock_immediate,
            SyncEvent::LockQueued => &self.lock_queued,
            SyncEvent::LockBusy => &self.lock_busy,
            SyncEvent::ReleaseUncontended => &self.release_uncontended,
            SyncEvent::ReleaseHandoff => &self.release_handoff,
            SyncEvent::Test => &self.tests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// One completed blocking wait that polled progress `polls` times
    #[inline]
    pub fn record_wait(&self, polls: u64) {
        self.waits.fetch_add(1, Ordering::Relaxed);
        self.wait_polls.fetch_add(polls, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            lock_immediate: self.lock_immediate.load(Ordering::Relaxed),
            lock_queued: self.lock_queued.load(Ordering::Relaxed),
            lock_busy: self.lock_busy.load(Ordering::Relaxed),
            release_uncontended: self.release_uncontended.load(Ordering::Relaxed),
            release_handoff: self.release_handoff.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            wait_polls: self.wait_polls.load(Ordering::Relaxed),
            tests: self.tests.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatsSnapshot {
    pub lock_immediate: u64,
    pub lock_queued: u64,
    pub lock_busy: u64,
    pub release_uncontended: u64,
    pub release_handoff: u64,
    pub waits: u64,
    pub wait_polls: u64,
    pub tests: u64,
}

impl SyncStatsSnapshot {
    /// Successful acquisitions, immediate or queued
    pub fn acquisitions(&self) -> u64 {
        self.lock_immediate + self.lock_queued
    }

    pub fn releases(&self) -> u64 {
        self.release_uncontended + self.release_handoff
    }

    /// Fold another PE's counters into this one
    pub fn merge(&mut self, other: &SyncStatsSnapshot) {
        self.lock_immediate += other.lock_immediate;
        self.lock_queued += other.lock_queued;
        self.lock_busy += other.lock_busy;
        self.release_uncontended += other.release_uncontended;
        self.release_handoff += other.release_handoff;
        self.waits += other.waits;
        self.wait_polls += other.wait_polls;
        self.tests += other.tests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = SyncStats::default();
        stats.record(SyncEvent::LockImmediate);
        stats.record(SyncEvent::LockQueued);
        stats.record(SyncEvent::ReleaseHandoff);
        stats.record_wait(12);

        let snap = stats.snapshot();
        assert_eq!(snap.acquisitions(), 2);
        assert_eq!(snap.releases(), 1);
        assert_eq!(snap.waits, 1);
        assert_eq!(snap.wait_polls, 12);
    }

    #[test]
    fn test_merge() {
        let mut total = SyncStatsSnapshot::default();
        let one = SyncStatsSnapshot {
            lock_busy: 2,
            tests: 3,
            ..Default::default()
        };
        total.merge(&one);
        total.merge(&one);
        assert_eq!(total.lock_busy, 4);
        assert_eq!(total.tests, 6);
    }
}
