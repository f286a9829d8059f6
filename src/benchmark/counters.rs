//! Atomic run counters
//!
//! Shared between the dispatch loop and every query task. Besides the
//! aggregator, these are the only state touched by more than one thread.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Counters for a single scheduler run
#[derive(Default)]
pub struct RunCounters {
    /// Work items admitted (a permit was taken and a task spawned)
    pub dispatched: AtomicU64,

    /// Tasks whose sample was recorded
    pub finished: AtomicU64,

    /// Tasks whose query failed
    pub failed: AtomicU64,

    /// Tasks currently inside the executor
    in_flight: AtomicUsize,

    /// Highest `in_flight` observed
    peak_in_flight: AtomicUsize,

    /// Set by the first failure; stops admission
    aborted: AtomicBool,
}

/// Point-in-time copy of [`RunCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCounts {
    pub dispatched: u64,
    pub finished: u64,
    pub failed: u64,
    pub peak_in_flight: usize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a task as entering the executor
    #[inline]
    pub fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    #[inline]
    pub fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Signal abort; returns true for the caller that flipped the flag
    pub fn signal_abort(&self) -> bool {
        !self.aborted.swap(true, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> RunCounts {
        RunCounts {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Reset everything before a new run
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::SeqCst);
        self.finished.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);
        self.peak_in_flight.store(0, Ordering::SeqCst);
        self.aborted.store(false, Ordering::SeqCst);
    }
}
