//! Process-wide verification counters

use core::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters updated by every verification entry point
#[derive(Debug, Default)]
pub struct VerifyStats {
    verified: AtomicU64,
    failed: AtomicU64,
    batches: AtomicU64,
    batched_proofs: AtomicU64,
    peak_arena_bytes: AtomicU64,
    verify_calls: AtomicU64,
    verify_time_us: AtomicU64,
}

/// Point-in-time copy of [`VerifyStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total_verified: u64,
    pub total_failed: u64,
    pub total_batches: u64,
    pub avg_batch_size: u64,
    pub peak_arena_bytes: u64,
    pub avg_verify_time_us: u64,
}

static GLOBAL: VerifyStats = VerifyStats::new();

/// Counters shared by the whole process
pub fn global() -> &'static VerifyStats {
    &GLOBAL
}

impl VerifyStats {
    pub const fn new() -> Self {
        Self {
            verified: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            batched_proofs: AtomicU64::new(0),
            peak_arena_bytes: AtomicU64::new(0),
            verify_calls: AtomicU64::new(0),
            verify_time_us: AtomicU64::new(0),
        }
    }

    /// Count one proof outcome
    pub fn record_outcome(&self, accepted: bool) {
        if accepted {
            self.verified.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count one timed verification call
    pub fn record_verify(&self, accepted: bool, elapsed: Duration) {
        self.record_outcome(accepted);
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.verify_calls.fetch_add(1, Ordering::Relaxed);
        self.verify_time_us.fetch_add(us, Ordering::Relaxed);
    }

    pub fn record_batch(&self, size: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.batched_proofs.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_arena_peak(&self, bytes: usize) {
        self.peak_arena_bytes
            .fetch_max(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let batches = self.batches.load(Ordering::Relaxed);
        let calls = self.verify_calls.load(Ordering::Relaxed);
        StatsSnapshot {
            total_verified: self.verified.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_batches: batches,
            avg_batch_size: self
                .batched_proofs
                .load(Ordering::Relaxed)
                .checked_div(batches)
                .unwrap_or(0),
            peak_arena_bytes: self.peak_arena_bytes.load(Ordering::Relaxed),
            avg_verify_time_us: self
                .verify_time_us
                .load(Ordering::Relaxed)
                .checked_div(calls)
                .unwrap_or(0),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.verified,
            &self.failed,
            &self.batches,
            &self.batched_proofs,
            &self.peak_arena_bytes,
            &self.verify_calls,
            &self.verify_time_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let stats = VerifyStats::new();
        stats.record_verify(true, Duration::from_micros(100));
        stats.record_verify(false, Duration::from_micros(300));
        stats.record_batch(4);
        stats.record_batch(8);
        stats.record_arena_peak(4096);
        stats.record_arena_peak(1024);

        let snap = stats.snapshot();
        assert_eq!(snap.total_verified, 1);
        assert_eq!(snap.total_failed, 1);
        assert_eq!(snap.total_batches, 2);
        assert_eq!(snap.avg_batch_size, 6);
        assert_eq!(snap.peak_arena_bytes, 4096);
        assert_eq!(snap.avg_verify_time_us, 200);
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(VerifyStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_reset() {
        let stats = VerifyStats::new();
        stats.record_outcome(true);
        stats.record_batch(3);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
