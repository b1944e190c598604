use std::sync::atomic::{AtomicU64, Ordering};

/// Per-group diagnostic counters, shared between every evaluating
/// context. All updates are relaxed: these are monotonic tallies, not
/// synchronization points.
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Packets presented to the group.
    recv: AtomicU64,
    /// Packets delivered to at least one member socket.
    deliver: AtomicU64,
    /// Packets dropped (by policy, by the program, or by fallback).
    drop: AtomicU64,
    /// Evaluation-time fallbacks: the program steered somewhere no
    /// member socket occupies.
    anomaly: AtomicU64,
}

impl GroupStats {
    #[inline]
    pub(crate) fn increment_recv(&self) {
        self.recv.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_deliver(&self) {
        self.deliver.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_drop(&self) {
        self.drop.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_anomaly(&self) {
        self.anomaly.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.recv.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.deliver.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.drop.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn anomalies(&self) -> u64 {
        self.anomaly.load(Ordering::Relaxed)
    }
}
