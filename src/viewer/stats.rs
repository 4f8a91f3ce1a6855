//! Disk viewer statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by the disk viewer.
///
/// All fields are atomic for lock-free, thread-safe updates.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations: counters are independent
/// and only need atomicity.
///
/// # Example
/// ```
/// use diskview::ViewerStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = ViewerStats::new();
/// stats.cache_hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.cache_hits.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug, Default)]
pub struct ViewerStats {
    /// Reads served from the cache.
    pub cache_hits: AtomicU64,

    /// Reads that fell through to the pager.
    pub cache_misses: AtomicU64,

    /// Pages mapped by the pager (misses plus pre-warms).
    pub pages_mapped: AtomicU64,

    /// Pages appended to the backing file.
    pub pages_created: AtomicU64,

    /// Pre-warms after `create` that failed and were swallowed.
    pub prewarm_failures: AtomicU64,
}

impl ViewerStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        hit_rate(
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Get a snapshot of current statistics.
    ///
    /// Evictions are counted by the cache itself and passed in.
    pub fn snapshot(&self, evictions: u64) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions,
            pages_mapped: self.pages_mapped.load(Ordering::Relaxed),
            pages_created: self.pages_created.load(Ordering::Relaxed),
            prewarm_failures: self.prewarm_failures.load(Ordering::Relaxed),
        }
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// A point-in-time snapshot of viewer statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_mapped: u64,
    pub pages_created: u64,
    pub prewarm_failures: u64,
}

impl StatsSnapshot {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.cache_hits, self.cache_misses)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, created: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_created,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = ViewerStats::new();
        assert_eq!(stats.cache_hits.load(Ordering::Relaxed), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = ViewerStats::new();
        stats.cache_hits.fetch_add(7, Ordering::Relaxed);
        stats.cache_misses.fetch_add(3, Ordering::Relaxed);
        stats.pages_created.fetch_add(2, Ordering::Relaxed);

        let snapshot = stats.snapshot(4);
        assert_eq!(snapshot.cache_hits, 7);
        assert_eq!(snapshot.evictions, 4);
        assert_eq!(snapshot.pages_created, 2);
        assert_eq!(snapshot.hit_rate(), 0.7);
    }

    #[test]
    fn test_stats_display() {
        let stats = ViewerStats::new();
        stats.cache_hits.fetch_add(80, Ordering::Relaxed);
        stats.cache_misses.fetch_add(20, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot(5));
        assert!(display.contains("hits: 80"));
        assert!(display.contains("evictions: 5"));
        assert!(display.contains("80.00%"));
    }
}
