//! Query Phase Timing
//!
//! Every lookup has two phases: resolving the key to a block (index search
//! plus the occasional block load) and extracting records inside the block.
//! A reader can be given a [`StatsSink`] that accumulates nanoseconds spent
//! in each phase, summed across all scanners sharing that reader.
//!
//! The default sink is [`NoopStats`], which reports itself disabled so
//! scanners skip the clock reads entirely - a reader without stats pays
//! nothing.
//!
//! Counters use relaxed atomic adds; many scanners can report concurrently
//! without locking. The numbers are purely observational and never affect
//! results.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use keyhouse_storage::{KeyFileReader, ReaderConfig, ScanStats};
//!
//! let stats = Arc::new(ScanStats::new());
//! let reader = Arc::new(
//!     KeyFileReader::open("users.keyfile", ReaderConfig::default())?
//!         .with_stats(stats.clone()),
//! );
//! // ... run queries ...
//! println!(
//!     "resolve: {}ns, extract: {}ns",
//!     stats.resolve_nanos(),
//!     stats.extract_nanos()
//! );
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Receiver for per-phase query timings.
pub trait StatsSink: Send + Sync {
    /// When false, scanners skip timing collection for this reader.
    fn enabled(&self) -> bool {
        true
    }

    /// Accumulate nanoseconds spent resolving a key to a block.
    fn add_resolve_nanos(&self, nanos: u64);

    /// Accumulate nanoseconds spent extracting records inside a block.
    fn add_extract_nanos(&self, nanos: u64);
}

/// Default sink: collects nothing, costs nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsSink for NoopStats {
    fn enabled(&self) -> bool {
        false
    }

    fn add_resolve_nanos(&self, _nanos: u64) {}

    fn add_extract_nanos(&self, _nanos: u64) {}
}

/// Lock-free accumulator for the two query phases.
#[derive(Debug, Default)]
pub struct ScanStats {
    resolve_nanos: AtomicU64,
    extract_nanos: AtomicU64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total nanoseconds spent in block resolution across all scanners.
    pub fn resolve_nanos(&self) -> u64 {
        self.resolve_nanos.load(Ordering::Relaxed)
    }

    /// Total nanoseconds spent in in-block extraction across all scanners.
    pub fn extract_nanos(&self) -> u64 {
        self.extract_nanos.load(Ordering::Relaxed)
    }
}

impl StatsSink for ScanStats {
    fn add_resolve_nanos(&self, nanos: u64) {
        self.resolve_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn add_extract_nanos(&self, nanos: u64) {
        self.extract_nanos.fetch_add(nanos, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_stats_accumulate() {
        let stats = ScanStats::new();
        assert!(stats.enabled());

        stats.add_resolve_nanos(5);
        stats.add_resolve_nanos(7);
        stats.add_extract_nanos(11);

        assert_eq!(stats.resolve_nanos(), 12);
        assert_eq!(stats.extract_nanos(), 11);
    }

    #[test]
    fn noop_is_disabled() {
        let stats = NoopStats;
        assert!(!stats.enabled());
        stats.add_resolve_nanos(1);
        stats.add_extract_nanos(1);
    }

    #[test]
    fn concurrent_adds() {
        use std::sync::Arc;

        let stats = Arc::new(ScanStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.add_resolve_nanos(1);
                        stats.add_extract_nanos(2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.resolve_nanos(), 4000);
        assert_eq!(stats.extract_nanos(), 8000);
    }
}
