//! Platform-agnostic result and bookkeeping types shared by the NTFS backend
//! and the CLI.
//!
//! Nothing in this module touches an OS handle; it exists so that
//! `usnfind-core` can describe what a search *returns* without depending on
//! `usnfind-ntfs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A single matched file or folder, with its fully reconstructed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// Full path, e.g. `C:\Users\dev\report_42.log`.
    pub path: String,
    /// True if the matched record is a directory.
    pub is_dir: bool,
    /// Drive letter of the volume the match was found on.
    pub volume: char,
}

impl FileMatch {
    pub fn new(path: impl Into<String>, is_dir: bool, volume: char) -> Self {
        FileMatch {
            path: path.into(),
            is_dir,
            volume,
        }
    }
}

/// Per-volume search counters, reported by a single search-driver run.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeStats {
    /// Number of USN records visited by the predicate path, including ones
    /// skipped by the directory filter. A record is counted even when it
    /// doesn't pass the files-vs-folders filter, matching source behaviour.
    pub searched_records: u64,
    /// Number of records that matched the predicate and were yielded.
    pub matched: u64,
}

impl VolumeStats {
    pub fn merge(&mut self, other: VolumeStats) {
        self.searched_records += other.searched_records;
        self.matched += other.matched;
    }
}

/// Aggregate statistics for one coordinator run across all selected volumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub searched_records: u64,
    pub found: u64,
    pub volumes: u32,
    pub elapsed: Duration,
}

impl SearchStats {
    /// Render the one-line summary the CLI prints with `--stats`.
    pub fn summary_line(&self) -> String {
        format!(
            "Searched {} records on {} volume(s) in {:.2}s. Found {} result(s)",
            self.searched_records,
            self.volumes,
            self.elapsed.as_secs_f64(),
            self.found
        )
    }
}

/// A cooperative cancellation flag checked at enumeration page boundaries.
///
/// Cloning shares the same underlying flag; `cancel()` can be called from any
/// thread and every worker observes it on its next page boundary.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_format() {
        let stats = SearchStats {
            searched_records: 1_234_567,
            found: 3,
            volumes: 2,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            stats.summary_line(),
            "Searched 1234567 records on 2 volume(s) in 1.50s. Found 3 result(s)"
        );
    }

    #[test]
    fn cancellation_token_shared_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn volume_stats_merge_sums_fields() {
        let mut total = VolumeStats::default();
        total.merge(VolumeStats {
            searched_records: 10,
            matched: 2,
        });
        total.merge(VolumeStats {
            searched_records: 5,
            matched: 1,
        });
        assert_eq!(total.searched_records, 15);
        assert_eq!(total.matched, 3);
    }
}
