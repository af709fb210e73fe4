//! Search Driver (SD): combines the Volume Handle, MFT Enumerator, Path
//! Resolver and a compiled predicate into a single-volume search.

use crate::enumerator::MftEnumerator;
use crate::path;
use crate::volume::NtfsVolume;
use crate::NtfsError;
use usnfind_core::{CancellationToken, FileMatch, Predicate, VolumeStats};

/// Run one volume's search to completion, calling `on_match` for every
/// result as it's produced (so the coordinator can stream to a shared sink
/// instead of buffering a whole volume's matches in memory).
///
/// Always returns the counters accumulated so far, whether or not the walk
/// ran to completion: a mid-stream enumeration failure leaves whatever was
/// found before it both valid and already delivered via `on_match`, so the
/// stats and the error are returned side by side rather than the stats
/// being discarded when the `Result` is an `Err`.
pub fn search_volume(
    volume: NtfsVolume,
    predicate: &Predicate,
    folders: bool,
    cancellation: CancellationToken,
    mut on_match: impl FnMut(FileMatch),
) -> (VolumeStats, Result<(), NtfsError>) {
    let mut stats = VolumeStats::default();

    let handle = match volume.open() {
        Ok(handle) => handle,
        Err(e) => return (stats, Err(e)),
    };
    let enumerator = MftEnumerator::new(&handle, cancellation);

    for record in enumerator {
        let record = match record {
            Ok(record) => record,
            Err(e) => return (stats, Err(e)),
        };
        stats.searched_records += 1;

        if record.is_dir != folders {
            continue;
        }

        if !predicate.matches(&record.name) {
            continue;
        }

        match path::resolve(&handle, record.frn, volume.letter) {
            Ok(full_path) => {
                stats.matched += 1;
                on_match(FileMatch::new(full_path, record.is_dir, volume.letter));
            }
            Err(e) => {
                tracing::warn!(frn = record.frn, error = %e, "dropping record: path resolution failed");
            }
        }
    }

    (stats, Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::NtfsVolume;

    // search_volume's predicate/folders filtering logic is covered
    // indirectly through usnfind_core's own predicate tests and the
    // enumerator's record-decoding tests. The two tests below need a real
    // admin-elevated handle to a live NTFS volume, so they're `#[ignore]`d
    // the same way the teacher's `test_scan_c_drive`/`test_query_journal`
    // are; run with `cargo test -- --ignored` on an elevated Windows shell.

    #[test]
    #[ignore] // Requires admin privileges
    fn test_scan_c_drive_counts_every_visited_record() {
        let volume = NtfsVolume { letter: 'C' };
        let predicate = Predicate::glob("*").unwrap();

        let (stats, result) = search_volume(
            volume,
            &predicate,
            false,
            CancellationToken::new(),
            |_| {},
        );

        match result {
            Ok(()) => {
                println!("searched {} records, {} matched", stats.searched_records, stats.matched);
                assert!(stats.searched_records > 0);
            }
            Err(e) if e.is_access_denied() => {
                println!("test skipped: requires administrator privileges");
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    #[ignore] // Requires admin privileges
    fn test_mid_stream_failure_keeps_partial_counters() {
        let volume = NtfsVolume { letter: 'C' };
        let predicate = Predicate::glob("this_name_should_not_exist_anywhere_*").unwrap();

        let (stats, result) = search_volume(
            volume,
            &predicate,
            false,
            CancellationToken::new(),
            |_| {},
        );

        // Whether or not the walk completes cleanly, the counters returned
        // alongside the result must reflect records actually visited, not a
        // blanket `VolumeStats::default()`.
        match result {
            Ok(()) => assert!(stats.searched_records > 0),
            Err(e) if e.is_access_denied() => {
                println!("test skipped: requires administrator privileges");
            }
            Err(e) => {
                println!("enumeration failed after {} records: {e}", stats.searched_records);
                assert!(stats.searched_records > 0, "a real C: volume should yield at least one record before any failure");
            }
        }
    }
}
