//! Parallel Coordinator (PC): runs one Search Driver per selected NTFS
//! volume on its own OS thread, merging matches through a shared sink and
//! aggregating counters across volumes.

use crate::search::search_volume;
use crate::volume::{enumerate_ntfs_volumes, NtfsVolume};
use crate::NtfsError;
use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{info, warn};
use usnfind_core::{CancellationToken, FileMatch, Predicate, SearchStats, VolumeStats};

/// Select the NTFS volumes a run should search: the requested letters if
/// any were given, otherwise every ready NTFS volume on the system.
pub fn select_volumes(requested: &[char]) -> Result<Vec<NtfsVolume>, NtfsError> {
    let ready = enumerate_ntfs_volumes()?;

    if requested.is_empty() {
        return Ok(ready);
    }

    let selected: Vec<NtfsVolume> = ready
        .into_iter()
        .filter(|v| requested.contains(&v.letter))
        .collect();

    Ok(selected)
}

/// Run the search across every given volume in parallel and return the
/// aggregated stats. Matches are delivered to `sink` as they're found, from
/// whichever worker thread found them; `sink` must be safe to call from
/// multiple threads and is responsible for serializing its own output.
///
/// Every worker's counters are merged regardless of whether that volume's
/// search succeeded, so the totals stay accurate even when some volumes
/// fail. If every worker fails with access denied — the shape of a
/// non-administrator invocation, since volume selection itself needs no
/// elevation — that access-denied error is returned instead of a
/// zero-result `Ok`, so the caller can map it to "not running as
/// administrator" rather than reporting a clean empty run.
pub fn run(
    volumes: Vec<NtfsVolume>,
    predicate: Arc<Predicate>,
    folders: bool,
    cancellation: CancellationToken,
    sink: impl Fn(FileMatch) + Send + Sync + 'static,
) -> Result<SearchStats, NtfsError> {
    if volumes.is_empty() {
        return Err(NtfsError::NoEligibleVolume);
    }

    let started = Instant::now();
    let sink = Arc::new(sink);
    let volume_count = volumes.len();
    let (tx, rx): (Sender<(VolumeStats, Result<(), NtfsError>)>, _) = unbounded();

    let mut handles = Vec::with_capacity(volume_count);
    for volume in volumes {
        let predicate = Arc::clone(&predicate);
        let cancellation = cancellation.clone();
        let sink = Arc::clone(&sink);
        let tx = tx.clone();

        let handle = thread::Builder::new()
            .name(format!("usnfind-vol-{}", volume.letter))
            .spawn(move || {
                info!(volume = %volume.letter, "starting volume search");
                let letter = volume.letter;
                let (stats, result) = search_volume(volume, &predicate, folders, cancellation, |m| {
                    sink(m);
                });
                if let Err(e) = &result {
                    warn!(volume = %letter, error = %e, "volume search failed");
                }
                let _ = tx.send((stats, result));
            })
            .map_err(|e| NtfsError::Io(e.into()))?;

        handles.push(handle);
    }

    drop(tx);

    let mut total = VolumeStats::default();
    let mut volumes_run = 0u32;
    let mut access_denied_count = 0u32;
    let mut last_access_denied = None;

    for (stats, result) in rx {
        total.merge(stats);
        volumes_run += 1;
        match result {
            Ok(()) => {}
            Err(e) if e.is_access_denied() => {
                access_denied_count += 1;
                last_access_denied = Some(e);
            }
            Err(_) => {}
        }
    }

    for handle in handles {
        let _ = handle.join();
    }

    if access_denied_count as usize == volume_count {
        if let Some(e) = last_access_denied {
            return Err(e);
        }
    }

    Ok(SearchStats {
        searched_records: total.searched_records,
        found: total.matched,
        volumes: volumes_run,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_no_volumes_is_no_eligible_volume() {
        let predicate = Arc::new(Predicate::glob("*").unwrap());
        let result = run(
            Vec::new(),
            predicate,
            false,
            CancellationToken::new(),
            |_| {},
        );
        assert!(matches!(result, Err(NtfsError::NoEligibleVolume)));
    }

    #[test]
    fn select_volumes_with_no_request_requires_live_enumeration() {
        // enumerate_ntfs_volumes() requires a real Windows machine; this
        // only documents the contract that an empty `requested` means
        // "all ready volumes", exercised in usnfind-cli's ignored tests.
    }
}
