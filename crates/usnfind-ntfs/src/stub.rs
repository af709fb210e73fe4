//! Stub implementation for non-Windows platforms.
//!
//! Keeps the crate (and anything depending on it, like `usnfind-cli`)
//! compiling off Windows; every operation fails with `NtfsError`.

use crate::NtfsError;
use std::sync::Arc;
use usnfind_core::{CancellationToken, FileMatch, Predicate, SearchStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtfsVolume {
    pub letter: char,
}

pub fn enumerate_ntfs_volumes() -> Result<Vec<NtfsVolume>, NtfsError> {
    Err(NtfsError::WinApi {
        function: "FindFirstVolumeW".to_string(),
        code: 0,
        message: "NTFS backend is only available on Windows".to_string(),
    })
}

pub fn select_volumes(_requested: &[char]) -> Result<Vec<NtfsVolume>, NtfsError> {
    enumerate_ntfs_volumes()
}

pub fn run(
    _volumes: Vec<NtfsVolume>,
    _predicate: Arc<Predicate>,
    _folders: bool,
    _cancellation: CancellationToken,
    _sink: impl Fn(FileMatch) + Send + Sync + 'static,
) -> Result<SearchStats, NtfsError> {
    Err(NtfsError::WinApi {
        function: "FSCTL_ENUM_USN_DATA".to_string(),
        code: 0,
        message: "NTFS backend is only available on Windows".to_string(),
    })
}
