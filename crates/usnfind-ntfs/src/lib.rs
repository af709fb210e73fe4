//! # usnfind-ntfs
//!
//! Windows/NTFS backend: enumerates the Master File Table via the USN
//! change-journal control interface, reconstructs full paths, and runs the
//! per-volume searches that `usnfind-cli` drives.
//!
//! ## Architecture
//!
//! All unsafe Windows API calls are concentrated in `winapi_utils`:
//!
//! - `volume.rs`: discovering ready NTFS volumes and opening a device handle
//! - `enumerator.rs`: streaming `FSCTL_ENUM_USN_DATA` pages into records
//! - `path.rs`: reconstructing a full path from a file reference number
//! - `search.rs`: one volume's VH+ME+PR+predicate combined scan
//! - `coordinator.rs`: one thread per selected volume, merged results
//!
//! ## Permissions
//!
//! Reading the MFT requires elevated privileges: the process should be run
//! as Administrator, or hold the "Perform Volume Maintenance Tasks"
//! privilege. Access failures surface as `NtfsError::AccessDenied`.

#[cfg(windows)]
mod coordinator;
#[cfg(windows)]
mod enumerator;
#[cfg(windows)]
mod path;
#[cfg(windows)]
mod search;
#[cfg(windows)]
mod volume;
#[cfg(windows)]
mod winapi_utils;

#[cfg(windows)]
pub use coordinator::{run, select_volumes};
#[cfg(windows)]
pub use enumerator::{MftEnumerator, UsnRecord};
#[cfg(windows)]
pub use path::ROOT_FRN;
#[cfg(windows)]
pub use volume::{enumerate_ntfs_volumes, NtfsVolume};

#[cfg(not(windows))]
mod stub;

#[cfg(not(windows))]
pub use stub::{run, select_volumes, NtfsVolume};

pub mod error;
pub use error::NtfsError;
