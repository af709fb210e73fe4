//! Volume Handle (VH): discovering ready NTFS volumes and opening a raw
//! device handle to one.

use crate::error::NtfsError;
use crate::winapi_utils::{open_volume, to_wide_string, SafeHandle};
use std::mem::MaybeUninit;
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::MAX_PATH;
use windows::Win32::Storage::FileSystem::{
    FindFirstVolumeW, FindNextVolumeW, FindVolumeClose, GetDriveTypeW, GetVolumeInformationW,
    GetVolumePathNamesForVolumeNameW,
};

const DRIVE_FIXED: u32 = 3;

/// A drive letter known to be a ready, fixed NTFS volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtfsVolume {
    pub letter: char,
}

impl NtfsVolume {
    /// Device path form (`\\.\X:`) used to open the volume.
    pub fn device_path(&self) -> String {
        format!("\\\\.\\{}:", self.letter)
    }

    /// Open this volume's device handle (`VH.Open`).
    ///
    /// Failure sources per the contract: not an admin process, the letter
    /// isn't an NTFS volume, or the volume isn't ready.
    pub fn open(&self) -> Result<SafeHandle, NtfsError> {
        open_volume(&self.device_path()).map_err(|e| match e {
            NtfsError::AccessDenied { .. } => NtfsError::VolumeOpenFailed {
                letter: self.letter,
                os_error: "access denied".to_string(),
            },
            NtfsError::WinApi { code, message, .. } => NtfsError::VolumeOpenFailed {
                letter: self.letter,
                os_error: format!("{} (code {})", message, code),
            },
            other => other,
        })
    }
}

/// Discover every ready, fixed NTFS volume on the system (`VH` discovery).
pub fn enumerate_ntfs_volumes() -> Result<Vec<NtfsVolume>, NtfsError> {
    let mut volumes = Vec::new();
    let mut volume_name = [0u16; MAX_PATH as usize];

    let find_handle = unsafe { FindFirstVolumeW(&mut volume_name) };
    let find_handle = match find_handle {
        Ok(h) => h,
        Err(_) => return Err(NtfsError::from_win32("FindFirstVolumeW")),
    };

    loop {
        let volume_guid = String::from_utf16_lossy(
            &volume_name[..volume_name
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(volume_name.len())],
        );

        if let Some(mount_point) = get_volume_mount_point(&volume_guid) {
            if is_fixed_drive(&mount_point) && is_ntfs(&mount_point) {
                if let Some(letter) = mount_point.chars().next() {
                    debug!(letter = %letter, "found ready NTFS volume");
                    volumes.push(NtfsVolume {
                        letter: letter.to_ascii_uppercase(),
                    });
                }
            }
        }

        volume_name = [0u16; MAX_PATH as usize];
        if unsafe { FindNextVolumeW(find_handle, &mut volume_name) }.is_err() {
            break;
        }
    }

    unsafe {
        let _ = FindVolumeClose(find_handle);
    }

    Ok(volumes)
}

fn get_volume_mount_point(volume_guid: &str) -> Option<String> {
    let wide_guid = to_wide_string(volume_guid);
    let mut path_names = [0u16; MAX_PATH as usize];
    let mut return_length = 0u32;

    let result = unsafe {
        GetVolumePathNamesForVolumeNameW(
            PCWSTR(wide_guid.as_ptr()),
            Some(&mut path_names),
            &mut return_length,
        )
    };
    if result.is_err() {
        return None;
    }

    let first_null = path_names.iter().position(|&c| c == 0)?;
    if first_null == 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&path_names[..first_null]))
}

fn is_fixed_drive(path: &str) -> bool {
    let wide_path = to_wide_string(path);
    unsafe { GetDriveTypeW(PCWSTR(wide_path.as_ptr())) == DRIVE_FIXED }
}

fn is_ntfs(mount_point: &str) -> bool {
    let wide_path = to_wide_string(mount_point);
    let mut fs_name = [0u16; MAX_PATH as usize];
    let mut dummy_serial = MaybeUninit::<u32>::uninit();
    let mut dummy_max_component = MaybeUninit::<u32>::uninit();
    let mut dummy_flags = MaybeUninit::<u32>::uninit();

    let result = unsafe {
        GetVolumeInformationW(
            PCWSTR(wide_path.as_ptr()),
            None,
            Some(dummy_serial.as_mut_ptr()),
            Some(dummy_max_component.as_mut_ptr()),
            Some(dummy_flags.as_mut_ptr()),
            Some(&mut fs_name),
        )
    };
    if result.is_err() {
        return false;
    }

    let len = fs_name.iter().position(|&c| c == 0).unwrap_or(0);
    String::from_utf16_lossy(&fs_name[..len]) == "NTFS"
}
