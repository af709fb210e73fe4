//! Error types for the NTFS backend.

use thiserror::Error;

/// Result type alias using `NtfsError`.
pub type Result<T> = std::result::Result<T, NtfsError>;

/// Errors specific to MFT/USN enumeration and path reconstruction.
#[derive(Error, Debug)]
pub enum NtfsError {
    /// `CreateFileW` on `\\.\X:` failed — not an admin process, the letter
    /// isn't an NTFS volume, or the volume isn't ready.
    #[error("failed to open volume {letter}: {os_error}")]
    VolumeOpenFailed { letter: char, os_error: String },

    /// `FSCTL_ENUM_USN_DATA` failed mid-stream, after some records may
    /// already have been yielded.
    #[error("MFT enumeration failed on volume {letter}: {os_error}")]
    EnumerationFailed { letter: char, os_error: String },

    /// The same FRN was seen twice while walking the parent chain.
    #[error("cycle detected while resolving path for FRN {frn:#x}")]
    PathResolutionCycle { frn: u64 },

    /// The parent chain exceeded the hard depth cap (256 hops).
    #[error("path resolution for FRN {frn:#x} exceeded the maximum depth")]
    PathResolutionTooDeep { frn: u64 },

    /// Even the 4 KiB fallback buffer could not hold the record.
    #[error("name too long to resolve for FRN {frn:#x}")]
    NameTooLong { frn: u64 },

    /// No volume letter in the selected set is a ready NTFS volume.
    #[error("no eligible NTFS volume found")]
    NoEligibleVolume,

    /// Access denied, independent of which operation triggered it — the
    /// CLI uses this to infer "not running as administrator".
    #[error("access denied: {operation} (try running as administrator)")]
    AccessDenied { operation: String },

    /// Any other Windows API failure, carrying the raw error code.
    #[error("Windows API error: {function} failed with code {code}: {message}")]
    WinApi {
        function: String,
        code: u32,
        message: String,
    },

    /// An OS-level failure outside the Win32 error-code path, such as
    /// failing to spawn a worker thread.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NtfsError {
    /// Create a WinAPI error from the last Windows error.
    #[cfg(windows)]
    pub fn from_win32(function: &str) -> Self {
        use windows::Win32::Foundation::GetLastError;

        let code = unsafe { GetLastError().0 };
        let message = format_win32_error(code);

        // ERROR_ACCESS_DENIED
        if code == 5 {
            return NtfsError::AccessDenied {
                operation: function.to_string(),
            };
        }

        NtfsError::WinApi {
            function: function.to_string(),
            code,
            message,
        }
    }

    /// True if this error indicates access was denied — the heuristic the
    /// CLI uses to report "not running as administrator".
    pub fn is_access_denied(&self) -> bool {
        matches!(self, NtfsError::AccessDenied { .. })
            || matches!(self, NtfsError::WinApi { code: 5, .. })
            || matches!(self, NtfsError::VolumeOpenFailed { os_error, .. } if os_error.contains("access denied") || os_error.contains("code 5"))
    }
}

/// Format a Win32 error code to a human-readable message.
#[cfg(windows)]
fn format_win32_error(code: u32) -> String {
    use windows::core::PWSTR;
    use windows::Win32::System::Diagnostics::Debug::{
        FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
    };

    let mut buffer = [0u16; 512];
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            None,
            code,
            0,
            PWSTR(buffer.as_mut_ptr()),
            buffer.len() as u32,
            None,
        )
    };

    if len == 0 {
        return format!("Unknown error ({})", code);
    }

    String::from_utf16_lossy(&buffer[..len as usize])
        .trim()
        .to_string()
}

#[cfg(not(windows))]
#[allow(dead_code)]
fn format_win32_error(_code: u32) -> String {
    "Windows API not available".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_variant_is_detected() {
        let err = NtfsError::AccessDenied {
            operation: "FSCTL_ENUM_USN_DATA".to_string(),
        };
        assert!(err.is_access_denied());
    }

    #[test]
    fn winapi_code_five_is_access_denied() {
        let err = NtfsError::WinApi {
            function: "CreateFileW".to_string(),
            code: 5,
            message: "Access is denied.".to_string(),
        };
        assert!(err.is_access_denied());
    }

    #[test]
    fn unrelated_errors_are_not_access_denied() {
        let err = NtfsError::PathResolutionTooDeep { frn: 0x10 };
        assert!(!err.is_access_denied());
    }
}
