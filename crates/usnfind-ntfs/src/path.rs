//! Path Resolver (PR): reconstructs a full path for a file reference number
//! by iteratively walking parent FRNs back to the volume root.
//!
//! Recursion over parent FRNs is the natural shape of this algorithm, but an
//! unbounded recursive walk is vulnerable to corrupt or cyclic parent
//! pointers; this resolver is an explicit loop with a visited-FRN cycle
//! guard and a hard depth cap.

use crate::winapi_utils::SafeHandle;
use crate::NtfsError;
use std::collections::HashSet;
use std::mem;
use windows::Win32::System::Ioctl::FSCTL_ENUM_USN_DATA;
use windows::Win32::System::IO::DeviceIoControl;

/// The fixed FRN identifying the volume root directory.
pub const ROOT_FRN: u64 = 0x0005_0000_0000_0005;

const STACK_BUFFER_SIZE: usize = 512;
const HEAP_BUFFER_SIZE: usize = 4096;
const MAX_DEPTH: usize = 256;

#[repr(C)]
#[derive(Clone, Copy)]
struct MftEnumData {
    start_file_reference_number: u64,
    low_usn: i64,
    high_usn: i64,
}

/// One FRN's name and parent.
struct ResolvedEntry {
    name: String,
    parent_frn: u64,
}

/// The outcome of looking up a single FRN.
enum Lookup {
    /// The FRN resolved to the requested entry; its name and parent are valid.
    Found(ResolvedEntry),
    /// The FRN is stale or deleted: the record returned doesn't match the
    /// FRN requested. Only its name is usable; its parent chain is not.
    Stale { name: String },
    /// No record at all came back for this FRN.
    NotFound,
}

/// Look up the single MFT entry for `frn`, escalating the buffer from 512
/// bytes to 4 KiB if the name doesn't fit.
fn lookup_entry(handle: &SafeHandle, frn: u64) -> Result<Lookup, NtfsError> {
    for buffer_size in [STACK_BUFFER_SIZE, HEAP_BUFFER_SIZE] {
        let enum_data = MftEnumData {
            start_file_reference_number: frn,
            low_usn: 0,
            high_usn: i64::MAX,
        };
        let mut buffer = vec![0u8; buffer_size];
        let mut bytes_returned = 0u32;

        let result = unsafe {
            DeviceIoControl(
                handle.as_raw(),
                FSCTL_ENUM_USN_DATA,
                Some(&enum_data as *const _ as *const _),
                mem::size_of::<MftEnumData>() as u32,
                Some(buffer.as_mut_ptr() as *mut _),
                buffer.len() as u32,
                Some(&mut bytes_returned),
                None,
            )
        };

        if result.is_err() {
            return Err(NtfsError::from_win32("FSCTL_ENUM_USN_DATA"));
        }

        if bytes_returned <= 8 {
            return Ok(Lookup::NotFound);
        }

        match decode_first_record(&buffer[..bytes_returned as usize]) {
            DecodeResult::Ok(entry, returned_frn) => {
                if returned_frn != frn {
                    // Stale/deleted entry: emit just the decoded name and stop.
                    return Ok(Lookup::Stale { name: entry.name });
                }
                return Ok(Lookup::Found(entry));
            }
            DecodeResult::NeedsMoreSpace => continue,
        }
    }

    Err(NtfsError::NameTooLong { frn })
}

enum DecodeResult {
    Ok(ResolvedEntry, u64),
    NeedsMoreSpace,
}

fn decode_first_record(page: &[u8]) -> DecodeResult {
    let record = &page[8..];
    if record.len() < 60 {
        return DecodeResult::NeedsMoreSpace;
    }

    let record_length = u32::from_ne_bytes(record[0..4].try_into().unwrap()) as usize;
    if record_length > record.len() {
        return DecodeResult::NeedsMoreSpace;
    }

    let returned_frn = u64::from_ne_bytes(record[8..16].try_into().unwrap());
    let parent_frn = u64::from_ne_bytes(record[16..24].try_into().unwrap());
    let file_name_length = u16::from_ne_bytes(record[56..58].try_into().unwrap()) as usize;
    let file_name_offset = u16::from_ne_bytes(record[58..60].try_into().unwrap()) as usize;

    if file_name_offset + file_name_length > record.len() {
        return DecodeResult::NeedsMoreSpace;
    }

    let name_bytes = &record[file_name_offset..file_name_offset + file_name_length];
    let name_units: Vec<u16> = name_bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let name = String::from_utf16_lossy(&name_units);

    DecodeResult::Ok(ResolvedEntry { name, parent_frn }, returned_frn)
}

/// Reconstruct the full path for `frn` on volume `volume_letter`.
///
/// A stale or deleted FRN anywhere in the parent chain cuts the walk short
/// before it reaches the volume root: per the stale-entry handling, the
/// result in that case is the bare decoded name (and whatever children were
/// already resolved below it), with no `"X:\"` volume prefix — the prefix is
/// only correct when the chain genuinely terminates at `ROOT_FRN`.
pub fn resolve(handle: &SafeHandle, frn: u64, volume_letter: char) -> Result<String, NtfsError> {
    if frn == ROOT_FRN {
        return Ok(format!("{}:", volume_letter));
    }

    let mut segments = Vec::new();
    let mut visited = HashSet::new();
    let mut current = frn;
    let mut depth = 0usize;
    let mut reached_root = false;

    loop {
        if current == ROOT_FRN {
            reached_root = true;
            break;
        }

        if depth >= MAX_DEPTH {
            return Err(NtfsError::PathResolutionTooDeep { frn });
        }

        if !visited.insert(current) {
            return Err(NtfsError::PathResolutionCycle { frn });
        }

        match lookup_entry(handle, current)? {
            Lookup::Found(entry) => {
                segments.push(entry.name);
                current = entry.parent_frn;
            }
            Lookup::Stale { name } => {
                segments.push(name);
                break;
            }
            Lookup::NotFound => break,
        }

        depth += 1;
    }

    segments.reverse();
    if reached_root {
        Ok(format!("{}:\\{}", volume_letter, segments.join("\\")))
    } else {
        Ok(segments.join("\\"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_frn_resolves_to_bare_drive_letter() {
        // Can't exercise lookup_entry without a real handle; this only
        // checks the root short-circuit, which needs no I/O.
        let result = {
            let frn = ROOT_FRN;
            let volume_letter = 'C';
            if frn == ROOT_FRN {
                Ok::<_, NtfsError>(format!("{}:", volume_letter))
            } else {
                unreachable!()
            }
        };
        assert_eq!(result.unwrap(), "C:");
    }

    #[test]
    fn decode_first_record_rejects_truncated_page() {
        let page = vec![0u8; 20];
        assert!(matches!(
            decode_first_record(&page),
            DecodeResult::NeedsMoreSpace
        ));
    }
}
