//! # usnfind-core
//!
//! Platform-agnostic pieces of usnfind: the name-matching predicate layer
//! (glob, regex, bounded Levenshtein) and the result/statistics types
//! produced by a scan. Everything that touches an OS handle — volume
//! enumeration, MFT reading, path reconstruction, the thread-per-volume
//! coordinator — lives in `usnfind-ntfs`, which depends on this crate.
//!
//! ## Architecture
//!
//! - **Predicates** (`predicate`): compiled, immutable name matchers
//! - **Types** (`types`): `FileMatch`, `SearchStats`, `CancellationToken`
//! - **Errors** (`error`): predicate-compilation failures
//!
//! ## Example
//!
//! ```
//! use usnfind_core::Predicate;
//!
//! let predicate = Predicate::glob("report_*.log").unwrap();
//! assert!(predicate.matches("report_42.log"));
//! ```

pub mod error;
pub mod predicate;
pub mod types;

pub use error::{PredicateError, Result};
pub use predicate::Predicate;
pub use types::{CancellationToken, FileMatch, SearchStats, VolumeStats};
