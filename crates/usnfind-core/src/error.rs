//! Error types for name-predicate compilation.
//!
//! Backend-level errors (volume open failures, path resolution issues, raw
//! Windows API errors) live in `usnfind-ntfs::error` instead — they need an
//! OS error code, which this platform-agnostic crate has no business
//! carrying.

use thiserror::Error;

/// Result type alias using `PredicateError`.
pub type Result<T> = std::result::Result<T, PredicateError>;

/// Errors raised while compiling a name predicate (glob, regex, fuzzy).
#[derive(Error, Debug)]
pub enum PredicateError {
    /// The glob or regex pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_message_contains_reason() {
        let err = PredicateError::InvalidPattern {
            pattern: "[".to_string(),
            reason: "unclosed bracket".to_string(),
        };
        assert!(err.to_string().contains("unclosed bracket"));
    }
}
