//! # Error Types: Canonicalization and Pointer Errors
//!
//! Structured errors for the leaf crate. Both enums use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! Canonicalization errors are structural: they indicate a caller bug
//! (a value outside the JSON model, hostile nesting), never an adversarial
//! verification failure, and are surfaced to the caller as typed errors.

use thiserror::Error;

/// Error during canonicalization of a document into signable messages.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The input contains a value that cannot be represented in the JSON
    /// value model (for example a map keyed by non-strings).
    #[error("unsupported value kind: {0}")]
    UnsupportedValueKind(String),

    /// The document nests deeper than the configured limit.
    #[error("unsupported value kind: nesting depth exceeds {limit} at {pointer}")]
    DepthExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// Pointer of the container that crossed the limit.
        pointer: String,
    },
}

impl From<serde_json::Error> for CanonicalizationError {
    fn from(e: serde_json::Error) -> Self {
        Self::UnsupportedValueKind(e.to_string())
    }
}

/// Error while parsing the signed form of a pointer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer must start with `/` or `[`.
    #[error("pointer must be empty or start with '/' or '[': {0:?}")]
    InvalidStart(String),

    /// `~` must be followed by `0`, `1` or `2`.
    #[error("invalid escape sequence in pointer {0:?}")]
    InvalidEscape(String),

    /// An element token is unterminated or not a canonical decimal index.
    #[error("invalid array index in pointer {0:?}")]
    InvalidIndex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_value_kind_display() {
        let err = CanonicalizationError::UnsupportedValueKind("key must be a string".into());
        assert_eq!(
            err.to_string(),
            "unsupported value kind: key must be a string"
        );
    }

    #[test]
    fn depth_exceeded_display_names_limit_and_pointer() {
        let err = CanonicalizationError::DepthExceeded {
            limit: 4,
            pointer: "/a/b/c/d".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("unsupported value kind"));
        assert!(msg.contains('4'));
        assert!(msg.contains("/a/b/c/d"));
    }

    #[test]
    fn serde_error_converts_to_unsupported_kind() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CanonicalizationError::from(bad);
        assert!(matches!(err, CanonicalizationError::UnsupportedValueKind(_)));
    }

    #[test]
    fn pointer_error_display() {
        let err = PointerError::InvalidStart("a/b".into());
        assert!(err.to_string().contains("a/b"));
        let err = PointerError::InvalidIndex("/xs[01]".into());
        assert!(err.to_string().contains("/xs[01]"));
    }
}
