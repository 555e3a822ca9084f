//! # Protocol Errors
//!
//! The error taxonomy callers of the four protocol operations see. Lower
//! crates keep their own error types; they convert here.
//!
//! A proof or signature that fails to verify is not an error. Those
//! operations return `Ok(false)`.

use thiserror::Error;

use sdj_core::CanonicalizationError;
use sdj_crypto::SuiteError;
use sdj_query::QueryError;

/// Errors raised by protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The document contains a value with no canonical encoding, or nests
    /// deeper than the configured limit.
    #[error(transparent)]
    UnsupportedValueKind(#[from] CanonicalizationError),

    /// A disclosure query is not in the grammar, or the request is too large.
    #[error(transparent)]
    MalformedQuery(#[from] QueryError),

    /// The signature was not issued over this document's messages.
    #[error("signature does not cover the document: {0}")]
    SignatureMismatch(#[source] SuiteError),

    /// Any other failure of the signature suite or the worker running it.
    #[error("cryptographic failure: {0}")]
    CryptoFailure(String),

    /// A revealed pointer does not address a leaf of the document.
    #[error("pointer {0:?} does not address a leaf of the document")]
    UnknownPointer(String),

    /// A disclosure payload breaks the element-key encoding.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A protected envelope could not be decoded.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl From<SuiteError> for ProtocolError {
    fn from(err: SuiteError) -> Self {
        if err.is_mismatch() {
            Self::SignatureMismatch(err)
        } else {
            Self::CryptoFailure(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_mismatch_maps_to_signature_mismatch() {
        let err = ProtocolError::from(SuiteError::MessageCountMismatch {
            expected: 3,
            actual: 2,
        });
        assert!(matches!(err, ProtocolError::SignatureMismatch(_)));
        assert!(err.to_string().contains("covers 3"));

        let err = ProtocolError::from(SuiteError::SignatureInvalid);
        assert!(matches!(err, ProtocolError::SignatureMismatch(_)));
    }

    #[test]
    fn other_suite_errors_are_crypto_failures() {
        let err = ProtocolError::from(SuiteError::InvalidKey("too short".into()));
        assert!(matches!(err, ProtocolError::CryptoFailure(_)));
        assert!(err.to_string().starts_with("cryptographic failure"));
    }

    #[test]
    fn canonicalization_errors_are_transparent() {
        let inner = CanonicalizationError::UnsupportedValueKind("map key must be a string".into());
        let expected = inner.to_string();
        let err = ProtocolError::from(inner);
        assert!(matches!(err, ProtocolError::UnsupportedValueKind(_)));
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn malformed_payload_display() {
        let err = ProtocolError::MalformedPayload("object mixes member names and bracketed indices".into());
        assert!(err.to_string().starts_with("malformed payload: "));
    }

    #[test]
    fn unknown_pointer_display() {
        let err = ProtocolError::UnknownPointer("/missing".into());
        assert_eq!(
            err.to_string(),
            "pointer \"/missing\" does not address a leaf of the document"
        );
    }
}
