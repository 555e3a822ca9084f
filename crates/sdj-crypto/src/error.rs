//! # Suite Errors
//!
//! Errors a signature suite may raise. A signature or proof that simply
//! fails to verify is not an error: `verify` and `verify_proof` return
//! `Ok(false)`. These variants cover inputs the suite cannot work with.
//!
//! Messages never include key material.

use thiserror::Error;

/// Error raised by a [`Signer`](crate::Signer) or
/// [`ProofSystem`](crate::ProofSystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuiteError {
    /// The signature was produced over a different number of messages.
    #[error("message count mismatch: signature covers {expected} messages, got {actual}")]
    MessageCountMismatch {
        /// Count the signature was issued over.
        expected: usize,
        /// Count supplied by the caller.
        actual: usize,
    },

    /// The signature does not verify over the supplied messages.
    #[error("signature does not verify over the supplied messages")]
    SignatureInvalid,

    /// A revealed index is out of range or not strictly ascending.
    #[error("revealed index {index} invalid for {count} messages")]
    InvalidRevealedIndex {
        /// The offending index.
        index: usize,
        /// Total message count.
        count: usize,
    },

    /// A key has the wrong length or is not a valid curve point.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A signature or proof could not be decoded.
    #[error("malformed {kind}: {reason}")]
    Malformed {
        /// What was being decoded.
        kind: &'static str,
        /// Why decoding failed.
        reason: String,
    },

    /// Any other backend failure.
    #[error("suite backend error: {0}")]
    Backend(String),
}

impl SuiteError {
    /// Returns true if the error means the signature does not cover the
    /// messages it was presented with.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::MessageCountMismatch { .. } | Self::SignatureInvalid
        )
    }
}
