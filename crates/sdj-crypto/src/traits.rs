//! # Signature Suite Traits
//!
//! The multi-message signature primitive is an injected capability. A suite
//! signs an ordered list of byte messages and later derives proofs that
//! reveal a subset of them, bound to a verifier-chosen nonce.
//!
//! ## Security Invariant
//!
//! Both traits require `Send + Sync` so a suite can be shared across worker
//! threads. Implementations hold no per-call mutable state.
//!
//! Cryptographic rejection is `Ok(false)`, never an `Err`. Errors are
//! reserved for inputs the suite cannot interpret.

use std::sync::Arc;

use crate::error::SuiteError;
use crate::keys::{ProofValue, PublicKey, SecretKey, Signature};

/// Issuer-side signing over an ordered message list.
pub trait Signer: Send + Sync {
    /// Algorithm identifier, used as the `alg` of protected envelopes.
    fn algorithm(&self) -> &'static str;

    /// Sign `messages` in the given order.
    fn sign(&self, messages: &[&[u8]], secret_key: &SecretKey) -> Result<Signature, SuiteError>;

    /// Verify a signature over `messages` in the given order.
    fn verify(
        &self,
        messages: &[&[u8]],
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, SuiteError>;
}

/// Holder-side proof derivation and verifier-side proof checking.
pub trait ProofSystem: Send + Sync {
    /// Derive a proof revealing the messages at `revealed` (strictly
    /// ascending global indices into `messages`).
    ///
    /// # Errors
    ///
    /// `MessageCountMismatch` or `SignatureInvalid` when `signature` was not
    /// issued over `messages`; `InvalidRevealedIndex` for an out-of-range or
    /// unordered index.
    fn derive_proof(
        &self,
        messages: &[&[u8]],
        public_key: &PublicKey,
        signature: &Signature,
        revealed: &[usize],
        nonce: &[u8],
    ) -> Result<ProofValue, SuiteError>;

    /// Check a proof against the revealed messages, supplied in ascending
    /// order of their original indices.
    fn verify_proof(
        &self,
        proof: &ProofValue,
        public_key: &PublicKey,
        nonce: &[u8],
        revealed_messages: &[&[u8]],
    ) -> Result<bool, SuiteError>;
}

macro_rules! forward_suite {
    ($($wrapper:ty),*) => {$(
        impl<T: Signer + ?Sized> Signer for $wrapper {
            fn algorithm(&self) -> &'static str {
                (**self).algorithm()
            }

            fn sign(&self, messages: &[&[u8]], secret_key: &SecretKey) -> Result<Signature, SuiteError> {
                (**self).sign(messages, secret_key)
            }

            fn verify(
                &self,
                messages: &[&[u8]],
                public_key: &PublicKey,
                signature: &Signature,
            ) -> Result<bool, SuiteError> {
                (**self).verify(messages, public_key, signature)
            }
        }

        impl<T: ProofSystem + ?Sized> ProofSystem for $wrapper {
            fn derive_proof(
                &self,
                messages: &[&[u8]],
                public_key: &PublicKey,
                signature: &Signature,
                revealed: &[usize],
                nonce: &[u8],
            ) -> Result<ProofValue, SuiteError> {
                (**self).derive_proof(messages, public_key, signature, revealed, nonce)
            }

            fn verify_proof(
                &self,
                proof: &ProofValue,
                public_key: &PublicKey,
                nonce: &[u8],
                revealed_messages: &[&[u8]],
            ) -> Result<bool, SuiteError> {
                (**self).verify_proof(proof, public_key, nonce, revealed_messages)
            }
        }
    )*};
}

forward_suite!(&T, Arc<T>, Box<T>);

/// A complete suite: signing plus proofs.
pub trait SignatureSuite: Signer + ProofSystem {}

impl<T: Signer + ProofSystem> SignatureSuite for T {}
