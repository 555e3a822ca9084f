//! # Protocol Orchestrator
//!
//! Ties the canonicalizer, the query resolver and the payload codec to an
//! injected [`SignatureSuite`]:
//!
//! - **Issuer:** [`SelectiveDisclosure::sign`] canonicalizes the document
//!   and signs every message.
//! - **Holder:** [`SelectiveDisclosure::create_proof`] resolves the
//!   disclosure request to leaf indices, derives a nonce-bound proof over
//!   them and builds the payload the verifier will see.
//! - **Verifier:** [`SelectiveDisclosure::verify_proof`] recovers the
//!   revealed messages from the payload and checks the proof.
//!
//! ## Security Invariant
//!
//! Verification outcomes are booleans. A tampered document, a forged
//! payload, a wrong key or a replayed nonce yields `Ok(false)`. `Err` means
//! the inputs could not be processed at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sdj_core::{Canonicalizer, MessageSequence};
use sdj_crypto::{KeyPair, ProofValue, PublicKey, Signature, SignatureSuite};
use sdj_query::QueryError;

use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::payload::{build_payload, recover_messages_with};

/// A derived selective-disclosure proof: the revealed payload and the
/// suite's proof bytes.
///
/// Serializes as `{"payload": ..., "proofValue": "<base64url>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedProof {
    /// The revealed subset of the document.
    pub payload: Value,
    /// Proof bytes produced by the suite.
    pub proof_value: ProofValue,
}

/// The protocol engine. Stateless apart from its suite and configuration;
/// share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SelectiveDisclosure<S> {
    suite: S,
    config: ProtocolConfig,
    canonicalizer: Canonicalizer,
}

impl<S: SignatureSuite> SelectiveDisclosure<S> {
    /// Engine with the default configuration.
    pub fn new(suite: S) -> Self {
        Self::with_config(suite, ProtocolConfig::default())
    }

    /// Engine with explicit limits.
    pub fn with_config(suite: S, config: ProtocolConfig) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(config.max_depth),
            suite,
            config,
        }
    }

    /// The injected suite.
    pub fn suite(&self) -> &S {
        &self.suite
    }

    /// The active limits.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Canonicalize a document under the configured depth limit.
    pub fn messages(&self, document: &Value) -> Result<MessageSequence, ProtocolError> {
        Ok(self.canonicalizer.canonicalize(document)?)
    }

    /// Sign every leaf of `document`.
    ///
    /// # Errors
    ///
    /// `UnsupportedValueKind` if the document cannot be canonicalized;
    /// `CryptoFailure` if the suite rejects the key.
    pub fn sign(&self, document: &Value, key_pair: &KeyPair) -> Result<Signature, ProtocolError> {
        let messages = self.messages(document)?;
        tracing::debug!(
            messages = messages.len(),
            digest = %messages.digest().short(),
            "signing document"
        );
        Ok(self
            .suite
            .sign(&messages.byte_slices(), key_pair.secret_key())?)
    }

    /// Check an issuer signature over `document`.
    ///
    /// Returns `Ok(false)` for any cryptographic mismatch.
    pub fn verify(
        &self,
        document: &Value,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, ProtocolError> {
        let messages = self.messages(document)?;
        let valid = match self
            .suite
            .verify(&messages.byte_slices(), public_key, signature)
        {
            Ok(valid) => valid,
            Err(err) if err.is_mismatch() => false,
            Err(err) => return Err(err.into()),
        };
        if valid {
            tracing::debug!(messages = messages.len(), "signature verified");
        } else {
            tracing::warn!(
                messages = messages.len(),
                digest = %messages.digest().short(),
                "signature rejected"
            );
        }
        Ok(valid)
    }

    /// Derive a proof disclosing the leaves selected by `queries`.
    ///
    /// # Errors
    ///
    /// `MalformedQuery` for a query outside the grammar or a request over
    /// the configured size; `SignatureMismatch` if `signature` was not
    /// issued over `document`.
    pub fn create_proof<Q: AsRef<str>>(
        &self,
        document: &Value,
        public_key: &PublicKey,
        signature: &Signature,
        nonce: &str,
        queries: &[Q],
    ) -> Result<DerivedProof, ProtocolError> {
        if queries.len() > self.config.max_queries {
            return Err(QueryError::TooManyQueries {
                count: queries.len(),
                limit: self.config.max_queries,
            }
            .into());
        }
        let parsed = sdj_query::parse_all(queries)?;
        let messages = self.messages(document)?;
        let selected = sdj_query::resolve_parsed(document, &parsed);

        let revealed = selected
            .iter()
            .map(|pointer| {
                messages
                    .position(pointer)
                    .ok_or_else(|| ProtocolError::UnknownPointer(pointer.to_string()))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let proof_value = self.suite.derive_proof(
            &messages.byte_slices(),
            public_key,
            signature,
            &revealed,
            nonce.as_bytes(),
        )?;
        let payload = build_payload(document, &selected)?;
        tracing::debug!(
            messages = messages.len(),
            revealed = revealed.len(),
            digest = %messages.digest().short(),
            "derived disclosure proof"
        );
        Ok(DerivedProof {
            payload,
            proof_value,
        })
    }

    /// Check a derived proof against the payload it was presented with.
    ///
    /// Returns the suite's verdict unchanged.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` if the payload breaks the element-key encoding of
    /// [`crate::payload`].
    pub fn verify_proof(
        &self,
        payload: &Value,
        public_key: &PublicKey,
        nonce: &str,
        proof_value: &ProofValue,
    ) -> Result<bool, ProtocolError> {
        let revealed = recover_messages_with(&self.canonicalizer, payload)?;
        let valid = self.suite.verify_proof(
            proof_value,
            public_key,
            nonce.as_bytes(),
            &revealed.byte_slices(),
        )?;
        if valid {
            tracing::debug!(revealed = revealed.len(), "disclosure proof verified");
        } else {
            tracing::warn!(revealed = revealed.len(), "disclosure proof rejected");
        }
        Ok(valid)
    }
}

/// Sign `document` with the default configuration.
pub fn sign<S: SignatureSuite + ?Sized>(
    suite: &S,
    document: &Value,
    key_pair: &KeyPair,
) -> Result<Signature, ProtocolError> {
    SelectiveDisclosure::new(suite).sign(document, key_pair)
}

/// Verify an issuer signature with the default configuration.
pub fn verify<S: SignatureSuite + ?Sized>(
    suite: &S,
    document: &Value,
    public_key: &PublicKey,
    signature: &Signature,
) -> Result<bool, ProtocolError> {
    SelectiveDisclosure::new(suite).verify(document, public_key, signature)
}

/// Derive a disclosure proof with the default configuration.
pub fn create_proof<S: SignatureSuite + ?Sized, Q: AsRef<str>>(
    suite: &S,
    document: &Value,
    public_key: &PublicKey,
    signature: &Signature,
    nonce: &str,
    queries: &[Q],
) -> Result<DerivedProof, ProtocolError> {
    SelectiveDisclosure::new(suite).create_proof(document, public_key, signature, nonce, queries)
}

/// Verify a disclosure proof with the default configuration.
pub fn verify_proof<S: SignatureSuite + ?Sized>(
    suite: &S,
    payload: &Value,
    public_key: &PublicKey,
    nonce: &str,
    proof_value: &ProofValue,
) -> Result<bool, ProtocolError> {
    SelectiveDisclosure::new(suite).verify_proof(payload, public_key, nonce, proof_value)
}
