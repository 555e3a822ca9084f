//! # Protected Envelopes
//!
//! A JWS-shaped wrapper for signed payloads:
//!
//! ```json
//! {
//!   "protected": { "alg": "...", "kid": "https://example.edu/issuers/123#key-1" },
//!   "payload":   { ... },
//!   "signature": "<standard base64>"
//! }
//! ```
//!
//! The signed document is `{"protected", "payload"}` only. The header is
//! part of the signed messages, so swapping `alg` or `kid` invalidates the
//! signature. The `signature` member is attached afterwards and never
//! signed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sdj_crypto::{KeyPair, PublicKey, Signature, SignatureSuite};

use crate::error::ProtocolError;
use crate::protocol::SelectiveDisclosure;

/// Header members covered by the envelope signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Signature suite identifier.
    pub alg: String,
    /// Issuer key identifier.
    pub kid: String,
}

/// A signed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// Signed header.
    pub protected: ProtectedHeader,
    /// Signed payload.
    pub payload: Value,
    /// Suite signature, standard base64.
    pub signature: String,
}

impl SignedEnvelope {
    /// Decode the signature member.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` if it is not valid base64.
    pub fn signature_bytes(&self) -> Result<Signature, ProtocolError> {
        STANDARD
            .decode(self.signature.trim())
            .map(Signature::from_bytes)
            .map_err(|e| ProtocolError::MalformedEnvelope(format!("signature is not base64: {e}")))
    }

    /// The document the signature covers.
    pub fn signing_document(&self) -> Value {
        signing_document(&self.protected, &self.payload)
    }
}

/// The document signed for a header and payload.
pub fn signing_document(protected: &ProtectedHeader, payload: &Value) -> Value {
    json!({
        "protected": {
            "alg": protected.alg,
            "kid": protected.kid,
        },
        "payload": payload,
    })
}

impl<S: SignatureSuite> SelectiveDisclosure<S> {
    /// Sign `payload` under a protected header naming this engine's suite
    /// and `kid`.
    pub fn seal(
        &self,
        kid: impl Into<String>,
        payload: Value,
        key_pair: &KeyPair,
    ) -> Result<SignedEnvelope, ProtocolError> {
        let protected = ProtectedHeader {
            alg: self.suite().algorithm().to_string(),
            kid: kid.into(),
        };
        let signature = self.sign(&signing_document(&protected, &payload), key_pair)?;
        tracing::debug!(kid = %protected.kid, alg = %protected.alg, "sealed envelope");
        Ok(SignedEnvelope {
            protected,
            payload,
            signature: STANDARD.encode(signature.as_bytes()),
        })
    }

    /// Check an envelope's signature.
    ///
    /// An envelope whose `alg` names a different suite is rejected without
    /// calling the suite.
    pub fn verify_envelope(
        &self,
        envelope: &SignedEnvelope,
        public_key: &PublicKey,
    ) -> Result<bool, ProtocolError> {
        let signature = envelope.signature_bytes()?;
        if envelope.protected.alg != self.suite().algorithm() {
            tracing::warn!(alg = %envelope.protected.alg, "envelope algorithm does not match suite");
            return Ok(false);
        }
        self.verify(&envelope.signing_document(), public_key, &signature)
    }
}
