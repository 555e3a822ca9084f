//! # Transparent Suite
//!
//! A deterministic, non-private implementation of [`Signer`] and
//! [`ProofSystem`] built from SHA-256 and Ed25519. It exercises the full
//! sign / derive / verify flow end to end without a pairing library.
//!
//! ## Construction
//!
//! ```text
//! h_i        = SHA256("sdj-msg"    || u64(i) || u64(len m_i) || m_i)
//! C          = SHA256("sdj-commit" || u64(n) || h_0 || ... || h_{n-1})
//! signature  = u32(n) || Ed25519(sk, C)
//! binding    = SHA256("sdj-bind"   || u64(len nonce) || nonce || C || sig)
//! ```
//!
//! A proof is a JSON object carrying the message count, the revealed
//! indices, the digests of the hidden messages, the Ed25519 signature and
//! the binding tag. The verifier rebuilds `C` from the revealed messages and
//! the hidden digests, checks the issuer signature, and recomputes the
//! binding for its own nonce.
//!
//! ## Security Notice
//!
//! This suite provides NO unlinkability and NO zero-knowledge: every proof
//! carries the issuer signature verbatim, and the binding tag can be
//! recomputed by anyone holding the proof. The nonce binding only rejects
//! proofs presented under a nonce they were not derived for. Use a
//! pairing-based suite for real deployments.

use ed25519_dalek::{Signer as _, Verifier as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::SuiteError;
use crate::keys::{KeyPair, ProofValue, PublicKey, SecretKey, Signature};
use crate::traits::{ProofSystem, Signer};

/// Algorithm identifier reported by [`Signer::algorithm`].
pub const ALGORITHM: &str = "sdj-transparent-ed25519-sha256";

const PROOF_VERSION: u8 = 1;
const SIGNATURE_LEN: usize = 4 + ed25519_dalek::SIGNATURE_LENGTH;

const DOMAIN_MESSAGE: &[u8] = b"sdj-msg";
const DOMAIN_COMMIT: &[u8] = b"sdj-commit";
const DOMAIN_BIND: &[u8] = b"sdj-bind";

type Digest32 = [u8; 32];

/// The transparent suite. Stateless; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransparentSuite;

impl TransparentSuite {
    /// Create the suite.
    pub fn new() -> Self {
        Self
    }

    /// Generate a random issuer key pair.
    pub fn generate_key_pair(&self) -> KeyPair {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        key_pair_from_signing_key(&signing_key)
    }

    /// Derive an issuer key pair from a 32-byte seed. Deterministic.
    pub fn key_pair_from_seed(&self, seed: &[u8; 32]) -> KeyPair {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        key_pair_from_signing_key(&signing_key)
    }
}

fn key_pair_from_signing_key(signing_key: &ed25519_dalek::SigningKey) -> KeyPair {
    KeyPair::new(
        PublicKey::from_bytes(signing_key.verifying_key().to_bytes().to_vec()),
        SecretKey::from_bytes(signing_key.to_bytes().to_vec()),
    )
}

/// Wire form of a transparent proof.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransparentProof {
    version: u8,
    message_count: usize,
    revealed: Vec<usize>,
    /// Hex digests of the hidden messages, ascending by index.
    hidden_digests: Vec<String>,
    /// Hex Ed25519 signature over the commitment.
    signature: String,
    /// Hex binding tag.
    binding: String,
}

fn message_digest(index: usize, message: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_MESSAGE);
    hasher.update((index as u64).to_be_bytes());
    hasher.update((message.len() as u64).to_be_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

fn commitment(digests: &[Digest32]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_COMMIT);
    hasher.update((digests.len() as u64).to_be_bytes());
    for digest in digests {
        hasher.update(digest);
    }
    hasher.finalize().into()
}

fn binding(nonce: &[u8], commitment: &Digest32, signature: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_BIND);
    hasher.update((nonce.len() as u64).to_be_bytes());
    hasher.update(nonce);
    hasher.update(commitment);
    hasher.update(signature);
    hasher.finalize().into()
}

fn verifying_key(public_key: &PublicKey) -> Result<ed25519_dalek::VerifyingKey, SuiteError> {
    let bytes: [u8; 32] = public_key.as_bytes().try_into().map_err(|_| {
        SuiteError::InvalidKey(format!(
            "public key must be 32 bytes, got {}",
            public_key.as_bytes().len()
        ))
    })?;
    ed25519_dalek::VerifyingKey::from_bytes(&bytes)
        .map_err(|e| SuiteError::InvalidKey(format!("invalid public key: {e}")))
}

fn signing_key(secret_key: &SecretKey) -> Result<ed25519_dalek::SigningKey, SuiteError> {
    let bytes: &[u8; 32] = secret_key.expose_bytes().try_into().map_err(|_| {
        SuiteError::InvalidKey(format!(
            "secret key must be 32 bytes, got {}",
            secret_key.expose_bytes().len()
        ))
    })?;
    Ok(ed25519_dalek::SigningKey::from_bytes(bytes))
}

/// Split a signature into its message count and Ed25519 part.
fn split_signature(signature: &Signature) -> Result<(usize, ed25519_dalek::Signature), SuiteError> {
    let bytes = signature.as_bytes();
    if bytes.len() != SIGNATURE_LEN {
        return Err(SuiteError::Malformed {
            kind: "signature",
            reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
        });
    }
    let (count, sig) = bytes.split_at(4);
    let mut count_bytes = [0u8; 4];
    count_bytes.copy_from_slice(count);
    let sig = ed25519_dalek::Signature::from_slice(sig).map_err(|e| SuiteError::Malformed {
        kind: "signature",
        reason: e.to_string(),
    })?;
    Ok((u32::from_be_bytes(count_bytes) as usize, sig))
}

fn digests_of(messages: &[&[u8]]) -> Vec<Digest32> {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| message_digest(i, m))
        .collect()
}

fn check_revealed(revealed: &[usize], count: usize) -> Result<(), SuiteError> {
    let mut previous: Option<usize> = None;
    for &index in revealed {
        if index >= count || previous.is_some_and(|p| p >= index) {
            return Err(SuiteError::InvalidRevealedIndex { index, count });
        }
        previous = Some(index);
    }
    Ok(())
}

fn decode_digest(hex_text: &str) -> Option<Digest32> {
    hex::decode(hex_text).ok()?.try_into().ok()
}

impl Signer for TransparentSuite {
    fn algorithm(&self) -> &'static str {
        ALGORITHM
    }

    fn sign(&self, messages: &[&[u8]], secret_key: &SecretKey) -> Result<Signature, SuiteError> {
        let count = u32::try_from(messages.len())
            .map_err(|_| SuiteError::Backend("too many messages to sign".into()))?;
        let key = signing_key(secret_key)?;
        let c = commitment(&digests_of(messages));
        let sig = key.sign(&c);
        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        bytes.extend_from_slice(&count.to_be_bytes());
        bytes.extend_from_slice(&sig.to_bytes());
        Ok(Signature::from_bytes(bytes))
    }

    fn verify(
        &self,
        messages: &[&[u8]],
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, SuiteError> {
        let key = verifying_key(public_key)?;
        let Ok((count, sig)) = split_signature(signature) else {
            return Ok(false);
        };
        if count != messages.len() {
            return Ok(false);
        }
        let c = commitment(&digests_of(messages));
        Ok(key.verify(&c, &sig).is_ok())
    }
}

impl ProofSystem for TransparentSuite {
    fn derive_proof(
        &self,
        messages: &[&[u8]],
        public_key: &PublicKey,
        signature: &Signature,
        revealed: &[usize],
        nonce: &[u8],
    ) -> Result<ProofValue, SuiteError> {
        let key = verifying_key(public_key)?;
        let (count, sig) = split_signature(signature).map_err(|_| SuiteError::SignatureInvalid)?;
        if count != messages.len() {
            return Err(SuiteError::MessageCountMismatch {
                expected: count,
                actual: messages.len(),
            });
        }
        let digests = digests_of(messages);
        let c = commitment(&digests);
        key.verify(&c, &sig).map_err(|_| SuiteError::SignatureInvalid)?;
        check_revealed(revealed, count)?;

        let sig_bytes = sig.to_bytes();
        let mut next_revealed = revealed.iter().peekable();
        let mut hidden_digests = Vec::with_capacity(count - revealed.len());
        for (index, digest) in digests.iter().enumerate() {
            if next_revealed.peek() == Some(&&index) {
                next_revealed.next();
            } else {
                hidden_digests.push(hex::encode(digest));
            }
        }
        let proof = TransparentProof {
            version: PROOF_VERSION,
            message_count: count,
            revealed: revealed.to_vec(),
            hidden_digests,
            signature: hex::encode(sig_bytes),
            binding: hex::encode(binding(nonce, &c, &sig_bytes)),
        };
        serde_json::to_vec(&proof)
            .map(ProofValue::from_bytes)
            .map_err(|e| SuiteError::Backend(format!("proof encoding failed: {e}")))
    }

    fn verify_proof(
        &self,
        proof: &ProofValue,
        public_key: &PublicKey,
        nonce: &[u8],
        revealed_messages: &[&[u8]],
    ) -> Result<bool, SuiteError> {
        let key = verifying_key(public_key)?;
        let Ok(proof) = serde_json::from_slice::<TransparentProof>(proof.as_bytes()) else {
            return Ok(false);
        };
        if proof.version != PROOF_VERSION
            || proof.revealed.len() != revealed_messages.len()
            || proof.revealed.len() + proof.hidden_digests.len() != proof.message_count
            || check_revealed(&proof.revealed, proof.message_count).is_err()
        {
            return Ok(false);
        }

        let mut digests = Vec::with_capacity(proof.message_count);
        let mut revealed = proof.revealed.iter().zip(revealed_messages).peekable();
        let mut hidden = proof.hidden_digests.iter();
        for index in 0..proof.message_count {
            let digest = match revealed.peek() {
                Some(&(&r, message)) if r == index => {
                    let d = message_digest(index, message);
                    revealed.next();
                    d
                }
                _ => match hidden.next().and_then(|h| decode_digest(h)) {
                    Some(d) => d,
                    None => return Ok(false),
                },
            };
            digests.push(digest);
        }
        let c = commitment(&digests);

        let Some(sig_bytes) = hex::decode(&proof.signature)
            .ok()
            .and_then(|b| <[u8; 64]>::try_from(b).ok())
        else {
            return Ok(false);
        };
        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        if key.verify(&c, &sig).is_err() {
            return Ok(false);
        }

        let Some(tag) = decode_digest(&proof.binding) else {
            return Ok(false);
        };
        let expected = binding(nonce, &c, &sig_bytes);
        Ok(bool::from(expected.as_slice().ct_eq(tag.as_slice())))
    }
}
