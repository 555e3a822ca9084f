//! # BBS Suite
//!
//! [`Signer`] and [`ProofSystem`] over BBS signatures on BLS12-381 with
//! SHA-256 (`draft-irtf-cfrg-bbs-signatures`), backed by `zkryptium`.
//! Unlike the transparent suite, a derived proof is a zero-knowledge proof
//! of knowledge of the signature: it never carries the signature itself and
//! two proofs from one signature are unlinkable.
//!
//! ## Binding
//!
//! The verifier nonce is passed as the BBS presentation header. The signing
//! header is empty.
//!
//! ## Layouts
//!
//! ```text
//! public key = BBS public key (96 bytes, compressed G2)
//! secret key = BBS secret key (32 bytes) || public key (96 bytes)
//! signature  = BBS signature (80 bytes)
//! proof      = u32(k) || u32(i_0) || ... || u32(i_{k-1}) || BBS proof
//! ```
//!
//! The proof carries the revealed indices because the verifier only sees
//! the revealed messages and BBS proof verification needs their positions.

use rand::RngCore;
use zeroize::Zeroize;
use zkryptium::bbsplus::keys::{BBSplusPublicKey, BBSplusSecretKey};
use zkryptium::keys::pair::KeyPair as BbsKeyPair;
use zkryptium::schemes::algorithms::BbsBls12381Sha256;
use zkryptium::schemes::generics::{PoKSignature, Signature as BbsSignature};

use crate::error::SuiteError;
use crate::keys::{KeyPair, ProofValue, PublicKey, SecretKey, Signature};
use crate::traits::{ProofSystem, Signer};

/// Algorithm identifier reported by [`Signer::algorithm`].
pub const ALGORITHM: &str = "sdj-bbs-bls12381-sha256";

const PUBLIC_KEY_LEN: usize = 96;
const SCALAR_LEN: usize = 32;
const SECRET_KEY_LEN: usize = SCALAR_LEN + PUBLIC_KEY_LEN;
const SIGNATURE_LEN: usize = 80;

/// The BBS suite. Stateless; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct BbsSuite;

impl BbsSuite {
    /// Create the suite.
    pub fn new() -> Self {
        Self
    }

    /// Generate a random issuer key pair.
    pub fn generate_key_pair(&self) -> Result<KeyPair, SuiteError> {
        let mut ikm = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut ikm);
        let pair = self.key_pair_from_seed(&ikm);
        ikm.zeroize();
        pair
    }

    /// Derive an issuer key pair from 32 bytes of key material.
    /// Deterministic.
    pub fn key_pair_from_seed(&self, seed: &[u8; 32]) -> Result<KeyPair, SuiteError> {
        let pair = BbsKeyPair::<BbsBls12381Sha256>::generate(seed, None, None)
            .map_err(|e| SuiteError::Backend(format!("key generation failed: {e}")))?;
        let public = pair.public_key().to_bytes();
        let mut secret = Vec::with_capacity(SECRET_KEY_LEN);
        secret.extend_from_slice(&pair.private_key().to_bytes());
        secret.extend_from_slice(&public);
        Ok(KeyPair::new(
            PublicKey::from_bytes(public.to_vec()),
            SecretKey::from_bytes(secret),
        ))
    }
}

fn public_key(public_key: &PublicKey) -> Result<BBSplusPublicKey, SuiteError> {
    let bytes = public_key.as_bytes();
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(SuiteError::InvalidKey(format!(
            "public key must be {PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    BBSplusPublicKey::from_bytes(bytes)
        .map_err(|e| SuiteError::InvalidKey(format!("invalid public key: {e}")))
}

fn secret_key(secret_key: &SecretKey) -> Result<(BBSplusSecretKey, BBSplusPublicKey), SuiteError> {
    let bytes = secret_key.expose_bytes();
    if bytes.len() != SECRET_KEY_LEN {
        return Err(SuiteError::InvalidKey(format!(
            "secret key must be {SECRET_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let (scalar, public) = bytes.split_at(SCALAR_LEN);
    let sk = BBSplusSecretKey::from_bytes(scalar)
        .map_err(|_| SuiteError::InvalidKey("invalid secret key".into()))?;
    let pk = BBSplusPublicKey::from_bytes(public)
        .map_err(|e| SuiteError::InvalidKey(format!("invalid public key half: {e}")))?;
    Ok((sk, pk))
}

fn signature_bytes(signature: &Signature) -> Option<[u8; SIGNATURE_LEN]> {
    signature.as_bytes().try_into().ok()
}

fn owned(messages: &[&[u8]]) -> Vec<Vec<u8>> {
    messages.iter().map(|m| m.to_vec()).collect()
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

fn encode_proof(revealed: &[usize], proof: &[u8]) -> Result<ProofValue, SuiteError> {
    let too_large = || SuiteError::Backend("too many revealed messages".into());
    let count = u32::try_from(revealed.len()).map_err(|_| too_large())?;
    let mut bytes = Vec::with_capacity(4 * (revealed.len() + 1) + proof.len());
    bytes.extend_from_slice(&count.to_be_bytes());
    for &index in revealed {
        let index = u32::try_from(index).map_err(|_| too_large())?;
        bytes.extend_from_slice(&index.to_be_bytes());
    }
    bytes.extend_from_slice(proof);
    Ok(ProofValue::from_bytes(bytes))
}

/// Split a proof value into its revealed indices and BBS proof bytes.
fn decode_proof(bytes: &[u8]) -> Option<(Vec<usize>, &[u8])> {
    let (count, mut rest) = read_u32(bytes)?;
    let mut revealed = Vec::with_capacity(count.min(rest.len() / 4));
    for _ in 0..count {
        let (index, tail) = read_u32(rest)?;
        revealed.push(index);
        rest = tail;
    }
    Some((revealed, rest))
}

fn read_u32(bytes: &[u8]) -> Option<(usize, &[u8])> {
    if bytes.len() < 4 {
        return None;
    }
    let (head, tail) = bytes.split_at(4);
    let head: [u8; 4] = head.try_into().ok()?;
    Some((u32::from_be_bytes(head) as usize, tail))
}

impl Signer for BbsSuite {
    fn algorithm(&self) -> &'static str {
        ALGORITHM
    }

    fn sign(
        &self,
        messages: &[&[u8]],
        secret_key_bytes: &SecretKey,
    ) -> Result<Signature, SuiteError> {
        let (sk, pk) = secret_key(secret_key_bytes)?;
        let messages = owned(messages);
        let signature =
            BbsSignature::<BbsBls12381Sha256>::sign(Some(messages.as_slice()), &sk, &pk, None)
                .map_err(|e| SuiteError::Backend(format!("signing failed: {e}")))?;
        Ok(Signature::from_bytes(signature.to_bytes().to_vec()))
    }

    fn verify(
        &self,
        messages: &[&[u8]],
        public_key_bytes: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, SuiteError> {
        let pk = public_key(public_key_bytes)?;
        let Some(bytes) = signature_bytes(signature) else {
            return Ok(false);
        };
        let Ok(signature) = BbsSignature::<BbsBls12381Sha256>::from_bytes(&bytes) else {
            return Ok(false);
        };
        let messages = owned(messages);
        Ok(signature.verify(&pk, Some(messages.as_slice()), None).is_ok())
    }
}

impl ProofSystem for BbsSuite {
    fn derive_proof(
        &self,
        messages: &[&[u8]],
        public_key_bytes: &PublicKey,
        signature: &Signature,
        revealed: &[usize],
        nonce: &[u8],
    ) -> Result<ProofValue, SuiteError> {
        if !self.verify(messages, public_key_bytes, signature)? {
            return Err(SuiteError::SignatureInvalid);
        }
        check_revealed(revealed, messages.len())?;
        let pk = public_key(public_key_bytes)?;
        let bytes = signature_bytes(signature).ok_or(SuiteError::SignatureInvalid)?;
        let messages = owned(messages);
        let proof = PoKSignature::<BbsBls12381Sha256>::proof_gen(
            &pk,
            &bytes,
            None,
            Some(nonce),
            Some(messages.as_slice()),
            Some(revealed),
        )
        .map_err(|e| SuiteError::Backend(format!("proof generation failed: {e}")))?;
        encode_proof(revealed, &proof.to_bytes())
    }

    fn verify_proof(
        &self,
        proof: &ProofValue,
        public_key_bytes: &PublicKey,
        nonce: &[u8],
        revealed_messages: &[&[u8]],
    ) -> Result<bool, SuiteError> {
        let pk = public_key(public_key_bytes)?;
        let Some((revealed, proof_bytes)) = decode_proof(proof.as_bytes()) else {
            return Ok(false);
        };
        if revealed.len() != revealed_messages.len()
            || revealed.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Ok(false);
        }
        let Ok(proof) = PoKSignature::<BbsBls12381Sha256>::from_bytes(proof_bytes) else {
            return Ok(false);
        };
        let disclosed = owned(revealed_messages);
        Ok(proof
            .proof_verify(
                &pk,
                Some(disclosed.as_slice()),
                Some(revealed.as_slice()),
                None,
                Some(nonce),
            )
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<Vec<u8>> {
        (0..5).map(|i| format!("message-{i}").into_bytes()).collect()
    }

    fn slices(msgs: &[Vec<u8>]) -> Vec<&[u8]> {
        msgs.iter().map(Vec::as_slice).collect()
    }

    fn keys() -> KeyPair {
        BbsSuite.key_pair_from_seed(&[7u8; 32]).unwrap()
    }

    #[test]
    fn key_lengths() {
        let kp = keys();
        assert_eq!(kp.public_key().as_bytes().len(), PUBLIC_KEY_LEN);
        assert_eq!(kp.secret_key().expose_bytes().len(), SECRET_KEY_LEN);
        assert_eq!(BbsSuite.algorithm(), ALGORITHM);
    }

    #[test]
    fn seeded_keys_are_deterministic() {
        let a = BbsSuite.key_pair_from_seed(&[3u8; 32]).unwrap();
        let b = BbsSuite.key_pair_from_seed(&[3u8; 32]).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        let fresh = BbsSuite.generate_key_pair().unwrap();
        assert_ne!(fresh.public_key(), a.public_key());
    }

    #[test]
    fn sign_and_verify() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        assert_eq!(sig.as_bytes().len(), SIGNATURE_LEN);
        assert!(BbsSuite.verify(&slices(&msgs), kp.public_key(), &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_or_reordered_messages() {
        let kp = keys();
        let mut msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        msgs.swap(0, 1);
        assert!(!BbsSuite.verify(&slices(&msgs), kp.public_key(), &sig).unwrap());
        msgs.swap(0, 1);
        msgs[2] = b"tampered".to_vec();
        assert!(!BbsSuite.verify(&slices(&msgs), kp.public_key(), &sig).unwrap());
        let garbage = Signature::from_bytes(vec![1, 2, 3]);
        assert!(!BbsSuite.verify(&slices(&msgs), kp.public_key(), &garbage).unwrap());
    }

    #[test]
    fn invalid_key_lengths_are_errors() {
        let msgs = messages();
        let err = BbsSuite
            .sign(&slices(&msgs), &SecretKey::from_bytes(vec![0; 32]))
            .unwrap_err();
        assert!(matches!(err, SuiteError::InvalidKey(_)));
        let sig = BbsSuite.sign(&slices(&msgs), keys().secret_key()).unwrap();
        let err = BbsSuite
            .verify(&slices(&msgs), &PublicKey::from_bytes(vec![0; 5]), &sig)
            .unwrap_err();
        assert!(matches!(err, SuiteError::InvalidKey(_)));
    }

    #[test]
    fn derive_and_verify_proof() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        let proof = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[1, 3], b"nonce")
            .unwrap();
        let revealed = [msgs[1].as_slice(), msgs[3].as_slice()];
        assert!(BbsSuite
            .verify_proof(&proof, kp.public_key(), b"nonce", &revealed)
            .unwrap());
    }

    #[test]
    fn proof_bound_to_nonce() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        let proof = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[0], b"n1")
            .unwrap();
        let revealed = [msgs[0].as_slice()];
        assert!(BbsSuite
            .verify_proof(&proof, kp.public_key(), b"n1", &revealed)
            .unwrap());
        assert!(!BbsSuite
            .verify_proof(&proof, kp.public_key(), b"n2", &revealed)
            .unwrap());
    }

    #[test]
    fn proofs_from_one_signature_differ() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        let a = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[2], b"n")
            .unwrap();
        let b = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[2], b"n")
            .unwrap();
        assert_ne!(a, b);
        // No proof carries the signature bytes.
        for proof in [&a, &b] {
            assert!(!proof
                .as_bytes()
                .windows(SIGNATURE_LEN)
                .any(|w| w == sig.as_bytes()));
        }
    }

    #[test]
    fn proof_rejects_substituted_message() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        let proof = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[2], b"n")
            .unwrap();
        assert!(!BbsSuite
            .verify_proof(&proof, kp.public_key(), b"n", &[msgs[3].as_slice()])
            .unwrap());
        assert!(!BbsSuite
            .verify_proof(&proof, kp.public_key(), b"n", &[])
            .unwrap());
    }

    #[test]
    fn malformed_proof_is_false() {
        let kp = keys();
        for junk in [vec![], vec![0, 0, 0, 9], vec![0, 0, 0, 0, 1, 2, 3]] {
            let junk = ProofValue::from_bytes(junk);
            assert!(!BbsSuite
                .verify_proof(&junk, kp.public_key(), b"n", &[])
                .unwrap());
        }
    }

    #[test]
    fn derive_rejects_foreign_signature() {
        let kp = keys();
        let msgs = messages();
        let other: Vec<Vec<u8>> = (0..5).map(|i| vec![i]).collect();
        let sig = BbsSuite.sign(&slices(&other), kp.secret_key()).unwrap();
        let err = BbsSuite
            .derive_proof(&slices(&msgs), kp.public_key(), &sig, &[0], b"n")
            .unwrap_err();
        assert_eq!(err, SuiteError::SignatureInvalid);
        assert!(err.is_mismatch());
    }

    #[test]
    fn derive_rejects_unordered_indices() {
        let kp = keys();
        let msgs = messages();
        let sig = BbsSuite.sign(&slices(&msgs), kp.secret_key()).unwrap();
        for bad in [&[2usize, 1][..], &[1, 1][..], &[5][..]] {
            let err = BbsSuite
                .derive_proof(&slices(&msgs), kp.public_key(), &sig, bad, b"n")
                .unwrap_err();
            assert!(matches!(err, SuiteError::InvalidRevealedIndex { .. }), "{bad:?}");
        }
    }

    #[test]
    fn proof_layout_round_trip() {
        let value = encode_proof(&[1, 4], b"pok").unwrap();
        let (revealed, rest) = decode_proof(value.as_bytes()).unwrap();
        assert_eq!(revealed, vec![1, 4]);
        assert_eq!(rest, b"pok");
        assert!(decode_proof(&[0, 0, 0, 2, 0, 0, 0, 1]).is_none());
    }
}
