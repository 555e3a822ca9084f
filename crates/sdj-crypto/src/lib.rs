//! # sdj-crypto: Signature Suite Seam
//!
//! The multi-message signature scheme behind selective-disclosure proofs is
//! an external capability. This crate defines the seam the protocol layer
//! calls through, plus two implementations: a transparent one that needs no
//! pairing library and a BBS one.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): [`Signer`] signs and verifies ordered message
//!   lists; [`ProofSystem`] derives and checks nonce-bound proofs revealing a
//!   subset of them. [`SignatureSuite`] is the combination the protocol
//!   engine is generic over.
//!
//! - **Keys** (`keys.rs`): opaque byte newtypes. Secret keys are zeroized on
//!   drop and never serialized.
//!
//! - **Transparent** (`transparent.rs`, feature `transparent`, on by
//!   default): SHA-256 commitments signed with Ed25519. Sound, but offers no
//!   unlinkability or zero-knowledge; intended for tests and development.
//!
//! - **BBS** (`bbs.rs`, feature `bbs`): BBS signatures on BLS12-381 via
//!   `zkryptium`. Proofs are zero-knowledge and unlinkable; the verifier
//!   nonce is the presentation header.
//!
//! ## Crate Policy
//!
//! - No dependency on other `sdj-*` crates: suites see bytes, not documents.
//! - Cryptographic rejection is `Ok(false)`; errors are for unusable input.

pub mod error;
pub mod keys;
pub mod traits;

#[cfg(feature = "bbs")]
pub mod bbs;
#[cfg(feature = "transparent")]
pub mod transparent;

pub use error::SuiteError;
pub use keys::{KeyPair, ProofValue, PublicKey, SecretKey, Signature};
pub use traits::{ProofSystem, SignatureSuite, Signer};

#[cfg(feature = "bbs")]
pub use bbs::BbsSuite;
#[cfg(feature = "transparent")]
pub use transparent::TransparentSuite;
