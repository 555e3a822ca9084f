//! # sdj-proof: Selective-Disclosure Proofs over JSON
//!
//! An issuer signs every leaf of a JSON document. A holder later derives a
//! proof revealing only the leaves a verifier asked for, bound to the
//! verifier's nonce. The verifier checks the proof against the revealed
//! payload alone.
//!
//! ```text
//! issuer    sign(document, key_pair)                          -> Signature
//! holder    create_proof(document, pk, signature, nonce, q)   -> { payload, proofValue }
//! verifier  verify_proof(payload, pk, nonce, proofValue)      -> bool
//! ```
//!
//! The signature scheme is injected as a [`SignatureSuite`](sdj_crypto::SignatureSuite).
//!
//! ## Modules
//!
//! - `payload`: builds the revealed payload and recovers its messages.
//! - `protocol`: the [`SelectiveDisclosure`] engine and free-function
//!   shortcuts for the four operations.
//! - `worker`: [`DisclosureWorker`] runs operations on tokio's blocking pool
//!   under a timeout.
//! - `envelope`: JWS-shaped [`SignedEnvelope`]s.
//! - `config`: [`ProtocolConfig`] limits, loadable from the environment.

pub mod config;
pub mod envelope;
pub mod error;
pub mod payload;
pub mod protocol;
pub mod worker;

pub use config::{ConfigError, ProtocolConfig};
pub use envelope::{signing_document, ProtectedHeader, SignedEnvelope};
pub use error::ProtocolError;
pub use payload::{build_payload, recover_messages, recover_messages_with};
pub use protocol::{create_proof, sign, verify, verify_proof, DerivedProof, SelectiveDisclosure};
pub use worker::DisclosureWorker;
