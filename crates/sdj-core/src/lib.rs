//! # sdj-core: Foundational Types for Selective-Disclosure JSON Proofs
//!
//! This crate turns an arbitrary JSON document into the ordered list of byte
//! messages that a multi-message signature scheme signs. Every other crate in
//! the workspace depends on `sdj-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One canonical order.** [`Pointer`] ordering is the protocol-wide
//!    total order over leaves. Signer and verifier derive it independently
//!    and must agree without negotiating it.
//!
//! 2. **`MessageBytes` newtype.** Every signable message is produced by
//!    [`canonical::encode_leaf`]; the inner buffer is private, so no other
//!    serialization path can feed the signature scheme.
//!
//! 3. **Pointers are signed.** Each message carries the leaf's pointer, so
//!    disclosed values cannot be re-attached under another key or index.
//!
//! ## Wire Format Notes
//!
//! - Object members are visited in lexicographic order of their UTF-8 key
//!   bytes, array elements in index order.
//! - The pointer inside a message is not RFC 6901 text. Array elements are
//!   written `[n]` and members `/key` (with `[` escaped as `~2`), so the
//!   container kind is signed. Implementations that sign plain RFC 6901
//!   pointers produce different messages and do not interoperate with this
//!   crate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdj-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod pointer;

// Re-export primary types for ergonomic imports.
pub use canonical::{
    canonicalize, encode_leaf, is_leaf, CanonicalMessage, Canonicalizer, MessageBytes,
    MessageSequence, DEFAULT_MAX_DEPTH,
};
pub use digest::{sha256_messages, MessageDigest};
pub use error::{CanonicalizationError, PointerError};
pub use pointer::{parse_index_token, Pointer, Token};
