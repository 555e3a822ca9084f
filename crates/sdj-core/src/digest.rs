//! # Message Digests
//!
//! A SHA-256 digest over a whole [`MessageSequence`], used to correlate log
//! lines for the same document across sign, prove and verify calls without
//! logging document content.
//!
//! Each message is length-prefixed before hashing so that message
//! boundaries are part of the digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::MessageSequence;

/// A SHA-256 digest of a canonical message sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl MessageDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// First eight hex characters, enough to tell documents apart in logs.
    pub fn short(&self) -> String {
        hex::encode(&self.bytes[..4])
    }
}

impl std::fmt::Display for MessageDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the digest of a message sequence.
pub fn sha256_messages(messages: &MessageSequence) -> MessageDigest {
    let mut hasher = Sha256::new();
    hasher.update((messages.len() as u64).to_be_bytes());
    for message in messages {
        let bytes = message.bytes().as_bytes();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    MessageDigest { bytes }
}
