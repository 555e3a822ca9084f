//! # Keys, Signatures and Proof Values
//!
//! Opaque byte newtypes passed across the suite seam. The core never looks
//! inside them; their layout belongs to the suite that produced them.
//!
//! ## Security Invariant
//!
//! - `SecretKey` does not implement `Serialize` and its `Debug` output is
//!   redacted. Its bytes are zeroized on drop.
//! - `PublicKey`, `Signature` and `ProofValue` serialize as unpadded
//!   base64url strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SuiteError;

/// Decode an unpadded base64url string.
fn decode_b64url(kind: &'static str, s: &str) -> Result<Vec<u8>, SuiteError> {
    URL_SAFE_NO_PAD
        .decode(s.trim())
        .map_err(|e| SuiteError::Malformed {
            kind,
            reason: format!("invalid base64url: {e}"),
        })
}

fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

macro_rules! opaque_bytes {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wrap raw bytes.
            pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// Access the raw bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Consume into the raw bytes.
            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }

            /// Render as unpadded base64url.
            pub fn to_base64url(&self) -> String {
                URL_SAFE_NO_PAD.encode(&self.0)
            }

            /// Parse from unpadded base64url.
            pub fn from_base64url(s: &str) -> Result<Self, SuiteError> {
                decode_b64url($kind, s).map(Self)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base64url())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_base64url(&s).map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({} bytes, {}...)"),
                    self.0.len(),
                    hex_prefix(&self.0)
                )
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_base64url())
            }
        }
    };
}

opaque_bytes!(
    /// An issuer public key in the suite's own encoding.
    PublicKey,
    "public key"
);

opaque_bytes!(
    /// A signature over an ordered message list. The suite encodes the
    /// message count it covers inside the bytes.
    Signature,
    "signature"
);

opaque_bytes!(
    /// A derived selective-disclosure proof.
    ProofValue,
    "proof value"
);

/// An issuer secret key.
///
/// Never serialized or logged. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw secret key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Access the raw bytes. Callers must not log or persist them.
    pub fn expose_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<private>)")
    }
}

/// A public/secret key pair.
#[derive(Clone)]
pub struct KeyPair {
    public: PublicKey,
    secret: SecretKey,
}

impl KeyPair {
    /// Pair a public key with its secret key. The suite does not check that
    /// they belong together until it signs.
    pub fn new(public: PublicKey, secret: SecretKey) -> Self {
        Self { public, secret }
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The secret half.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &self.secret)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64url_roundtrip() {
        let sig = Signature::from_bytes(vec![0xfb, 0xff, 0x00, 0x10]);
        let text = sig.to_base64url();
        assert!(!text.contains('+'));
        assert!(!text.contains('/'));
        assert!(!text.ends_with('='));
        assert_eq!(Signature::from_base64url(&text).unwrap(), sig);
    }

    #[test]
    fn serde_as_string() {
        let proof = ProofValue::from_bytes(b"proof".to_vec());
        let json = serde_json::to_string(&proof).unwrap();
        assert_eq!(json, "\"cHJvb2Y\"");
        let back: ProofValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn invalid_base64_rejected() {
        let err = PublicKey::from_base64url("not base64!").unwrap_err();
        assert!(matches!(err, SuiteError::Malformed { kind: "public key", .. }));
        assert!(serde_json::from_str::<Signature>("\"%%%\"").is_err());
    }

    #[test]
    fn debug_shows_prefix_only() {
        let pk = PublicKey::from_bytes(vec![0xab; 32]);
        let debug = format!("{pk:?}");
        assert_eq!(debug, "PublicKey(32 bytes, abababab...)");
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = KeyPair::new(
            PublicKey::from_bytes(vec![1; 32]),
            SecretKey::from_bytes(vec![0x42; 32]),
        );
        let debug = format!("{kp:?}");
        assert!(debug.contains("SecretKey(<private>)"));
        assert!(!debug.contains("42424242"));
    }
}
