//! # Canonicalization: Documents to Ordered Signable Messages
//!
//! This module flattens a JSON document into a [`MessageSequence`]: one
//! [`CanonicalMessage`] per leaf, in canonical pointer order (see
//! [`crate::pointer`]). The signer and the verifier each recompute this
//! sequence independently, so every rule here is a protocol constant.
//!
//! ## Leaves
//!
//! - Strings, numbers, booleans and null are leaves.
//! - An empty object or empty array below the root is a structural leaf.
//! - The root container is never a leaf; an empty root yields no messages.
//!   A scalar root is a leaf at the empty pointer.
//!
//! ## Message Encoding
//!
//! ```text
//! u32_be(len(pointer)) || pointer (signed form, UTF-8) || tag || value
//! ```
//!
//! The signed form marks array elements as `[n]` and members as `/key`
//! (see [`crate::pointer`]), so an array and an object keyed `"0"`, `"1"`
//! never share a message.
//!
//! | tag    | kind         | value bytes                         |
//! |--------|--------------|-------------------------------------|
//! | `0x00` | null         | none                                |
//! | `0x01` | boolean      | `0x00` / `0x01`                     |
//! | `0x02` | number       | canonical decimal text              |
//! | `0x03` | string       | UTF-8                               |
//! | `0x04` | empty object | none                                |
//! | `0x05` | empty array  | none                                |
//!
//! The pointer is part of the message, so a disclosed value cannot be moved
//! to a different key or index without invalidating the proof. The type tag
//! keeps `"1"`, `1` and `true` apart.
//!
//! Numbers: integers, and floats with no fractional part, render as the
//! exact decimal integer (`24`, `24.0` and `2.4e1` are the same leaf, as are
//! `1e17` and `100000000000000000`). Other finite floats use the shortest
//! round-trip form.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::digest::{sha256_messages, MessageDigest};
use crate::error::CanonicalizationError;
use crate::pointer::Pointer;

/// Default maximum container nesting accepted by [`Canonicalizer`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_NUMBER: u8 = 0x02;
const TAG_STRING: u8 = 0x03;
const TAG_EMPTY_OBJECT: u8 = 0x04;
const TAG_EMPTY_ARRAY: u8 = 0x05;

/// Encoded bytes of a single leaf message.
///
/// The inner buffer is private: the only constructor is the leaf encoder,
/// so every `MessageBytes` in the system went through the canonical
/// encoding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageBytes(Vec<u8>);

impl MessageBytes {
    /// Access the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the encoding in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the encoding is empty (never the case for a leaf).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for MessageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for MessageBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageBytes({})", hex::encode(&self.0))
    }
}

/// One leaf of a document: its pointer and its encoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    pointer: Pointer,
    bytes: MessageBytes,
}

impl CanonicalMessage {
    /// The pointer of the leaf.
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// The encoded message.
    pub fn bytes(&self) -> &MessageBytes {
        &self.bytes
    }
}

/// The ordered messages of a document, in canonical pointer order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageSequence(Vec<CanonicalMessage>);

impl MessageSequence {
    /// Encode leaves found by some other traversal and put them in canonical
    /// order. Callers pass each leaf once.
    pub fn from_leaves<'v, I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = (Pointer, &'v Value)>,
    {
        let mut messages: Vec<CanonicalMessage> = leaves
            .into_iter()
            .map(|(pointer, value)| CanonicalMessage {
                bytes: encode_leaf(&pointer, value),
                pointer,
            })
            .collect();
        messages.sort_by(|a, b| a.pointer.cmp(&b.pointer));
        Self(messages)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document had no leaves.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the messages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalMessage> {
        self.0.iter()
    }

    /// The message at a global index.
    pub fn get(&self, index: usize) -> Option<&CanonicalMessage> {
        self.0.get(index)
    }

    /// Pointers in order.
    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> {
        self.0.iter().map(CanonicalMessage::pointer)
    }

    /// Encoded messages in order, as the external primitive consumes them.
    pub fn byte_slices(&self) -> Vec<&[u8]> {
        self.0.iter().map(|m| m.bytes.as_bytes()).collect()
    }

    /// Global index of a pointer, if it addresses a leaf.
    pub fn position(&self, pointer: &Pointer) -> Option<usize> {
        self.0.binary_search_by(|m| m.pointer.cmp(pointer)).ok()
    }

    /// SHA-256 over the whole sequence, for log correlation.
    pub fn digest(&self) -> MessageDigest {
        sha256_messages(self)
    }
}

impl<'a> IntoIterator for &'a MessageSequence {
    type Item = &'a CanonicalMessage;
    type IntoIter = std::slice::Iter<'a, CanonicalMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Flattens documents into [`MessageSequence`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonicalizer {
    max_depth: usize,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Canonicalizer {
    /// A canonicalizer that rejects documents nested deeper than `max_depth`.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// The configured nesting limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Canonicalize a JSON document.
    ///
    /// # Errors
    ///
    /// `DepthExceeded` if the document nests deeper than the limit.
    pub fn canonicalize(&self, document: &Value) -> Result<MessageSequence, CanonicalizationError> {
        let mut out = Vec::new();
        let mut pointer = Pointer::root();
        self.visit(document, &mut pointer, 0, &mut out)?;
        Ok(MessageSequence(out))
    }

    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `UnsupportedValueKind` if the value has no JSON representation (for
    /// example a map keyed by non-strings), plus the errors of
    /// [`Canonicalizer::canonicalize`].
    pub fn canonicalize_serializable(
        &self,
        obj: &impl Serialize,
    ) -> Result<MessageSequence, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        self.canonicalize(&value)
    }

    fn visit(
        &self,
        value: &Value,
        pointer: &mut Pointer,
        depth: usize,
        out: &mut Vec<CanonicalMessage>,
    ) -> Result<(), CanonicalizationError> {
        if is_leaf(pointer, value) {
            out.push(CanonicalMessage {
                bytes: encode_leaf(pointer, value),
                pointer: pointer.clone(),
            });
            return Ok(());
        }
        match value {
            Value::Object(map) => {
                self.check_depth(depth, pointer)?;
                let mut members: Vec<(&String, &Value)> = map.iter().collect();
                members.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
                for (key, child) in members {
                    pointer.push_key(key);
                    self.visit(child, pointer, depth + 1, out)?;
                    pointer.pop();
                }
            }
            Value::Array(items) => {
                self.check_depth(depth, pointer)?;
                for (index, child) in items.iter().enumerate() {
                    pointer.push_index(index);
                    self.visit(child, pointer, depth + 1, out)?;
                    pointer.pop();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize, pointer: &Pointer) -> Result<(), CanonicalizationError> {
        if depth >= self.max_depth {
            return Err(CanonicalizationError::DepthExceeded {
                limit: self.max_depth,
                pointer: pointer.to_string(),
            });
        }
        Ok(())
    }
}

/// Canonicalize a document with the default depth limit.
pub fn canonicalize(document: &Value) -> Result<MessageSequence, CanonicalizationError> {
    Canonicalizer::default().canonicalize(document)
}

/// Returns true if `value` at `pointer` is a leaf: a scalar, or an empty
/// container anywhere but the root.
pub fn is_leaf(pointer: &Pointer, value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty() && !pointer.is_root(),
        Value::Array(items) => items.is_empty() && !pointer.is_root(),
        _ => true,
    }
}

/// Encode one leaf at `pointer`.
///
/// Non-empty containers are not leaves; passing one encodes it as the
/// corresponding empty-container tag, so callers only pass leaves.
pub fn encode_leaf(pointer: &Pointer, value: &Value) -> MessageBytes {
    let rendered = pointer.to_string();
    let mut buf = Vec::with_capacity(rendered.len() + 16);
    buf.extend_from_slice(&(rendered.len() as u32).to_be_bytes());
    buf.extend_from_slice(rendered.as_bytes());
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        Value::Number(n) => {
            buf.push(TAG_NUMBER);
            buf.extend_from_slice(canonical_number(n).as_bytes());
        }
        Value::String(s) => {
            buf.push(TAG_STRING);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Object(_) => buf.push(TAG_EMPTY_OBJECT),
        Value::Array(_) => buf.push(TAG_EMPTY_ARRAY),
    }
    MessageBytes(buf)
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        // Integral doubles print exactly at zero precision.
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
