//! # Pointers: Leaf Addresses and the Canonical Order
//!
//! A [`Pointer`] is the path from the document root to a node. Each step is
//! a typed [`Token`]: an object member or an array element. The kind is part
//! of the pointer, so `{"xs": ["a"]}` and `{"xs": {"0": "a"}}` have different
//! leaves and sign differently.
//!
//! ## Signed Form
//!
//! The text bound into every signed message (and the `Display` form):
//!
//! ```text
//! pointer = *( "/" key / "[" index "]" )
//! key     = member name with "~" -> "~0", "/" -> "~1", "[" -> "~2"
//! index   = "0" / nonzero-digit *digit
//! ```
//!
//! `/phoneNumbers[1]/number` is member `phoneNumbers`, element 1, member
//! `number`. The root is the empty string. [`Pointer::to_json_pointer`]
//! renders the RFC 6901 form, which drops the token kind and is only meant
//! for addressing into a `serde_json::Value`.
//!
//! ## Canonical Order
//!
//! The ordering of [`Pointer`] is a protocol constant shared by signer and
//! verifier. Pointers compare token by token and a prefix sorts first.
//! Array elements compare by index. Object members compare
//! lexicographically on the UTF-8 bytes of the key name. Siblings are
//! always of one kind; for totality an element sorts before a member.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PointerError;

/// One step of a [`Pointer`].
///
/// Variant order is significant: the derived `Ord` is the canonical token
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// An array element.
    Index(usize),
    /// An object member.
    Key(String),
}

impl Token {
    /// The member name, if this is an object token.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Token::Key(key) => Some(key),
            Token::Index(_) => None,
        }
    }

    /// The element index, if this is an array token.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Token::Index(index) => Some(*index),
            Token::Key(_) => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Index(index) => write!(f, "[{index}]"),
            Token::Key(key) => {
                f.write_str("/")?;
                for c in key.chars() {
                    match c {
                        '~' => f.write_str("~0")?,
                        '/' => f.write_str("~1")?,
                        '[' => f.write_str("~2")?,
                        c => write!(f, "{c}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// A path from the document root to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Pointer(Vec<Token>);

impl Pointer {
    /// The empty pointer, addressing the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a pointer from tokens, root first.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Token>,
    {
        Self(tokens.into_iter().collect())
    }

    /// The tokens, root first.
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A new pointer one object member deeper.
    pub fn child_key(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.push_key(key);
        next
    }

    /// A new pointer one array element deeper.
    pub fn child_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.push_index(index);
        next
    }

    /// A new pointer one token deeper.
    pub fn child(&self, token: Token) -> Self {
        let mut next = self.clone();
        next.0.push(token);
        next
    }

    /// Descend into an object member in place.
    pub fn push_key(&mut self, key: &str) {
        self.0.push(Token::Key(key.to_string()));
    }

    /// Descend into an array element in place.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(Token::Index(index));
    }

    /// Ascend one level in place. Returns the removed token.
    pub fn pop(&mut self) -> Option<Token> {
        self.0.pop()
    }

    /// Returns true if `prefix` is an ancestor of (or equal to) this pointer.
    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Parse the signed form (`""`, `"/a[0]/b~1c"`).
    pub fn parse(s: &str) -> Result<Self, PointerError> {
        let mut tokens = Vec::new();
        let mut rest = s;
        while let Some(first) = rest.chars().next() {
            match first {
                '/' => {
                    let body = &rest[1..];
                    let end = body.find(['/', '[']).unwrap_or(body.len());
                    let key = unescape_key(&body[..end])
                        .ok_or_else(|| PointerError::InvalidEscape(s.to_string()))?;
                    tokens.push(Token::Key(key));
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest
                        .find(']')
                        .ok_or_else(|| PointerError::InvalidIndex(s.to_string()))?;
                    let index = parse_index_token(&rest[1..close])
                        .ok_or_else(|| PointerError::InvalidIndex(s.to_string()))?;
                    tokens.push(Token::Index(index));
                    rest = &rest[close + 1..];
                }
                _ => return Err(PointerError::InvalidStart(s.to_string())),
            }
        }
        Ok(Self(tokens))
    }

    /// Render as an RFC 6901 pointer string, for `serde_json::Value::pointer`.
    ///
    /// Element and member tokens render alike here, so this form is never
    /// signed.
    pub fn to_json_pointer(&self) -> String {
        let mut out = String::new();
        for token in &self.0 {
            out.push('/');
            match token {
                Token::Index(index) => out.push_str(&index.to_string()),
                Token::Key(key) => out.push_str(&key.replace('~', "~0").replace('/', "~1")),
            }
        }
        out
    }
}

fn unescape_key(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                Some('2') => out.push('['),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Parse a canonical array index: `0` or a run of ASCII digits without a
/// leading zero, fitting in `usize`.
pub fn parse_index_token(token: &str) -> Option<usize> {
    match token.as_bytes() {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        bytes if bytes.iter().all(u8::is_ascii_digit) => token.parse().ok(),
        _ => None,
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
