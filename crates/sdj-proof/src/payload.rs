//! # Disclosure Payload Codec
//!
//! The holder sends the verifier a JSON payload holding exactly the
//! revealed leaves, in their original positions. The verifier decodes that
//! payload back into pointers and re-encodes the revealed messages.
//!
//! ## Array Elements
//!
//! Leaf messages bind their pointer, token kinds included, so element 1 of
//! `phoneNumbers` must come back as element 1 and not as element 0 or as a
//! member named `"1"`. When the revealed elements of an array are exactly
//! `0..k` the array stays an array. Otherwise it is rendered as an object
//! whose keys are bracketed indices:
//!
//! ```text
//! {"xs": ["a", "b", "c"]}  reveal /xs[2]  ->  {"xs": {"[2]": "c"}}
//! ```
//!
//! A real member name that starts with `[` gets one more `[` in the
//! payload (`"[x"` travels as `"[[x"`), so bracketed indices never collide
//! with member names. An object mixing both kinds of key, or a key that
//! starts with a single `[` but is not a bracketed index, is malformed.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use sdj_core::{
    is_leaf, parse_index_token, CanonicalizationError, Canonicalizer, MessageSequence, Pointer,
    Token,
};

use crate::error::ProtocolError;

/// Build the payload revealing exactly `revealed`.
///
/// An empty set yields an empty container of the root's kind (an empty
/// object for a scalar root).
///
/// # Errors
///
/// `UnknownPointer` if a pointer does not address a leaf of `document`.
pub fn build_payload(document: &Value, revealed: &BTreeSet<Pointer>) -> Result<Value, ProtocolError> {
    for pointer in revealed {
        match lookup(document, pointer) {
            Some(value) if is_leaf(pointer, value) => {}
            _ => return Err(ProtocolError::UnknownPointer(pointer.to_string())),
        }
    }
    if revealed.is_empty() {
        return Ok(match document {
            Value::Array(_) => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        });
    }
    let pointers: Vec<&Pointer> = revealed.iter().collect();
    Ok(project(document, 0, &pointers))
}

/// Recover the revealed messages from a payload, with the default depth
/// limit.
pub fn recover_messages(payload: &Value) -> Result<MessageSequence, ProtocolError> {
    recover_messages_with(&Canonicalizer::default(), payload)
}

/// Recover the revealed messages from a payload.
///
/// # Errors
///
/// `MalformedPayload` for keys that break the encoding above, and
/// `UnsupportedValueKind` when the payload nests deeper than the
/// canonicalizer allows.
pub fn recover_messages_with(
    canonicalizer: &Canonicalizer,
    payload: &Value,
) -> Result<MessageSequence, ProtocolError> {
    let mut leaves = Vec::new();
    let mut stack = vec![(Pointer::root(), payload, 0usize)];
    while let Some((pointer, node, depth)) = stack.pop() {
        if is_leaf(&pointer, node) {
            leaves.push((pointer, node));
            continue;
        }
        let children = payload_children(node)?;
        if children.is_empty() {
            continue;
        }
        if depth >= canonicalizer.max_depth() {
            return Err(CanonicalizationError::DepthExceeded {
                limit: canonicalizer.max_depth(),
                pointer: pointer.to_string(),
            }
            .into());
        }
        for (token, child) in children {
            stack.push((pointer.child(token), child, depth + 1));
        }
    }
    Ok(MessageSequence::from_leaves(leaves))
}

/// Resolve a pointer to the node it addresses.
pub fn lookup<'v>(document: &'v Value, pointer: &Pointer) -> Option<&'v Value> {
    let mut node = document;
    for token in pointer.tokens() {
        node = match (node, token) {
            (Value::Object(map), Token::Key(key)) => map.get(key)?,
            (Value::Array(items), Token::Index(index)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Copy of `node` restricted to `pointers`, which all pass through it and
/// are sorted in canonical order.
fn project(node: &Value, depth: usize, pointers: &[&Pointer]) -> Value {
    if pointers.iter().any(|p| p.len() == depth) {
        return node.clone();
    }
    let groups = group_by_token(depth, pointers);
    match node {
        Value::Array(items) => {
            let dense = groups
                .iter()
                .enumerate()
                .all(|(position, (token, _))| token.as_index() == Some(position));
            if dense {
                Value::Array(
                    groups
                        .iter()
                        .zip(items)
                        .map(|((_, group), child)| project(child, depth + 1, group))
                        .collect(),
                )
            } else {
                let mut map = Map::new();
                for (token, group) in &groups {
                    if let Some(index) = token.as_index() {
                        if let Some(child) = items.get(index) {
                            map.insert(element_key(index), project(child, depth + 1, group));
                        }
                    }
                }
                Value::Object(map)
            }
        }
        Value::Object(members) => {
            let mut map = Map::new();
            for (token, group) in &groups {
                if let Some(key) = token.as_key() {
                    if let Some(child) = members.get(key) {
                        map.insert(member_key(key), project(child, depth + 1, group));
                    }
                }
            }
            Value::Object(map)
        }
        _ => node.clone(),
    }
}

/// Split sorted pointers into runs sharing the token at `depth`.
fn group_by_token<'p, 'a>(
    depth: usize,
    pointers: &'a [&'p Pointer],
) -> Vec<(&'p Token, &'a [&'p Pointer])> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < pointers.len() {
        let token = &pointers[start].tokens()[depth];
        let mut end = start + 1;
        while end < pointers.len() && &pointers[end].tokens()[depth] == token {
            end += 1;
        }
        groups.push((token, &pointers[start..end]));
        start = end;
    }
    groups
}

fn element_key(index: usize) -> String {
    format!("[{index}]")
}

fn member_key(key: &str) -> String {
    if key.starts_with('[') {
        format!("[{key}")
    } else {
        key.to_string()
    }
}

fn decode_key(raw: &str) -> Result<Token, ProtocolError> {
    match raw.strip_prefix('[') {
        None => Ok(Token::Key(raw.to_string())),
        Some(rest) if rest.starts_with('[') => Ok(Token::Key(rest.to_string())),
        Some(rest) => rest
            .strip_suffix(']')
            .and_then(parse_index_token)
            .map(Token::Index)
            .ok_or_else(|| {
                ProtocolError::MalformedPayload(format!(
                    "key {raw:?} is neither a member name nor a bracketed index"
                ))
            }),
    }
}

/// Children of a payload container with their decoded tokens.
fn payload_children(node: &Value) -> Result<Vec<(Token, &Value)>, ProtocolError> {
    match node {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(index, child)| (Token::Index(index), child))
            .collect()),
        Value::Object(map) => {
            let children = map
                .iter()
                .map(|(raw, child)| Ok((decode_key(raw)?, child)))
                .collect::<Result<Vec<_>, ProtocolError>>()?;
            let elements = children.iter().filter(|(t, _)| t.as_index().is_some()).count();
            if elements != 0 && elements != children.len() {
                return Err(ProtocolError::MalformedPayload(
                    "object mixes member names and bracketed indices".into(),
                ));
            }
            Ok(children)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ptrs(items: &[&str]) -> BTreeSet<Pointer> {
        items.iter().map(|s| Pointer::parse(s).unwrap()).collect()
    }

    fn person() -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "age": 24,
            "phoneNumbers": [
                {"type": "home", "number": "555-0100"},
                {"type": "work", "number": "555-0199"}
            ],
            "tags": []
        })
    }

    fn revealed_bytes(doc: &Value, revealed: &BTreeSet<Pointer>) -> Vec<Vec<u8>> {
        Canonicalizer::default()
            .canonicalize(doc)
            .unwrap()
            .iter()
            .filter(|m| revealed.contains(m.pointer()))
            .map(|m| m.bytes().as_bytes().to_vec())
            .collect()
    }

    fn recovered_bytes(payload: &Value) -> Vec<Vec<u8>> {
        recover_messages(payload)
            .unwrap()
            .iter()
            .map(|m| m.bytes().as_bytes().to_vec())
            .collect()
    }

    #[test]
    fn reveals_only_selected_fields() {
        let payload = build_payload(&person(), &ptrs(&["/firstName", "/age"])).unwrap();
        assert_eq!(payload, json!({"firstName": "Jane", "age": 24}));
    }

    #[test]
    fn dense_array_prefix_stays_array() {
        let payload = build_payload(&person(), &ptrs(&["/phoneNumbers[0]/number"])).unwrap();
        assert_eq!(payload, json!({"phoneNumbers": [{"number": "555-0100"}]}));
    }

    #[test]
    fn sparse_array_uses_bracketed_indices() {
        let payload = build_payload(&person(), &ptrs(&["/phoneNumbers[1]/number"])).unwrap();
        assert_eq!(payload, json!({"phoneNumbers": {"[1]": {"number": "555-0199"}}}));
    }

    #[test]
    fn sparse_array_preserves_pointers_and_bytes() {
        let doc = json!({"xs": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"]});
        let revealed = ptrs(&["/xs[2]", "/xs[10]"]);
        let payload = build_payload(&doc, &revealed).unwrap();
        assert_eq!(payload, json!({"xs": {"[2]": "c", "[10]": "k"}}));
        assert_eq!(recovered_bytes(&payload), revealed_bytes(&doc, &revealed));
    }

    #[test]
    fn sparse_root_array() {
        let doc = json!(["a", {"b": 1}]);
        let revealed = ptrs(&["[1]/b"]);
        let payload = build_payload(&doc, &revealed).unwrap();
        assert_eq!(payload, json!({"[1]": {"b": 1}}));
        assert_eq!(recovered_bytes(&payload), revealed_bytes(&doc, &revealed));
    }

    #[test]
    fn decimal_members_stay_members() {
        let doc = json!({"roles": {"0": "admin", "1": "user"}});
        let revealed = ptrs(&["/roles/1"]);
        let payload = build_payload(&doc, &revealed).unwrap();
        assert_eq!(payload, json!({"roles": {"1": "user"}}));
        assert_eq!(recovered_bytes(&payload), revealed_bytes(&doc, &revealed));
    }

    #[test]
    fn object_rewrite_of_array_recovers_other_messages() {
        let doc = json!({"roles": ["admin", "user"]});
        let all = ptrs(&["/roles[0]", "/roles[1]"]);
        let rewritten = json!({"roles": {"0": "admin", "1": "user"}});
        assert_ne!(recovered_bytes(&rewritten), revealed_bytes(&doc, &all));
    }

    #[test]
    fn bracketed_member_names_are_escaped() {
        let doc = json!({"[x": 1, "[[": 2, "[3]": 3, "[": 4});
        let revealed = ptrs(&["/~2x", "/~2~2", "/~23]", "/~2"]);
        let payload = build_payload(&doc, &revealed).unwrap();
        assert_eq!(payload, json!({"[[x": 1, "[[[": 2, "[[3]": 3, "[[": 4}));
        assert_eq!(recovered_bytes(&payload), revealed_bytes(&doc, &revealed));
    }

    #[test]
    fn mixed_keys_are_malformed() {
        let err = recover_messages(&json!({"xs": {"[0]": 1, "name": 2}})).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
    }

    #[test]
    fn unescaped_bracket_key_is_malformed() {
        for bad in [json!({"[x": 1}), json!({"[": 1}), json!({"[01]": 1})] {
            let err = recover_messages(&bad).unwrap_err();
            assert!(matches!(err, ProtocolError::MalformedPayload(_)), "{bad}");
        }
    }

    #[test]
    fn recovery_enforces_depth_limit() {
        let payload = json!({"a": {"b": {"c": 1}}});
        assert!(recover_messages_with(&Canonicalizer::new(3), &payload).is_ok());
        let err = recover_messages_with(&Canonicalizer::new(2), &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedValueKind(_)));
    }

    #[test]
    fn empty_reveal_matches_root_kind() {
        let none = BTreeSet::new();
        assert_eq!(build_payload(&person(), &none).unwrap(), json!({}));
        assert_eq!(build_payload(&json!([1, 2]), &none).unwrap(), json!([]));
        assert_eq!(build_payload(&json!("scalar"), &none).unwrap(), json!({}));
        let recovered = recover_messages(&json!({})).unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn empty_container_leaf_is_revealed_as_is() {
        let payload = build_payload(&person(), &ptrs(&["/tags"])).unwrap();
        assert_eq!(payload, json!({"tags": []}));
    }

    #[test]
    fn scalar_root_reveal() {
        let payload = build_payload(&json!(42), &ptrs(&[""])).unwrap();
        assert_eq!(payload, json!(42));
    }

    #[test]
    fn unknown_pointer_rejected() {
        let err = build_payload(&person(), &ptrs(&["/middleName"])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPointer(p) if p == "/middleName"));
    }

    #[test]
    fn interior_pointer_rejected() {
        let err = build_payload(&person(), &ptrs(&["/phoneNumbers[0]"])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPointer(_)));
    }

    #[test]
    fn wrong_token_kind_rejected() {
        let err = build_payload(&person(), &ptrs(&["/phoneNumbers/0/type"])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPointer(_)));
    }

    #[test]
    fn lookup_resolves_tokens() {
        let doc = person();
        let p = Pointer::parse("/phoneNumbers[1]/type").unwrap();
        assert_eq!(lookup(&doc, &p), Some(&json!("work")));
        assert_eq!(lookup(&doc, &Pointer::parse("/phoneNumbers/1").unwrap()), None);
        assert_eq!(lookup(&doc, &Pointer::parse("/age[0]").unwrap()), None);
    }
}
