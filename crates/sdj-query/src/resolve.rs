//! # Query Resolution
//!
//! Evaluates parsed queries against a document and returns the leaf
//! pointers they select. Each step maps the current frontier of
//! `(pointer, node)` pairs to the next one; whatever survives the last step
//! contributes every leaf in its subtree. Leaves are decided by
//! [`sdj_core::is_leaf`], so the result is always a subset of the pointers
//! the canonicalizer emits for the same document.

use std::collections::BTreeSet;

use serde_json::Value;

use sdj_core::{is_leaf, Pointer};

use crate::ast::{PathQuery, Predicate, Step};
use crate::error::QueryError;
use crate::parser::parse;

type Frontier<'v> = Vec<(Pointer, &'v Value)>;

/// Parse every query, failing on the first malformed one.
pub fn parse_all<Q: AsRef<str>>(queries: &[Q]) -> Result<Vec<PathQuery>, QueryError> {
    queries.iter().map(|q| parse(q.as_ref())).collect()
}

/// Resolve a disclosure request against a document.
///
/// Queries are evaluated independently and their results unioned. A query
/// that matches nothing contributes nothing.
///
/// # Errors
///
/// `QueryError::Malformed` if any query is not in the grammar. No partial
/// result is returned.
pub fn resolve<Q: AsRef<str>>(
    document: &Value,
    queries: &[Q],
) -> Result<BTreeSet<Pointer>, QueryError> {
    let parsed = parse_all(queries)?;
    Ok(resolve_parsed(document, &parsed))
}

/// Resolve already-parsed queries.
pub fn resolve_parsed(document: &Value, queries: &[PathQuery]) -> BTreeSet<Pointer> {
    let mut selected = BTreeSet::new();
    for query in queries {
        let matched = select(document, query);
        if matched.is_empty() {
            tracing::debug!(query = %query, "disclosure query matched nothing");
        }
        selected.extend(matched);
    }
    tracing::debug!(
        queries = queries.len(),
        selected = selected.len(),
        "resolved disclosure request"
    );
    selected
}

/// Leaf pointers selected by one query.
pub fn select(document: &Value, query: &PathQuery) -> BTreeSet<Pointer> {
    let mut frontier: Frontier<'_> = vec![(Pointer::root(), document)];
    for step in query.steps() {
        frontier = apply(step, frontier);
        if frontier.is_empty() {
            break;
        }
    }
    let mut leaves = BTreeSet::new();
    for (pointer, node) in frontier {
        collect_leaves(pointer, node, &mut leaves);
    }
    leaves
}

fn apply<'v>(step: &Step, frontier: Frontier<'v>) -> Frontier<'v> {
    let mut next = Vec::new();
    for (pointer, node) in frontier {
        match step {
            Step::Field(name) => {
                if let Some(child) = node.as_object().and_then(|obj| obj.get(name)) {
                    next.push((pointer.child_key(name), child));
                }
            }
            Step::Index(index) => {
                if let Some(child) = node.as_array().and_then(|items| items.get(*index)) {
                    next.push((pointer.child_index(*index), child));
                }
            }
            Step::Wildcard => {
                if let Some(items) = node.as_array() {
                    for (index, child) in items.iter().enumerate() {
                        next.push((pointer.child_index(index), child));
                    }
                }
            }
            Step::Filter(predicate) => filter(predicate, &pointer, node, &mut next),
        }
    }
    next
}

/// Filter candidates are the node's children; a child that is an array also
/// offers its elements, so `$[?(@.state == 'CA')]` reaches into
/// `{"addresses": [...]}` from the root.
fn filter<'v>(predicate: &Predicate, pointer: &Pointer, node: &'v Value, out: &mut Frontier<'v>) {
    for (child_ptr, child) in children(pointer, node) {
        if let Value::Array(items) = child {
            for (index, item) in items.iter().enumerate() {
                if predicate.matches(item) {
                    out.push((child_ptr.child_index(index), item));
                }
            }
        }
        if predicate.matches(child) {
            out.push((child_ptr, child));
        }
    }
}

fn children<'v>(pointer: &Pointer, node: &'v Value) -> Frontier<'v> {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| (pointer.child_key(key), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (pointer.child_index(index), child))
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_leaves(pointer: Pointer, node: &Value, out: &mut BTreeSet<Pointer>) {
    let mut stack = vec![(pointer, node)];
    while let Some((pointer, node)) = stack.pop() {
        if is_leaf(&pointer, node) {
            out.insert(pointer);
            continue;
        }
        stack.extend(children(&pointer, node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "age": 24,
            "phoneNumbers": [
                {"type": "home", "number": "555-0100"},
                {"type": "work", "number": "555-0199"}
            ],
            "addresses": [
                {"state": "CA", "postalCode": "94016"},
                {"state": "NY", "postalCode": "10001"}
            ],
            "tags": [],
            "meta": {}
        })
    }

    fn ptrs(items: &[&str]) -> BTreeSet<Pointer> {
        items.iter().map(|s| Pointer::parse(s).unwrap()).collect()
    }

    #[test]
    fn single_field() {
        let got = resolve(&person(), &["$.firstName"]).unwrap();
        assert_eq!(got, ptrs(&["/firstName"]));
    }

    #[test]
    fn wildcard_selects_whole_subtrees() {
        let got = resolve(&person(), &["$.phoneNumbers[*]"]).unwrap();
        assert_eq!(
            got,
            ptrs(&[
                "/phoneNumbers[0]/number",
                "/phoneNumbers[0]/type",
                "/phoneNumbers[1]/number",
                "/phoneNumbers[1]/type",
            ])
        );
    }

    #[test]
    fn wildcard_then_field() {
        let got = resolve(&person(), &["$.phoneNumbers[*].number"]).unwrap();
        assert_eq!(
            got,
            ptrs(&["/phoneNumbers[0]/number", "/phoneNumbers[1]/number"])
        );
    }

    #[test]
    fn root_filter_reaches_array_members() {
        let doc = json!({
            "addresses": [
                {"state": "CA", "postalCode": "1"},
                {"state": "NY", "postalCode": "2"}
            ]
        });
        let got = resolve(&doc, &["$[?(@.state === 'CA')].postalCode"]).unwrap();
        assert_eq!(got, ptrs(&["/addresses[0]/postalCode"]));
    }

    #[test]
    fn filter_on_array_selects_matching_elements() {
        let got = resolve(&person(), &["$.addresses[?(@.state == 'NY')]"]).unwrap();
        assert_eq!(
            got,
            ptrs(&["/addresses[1]/postalCode", "/addresses[1]/state"])
        );
    }

    #[test]
    fn filter_missing_field_skips_candidate() {
        let doc = json!({"xs": [{"a": 1}, {"b": 1}, {"a": 2}]});
        let got = resolve(&doc, &["$.xs[?(@.a == 1)]"]).unwrap();
        assert_eq!(got, ptrs(&["/xs[0]/a"]));
    }

    #[test]
    fn filter_number_literal() {
        let doc = json!({"xs": [{"n": 24.0, "v": "x"}, {"n": 25, "v": "y"}]});
        let got = resolve(&doc, &["$.xs[?(@.n == 24)].v"]).unwrap();
        assert_eq!(got, ptrs(&["/xs[0]/v"]));
    }

    #[test]
    fn index_step() {
        let got = resolve(&person(), &["$.addresses[1].state", "$.addresses[9]"]).unwrap();
        assert_eq!(got, ptrs(&["/addresses[1]/state"]));
    }

    #[test]
    fn index_and_member_steps_keep_their_kind() {
        let doc = json!({"roles": {"0": "admin"}});
        assert!(resolve(&doc, &["$.roles[0]"]).unwrap().is_empty());
        let got = resolve(&doc, &["$.roles['0']"]).unwrap();
        assert_eq!(got, ptrs(&["/roles/0"]));
    }

    #[test]
    fn queries_are_unioned() {
        let got = resolve(&person(), &["$.firstName", "$.age", "$.firstName"]).unwrap();
        assert_eq!(got, ptrs(&["/age", "/firstName"]));
    }

    #[test]
    fn missing_path_is_empty() {
        assert!(resolve(&person(), &["$.nope"]).unwrap().is_empty());
        assert!(resolve(&person(), &["$.firstName.inner"]).unwrap().is_empty());
    }

    #[test]
    fn wildcard_on_non_array_is_empty() {
        assert!(resolve(&person(), &["$.firstName[*]"]).unwrap().is_empty());
        assert!(resolve(&person(), &["$.meta[*]"]).unwrap().is_empty());
    }

    #[test]
    fn empty_containers_are_selectable_leaves() {
        let got = resolve(&person(), &["$.tags", "$.meta"]).unwrap();
        assert_eq!(got, ptrs(&["/meta", "/tags"]));
    }

    #[test]
    fn root_query_selects_every_leaf() {
        let doc = person();
        let all: BTreeSet<Pointer> = sdj_core::canonicalize(&doc)
            .unwrap()
            .pointers()
            .cloned()
            .collect();
        assert_eq!(resolve(&doc, &["$"]).unwrap(), all);
    }

    #[test]
    fn empty_request_is_empty() {
        let none: [&str; 0] = [];
        assert!(resolve(&person(), &none).unwrap().is_empty());
    }

    #[test]
    fn malformed_query_fails_whole_request() {
        let err = resolve(&person(), &["$.firstName", "$[?(@.age > 1)]"]).unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }
}
