//! # Query AST
//!
//! A disclosure query is parsed once into a [`PathQuery`]: the original text
//! plus a list of [`Step`]s applied left to right starting from the document
//! root.

use std::fmt;

use serde_json::Value;

/// One selector step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `.name` or `['name']`: an object member.
    Field(String),
    /// `[n]`: a single array element.
    Index(usize),
    /// `[*]`: every element of an array.
    Wildcard,
    /// `[?(@.field == literal)]`: children whose sub-field equals a literal.
    Filter(Predicate),
}

/// Comparison operators accepted inside a filter.
///
/// Only equality is supported. `==` and `===` are accepted as spellings of
/// the same strict comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Strict JSON equality.
    Equal,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Equal => f.write_str("=="),
        }
    }
}

/// A filter predicate: `@.<path> <comparator> <literal>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Member names below the candidate, outermost first. Never empty.
    pub path: Vec<String>,
    /// The comparison applied.
    pub comparator: Comparator,
    /// A JSON scalar.
    pub literal: Value,
}

impl Predicate {
    /// Evaluate the predicate against a filter candidate.
    ///
    /// A candidate that is not an object, or lacks the sub-field, does not
    /// match.
    pub fn matches(&self, candidate: &Value) -> bool {
        let mut current = candidate;
        for name in &self.path {
            match current.as_object().and_then(|obj| obj.get(name)) {
                Some(next) => current = next,
                None => return false,
            }
        }
        match self.comparator {
            Comparator::Equal => scalar_eq(current, &self.literal),
        }
    }
}

/// Numbers compare by value so `24` equals `24.0`; everything else uses
/// JSON equality.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}

/// A parsed disclosure query.
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    pub(crate) source: String,
    pub(crate) steps: Vec<Step>,
}

impl PathQuery {
    /// The query text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(path: &[&str], literal: Value) -> Predicate {
        Predicate {
            path: path.iter().map(|s| s.to_string()).collect(),
            comparator: Comparator::Equal,
            literal,
        }
    }

    #[test]
    fn matches_direct_field() {
        let p = eq(&["state"], json!("CA"));
        assert!(p.matches(&json!({"state": "CA", "postalCode": "1"})));
        assert!(!p.matches(&json!({"state": "NY"})));
    }

    #[test]
    fn missing_field_does_not_match() {
        let p = eq(&["state"], json!("CA"));
        assert!(!p.matches(&json!({"city": "LA"})));
        assert!(!p.matches(&json!("CA")));
        assert!(!p.matches(&json!([{"state": "CA"}])));
    }

    #[test]
    fn nested_path() {
        let p = eq(&["address", "state"], json!("CA"));
        assert!(p.matches(&json!({"address": {"state": "CA"}})));
        assert!(!p.matches(&json!({"address": "CA"})));
    }

    #[test]
    fn numbers_compare_by_value() {
        let p = eq(&["age"], json!(24));
        assert!(p.matches(&json!({"age": 24})));
        assert!(p.matches(&json!({"age": 24.0})));
        assert!(!p.matches(&json!({"age": "24"})));
    }

    #[test]
    fn null_and_bool_literals() {
        assert!(eq(&["x"], json!(null)).matches(&json!({"x": null})));
        assert!(eq(&["x"], json!(true)).matches(&json!({"x": true})));
        assert!(!eq(&["x"], json!(false)).matches(&json!({"x": null})));
    }

    #[test]
    fn large_integers_not_conflated() {
        let p = eq(&["n"], json!(9_007_199_254_740_993u64));
        assert!(!p.matches(&json!({"n": 9_007_199_254_740_992u64})));
    }
}
