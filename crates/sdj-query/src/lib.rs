//! # sdj-query: Disclosure Queries
//!
//! A holder says what to reveal with JSONPath-style queries:
//!
//! ```text
//! $.firstName
//! $.phoneNumbers[*]
//! $.addresses[0].postalCode
//! $['first name']
//! $[?(@.state == 'CA')].postalCode
//! ```
//!
//! Queries are parsed into a typed AST ([`PathQuery`]) and resolved against
//! a document to the set of leaf [`Pointer`](sdj_core::Pointer)s they
//! cover. A selected object or array contributes every leaf beneath it.
//!
//! Filters support equality only (`==` or `===`). Unknown paths resolve to
//! nothing; text outside the grammar is a [`QueryError`].

pub mod ast;
pub mod error;
pub mod parser;
pub mod resolve;

pub use ast::{Comparator, PathQuery, Predicate, Step};
pub use error::QueryError;
pub use parser::parse;
pub use resolve::{parse_all, resolve, resolve_parsed, select};
