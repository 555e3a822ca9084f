//! # Query Parser
//!
//! Recursive descent over the query text. The accepted grammar:
//!
//! ```text
//! query     := '$' step*
//! step      := '.' name
//!            | '[' quoted ']'
//!            | '[' digits ']'
//!            | '[' '*' ']'
//!            | '[?(' predicate ')]'
//! predicate := '@' ('.' name)+ ('==' | '===') literal
//! literal   := quoted | number | 'true' | 'false' | 'null'
//! ```
//!
//! Whitespace is allowed around the comparator and the literal inside a
//! filter, nowhere else. Error positions are byte offsets into the query.

use serde_json::Value;

use crate::ast::{Comparator, PathQuery, Predicate, Step};
use crate::error::QueryError;

/// Parse one query string.
///
/// # Errors
///
/// `QueryError::Malformed` if the text is not in the grammar.
pub fn parse(query: &str) -> Result<PathQuery, QueryError> {
    let mut parser = Parser { src: query, pos: 0 };
    let steps = parser.query()?;
    Ok(PathQuery {
        source: query.to_string(),
        steps,
    })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn query(&mut self) -> Result<Vec<Step>, QueryError> {
        self.expect('$')?;
        let mut steps = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    if self.peek() == Some('*') {
                        return Err(self.error("member wildcard `.*` is not supported; use `[*]`"));
                    }
                    steps.push(Step::Field(self.name()?));
                }
                '[' => {
                    self.bump();
                    steps.push(self.bracket()?);
                }
                other => return Err(self.error(format!("unexpected character {other:?}"))),
            }
        }
        Ok(steps)
    }

    /// Everything after an opening `[`, through the closing `]`.
    fn bracket(&mut self) -> Result<Step, QueryError> {
        let step = match self.peek() {
            Some('*') => {
                self.bump();
                Step::Wildcard
            }
            Some('?') => {
                self.bump();
                self.expect('(')?;
                let predicate = self.predicate()?;
                self.skip_ws();
                self.expect(')')?;
                Step::Filter(predicate)
            }
            Some('\'') | Some('"') => Step::Field(self.quoted()?),
            Some(c) if c.is_ascii_digit() => Step::Index(self.index()?),
            Some(other) => {
                return Err(self.error(format!("unexpected character {other:?} in brackets")))
            }
            None => return Err(self.error("unexpected end of query")),
        };
        self.expect(']')?;
        Ok(step)
    }

    fn predicate(&mut self) -> Result<Predicate, QueryError> {
        self.expect('@')?;
        let mut path = Vec::new();
        while self.peek() == Some('.') {
            self.bump();
            path.push(self.name()?);
        }
        if path.is_empty() {
            return Err(self.error("filter must name a field of `@`"));
        }
        self.skip_ws();
        let comparator = self.comparator()?;
        self.skip_ws();
        let literal = self.literal()?;
        Ok(Predicate {
            path,
            comparator,
            literal,
        })
    }

    fn comparator(&mut self) -> Result<Comparator, QueryError> {
        let rest = self.rest();
        if rest.starts_with("===") {
            self.pos += 3;
            Ok(Comparator::Equal)
        } else if rest.starts_with("==") {
            self.pos += 2;
            Ok(Comparator::Equal)
        } else if ["!=", "<", ">"].iter().any(|op| rest.starts_with(op)) {
            Err(self.error("only equality comparisons are supported"))
        } else {
            Err(self.error("expected `==` or `===`"))
        }
    }

    fn literal(&mut self) -> Result<Value, QueryError> {
        match self.peek() {
            Some('\'') | Some('"') => Ok(Value::String(self.quoted()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => {
                for (word, value) in [
                    ("true", Value::Bool(true)),
                    ("false", Value::Bool(false)),
                    ("null", Value::Null),
                ] {
                    if self.rest().starts_with(word) {
                        self.pos += word.len();
                        return Ok(value);
                    }
                }
                Err(self.error("expected a string, number, boolean or null literal"))
            }
            None => Err(self.error("unexpected end of query")),
        }
    }

    fn number(&mut self) -> Result<Value, QueryError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let text = &self.src[start..start + len];
        match serde_json::from_str::<serde_json::Number>(text) {
            Ok(n) => {
                self.pos += len;
                Ok(Value::Number(n))
            }
            Err(_) => Err(self.error(format!("invalid number literal {text:?}"))),
        }
    }

    /// A single- or double-quoted string. `\` escapes the next character.
    fn quoted(&mut self) -> Result<String, QueryError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(QueryError::malformed(self.src, start, "unterminated string"))
    }

    fn index(&mut self) -> Result<usize, QueryError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest().len());
        let digits = &self.src[start..start + len];
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(self.error("array index has a leading zero"));
        }
        let index = digits
            .parse::<usize>()
            .map_err(|_| self.error("array index out of range"))?;
        self.pos += len;
        Ok(index)
    }

    /// An unquoted member name: runs until a structural character.
    fn name(&mut self) -> Result<String, QueryError> {
        let len = self
            .rest()
            .find(is_name_terminator)
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a member name"));
        }
        let name = self.rest()[..len].to_string();
        self.pos += len;
        Ok(name)
    }

    fn expect(&mut self, want: char) -> Result<(), QueryError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {want:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {want:?}, found end of query"))),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: impl Into<String>) -> QueryError {
        QueryError::malformed(self.src, self.pos, reason)
    }
}

fn is_name_terminator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | '[' | ']' | '(' | ')' | '=' | '!' | '<' | '>' | '\'' | '"' | '*' | '@' | '$'
        )
}
