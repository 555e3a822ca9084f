use thiserror::Error;

/// Error while parsing a disclosure query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query does not match the supported grammar.
    #[error("malformed query {query:?} at byte {position}: {reason}")]
    Malformed {
        /// The query as given.
        query: String,
        /// Byte offset where parsing stopped.
        position: usize,
        /// What the parser expected.
        reason: String,
    },

    /// The request names more queries than the configured limit.
    #[error("disclosure request has {count} queries, limit is {limit}")]
    TooManyQueries {
        /// Queries in the request.
        count: usize,
        /// Configured maximum.
        limit: usize,
    },
}

impl QueryError {
    pub(crate) fn malformed(query: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            query: query.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
