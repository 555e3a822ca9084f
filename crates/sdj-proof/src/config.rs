//! Protocol engine configuration.
//!
//! Limits that bound the work a single call may do. Defaults suit
//! credential-sized documents. Override via environment variables or
//! explicit construction.

use std::time::Duration;

use sdj_core::DEFAULT_MAX_DEPTH;

/// Default bound on one suite call run through the worker.
pub const DEFAULT_CRYPTO_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum number of queries in one disclosure request.
pub const DEFAULT_MAX_QUERIES: usize = 256;

/// Limits applied by [`SelectiveDisclosure`](crate::SelectiveDisclosure)
/// and [`DisclosureWorker`](crate::DisclosureWorker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Maximum container nesting accepted by the canonicalizer.
    pub max_depth: usize,
    /// Upper bound on a single worker-run operation.
    pub crypto_timeout: Duration,
    /// Maximum number of queries in one disclosure request.
    pub max_queries: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            crypto_timeout: DEFAULT_CRYPTO_TIMEOUT,
            max_queries: DEFAULT_MAX_QUERIES,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SDJ_MAX_DEPTH` (default: 128)
    /// - `SDJ_CRYPTO_TIMEOUT_MS` (default: 30000)
    /// - `SDJ_MAX_QUERIES` (default: 256)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            max_depth: env_parse("SDJ_MAX_DEPTH", defaults.max_depth)?,
            crypto_timeout: Duration::from_millis(env_parse(
                "SDJ_CRYPTO_TIMEOUT_MS",
                defaults.crypto_timeout.as_millis() as u64,
            )?),
            max_queries: env_parse("SDJ_MAX_QUERIES", defaults.max_queries)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_depth",
                requirement: "must be at least 1",
            });
        }
        if self.crypto_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "crypto_timeout",
                requirement: "must be greater than zero",
            });
        }
        if self.max_queries == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_queries",
                requirement: "must be at least 1",
            });
        }
        Ok(())
    }
}

fn env_parse<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is set but does not parse.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// The parser's message.
        reason: String,
    },

    /// A limit parsed but would make every call fail.
    #[error("{field} {requirement}")]
    OutOfRange {
        /// The offending [`ProtocolConfig`] field.
        field: &'static str,
        /// What the field must satisfy.
        requirement: &'static str,
    },
}
