//! Crate-wide typed error and the canonical retryability predicate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no proxy available")]
    NoProxyAvailable,

    #[error("circuit breaker for '{operation}' is open")]
    CircuitOpen { operation: String },

    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetryExhausted { attempts: u32, source: String },

    #[error("fallback '{kind}' failed: {reason}")]
    FallbackFailed { kind: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transform rule '{rule}' failed: {reason}")]
    Transform { rule: String, reason: String },

    #[error("validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,
}

/// Case-insensitive substring match against the canonical set of retryable
/// failure signatures. This is the single source of truth for retryability;
/// no per-call override exists.
pub fn is_retryable(message: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "timeout",
        "temporary",
        "connection refused",
        "no such host",
        "503",
        "502",
        "504",
        "429",
        "service unavailable",
    ];
    let lower = message.to_lowercase();
    PATTERNS.iter().any(|p| lower.contains(p))
}
