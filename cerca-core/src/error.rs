use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the cerca workspace.
///
/// Every failure a caller can observe maps to exactly one variant, so the
/// embedding layer (HTTP, batch aggregation) can report the correct per-item
/// outcome without string matching.
// NOTE: `Error` is implemented by hand rather than via `#[derive(Error)]`
// because several variants carry a field literally named `source` that holds a
// logical *source name* (a `String`), not an error cause. thiserror
// unconditionally treats a field named `source` as the error's `source()` and
// requires it to implement `std::error::Error`, which a `String` does not. The
// hand-written `Display`/`Error` impls below reproduce the exact messages the
// `#[error(...)]` attributes would have generated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CercaError {
    /// The input is not a syntactically valid ISIN. Fails fast: no cache or
    /// network access has happened.
    InvalidIsin {
        /// The rejected input, as received.
        input: String,
        /// Human-readable description of the violated rule.
        reason: String,
    },

    /// The input is not a plausible ticker symbol.
    InvalidSymbol {
        /// The rejected input, as received.
        input: String,
    },

    /// Confirmed absence: every consulted source answered and had no data.
    NotFound {
        /// Description of the missing resource, e.g. "instrument for US0378331005".
        what: String,
    },

    /// The source's circuit breaker is open, or the source denied access.
    /// Distinct from `NotFound`: the instrument may well exist, retry later.
    SourceUnavailable {
        /// Logical source name, e.g. "cerca-yfinance".
        source: String,
        /// Milliseconds until the breaker cooldown elapses; 0 when unknown.
        reset_in_ms: u64,
    },

    /// Network-level failure that persisted through the bounded local retries.
    Transient {
        /// Logical source name that kept failing.
        source: String,
        /// Human-readable failure message.
        msg: String,
    },

    /// Unexpected failure in cache/breaker bookkeeping. Always surfaced.
    Internal(String),
}

impl std::fmt::Display for CercaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIsin { input, reason } => {
                write!(f, "invalid isin `{input}`: {reason}")
            }
            Self::InvalidSymbol { input } => write!(f, "invalid symbol `{input}`"),
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::SourceUnavailable {
                source,
                reset_in_ms,
            } => write!(f, "source unavailable: {source} (retry in {reset_in_ms}ms)"),
            Self::Transient { source, msg } => write!(f, "{source} transient failure: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CercaError {}

impl CercaError {
    /// Helper: build an `InvalidIsin` error.
    pub fn invalid_isin(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIsin {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `Transient` error with the source name and message.
    pub fn transient(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transient {
            source: source.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build an `Internal` error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for the benign confirmed-absence outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Stable discriminant string used by embedding layers for per-item
    /// outcome reporting.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIsin { .. } | Self::InvalidSymbol { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::Transient { .. } => "transient_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Outcome classification for a single upstream call, as seen by the engines.
///
/// Adapters translate every upstream-specific failure into one of these three
/// cases. The distinction is load-bearing: `NotFound` means "try the next
/// fallback", `Blocked` must be reported to the circuit breaker and aborts the
/// current source, and `Transient` may be retried a bounded number of times
/// without touching the breaker.
// `Error` is hand-implemented here for the same reason as `CercaError`: the
// `source` field is a logical source name, not a nested error cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// This source has no data for this input.
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// Access denied (HTTP 401/403/429 or a provider-level block).
    Blocked {
        /// Logical source name that issued the denial.
        source: String,
    },

    /// Network or timeout failure; safe to retry against the same source.
    Transient {
        /// Logical source name that failed.
        source: String,
        /// Human-readable failure message.
        msg: String,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::Blocked { source } => write!(f, "{source} denied access"),
            Self::Transient { source, msg } => write!(f, "{source} transient failure: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Helper: build a `NotFound` outcome.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `Blocked` outcome for a source name.
    pub fn blocked(source: impl Into<String>) -> Self {
        Self::Blocked {
            source: source.into(),
        }
    }

    /// Helper: build a `Transient` outcome with the source name and message.
    pub fn transient(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transient {
            source: source.into(),
            msg: msg.into(),
        }
    }
}

impl From<SourceError> for CercaError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound { what } => Self::NotFound { what },
            SourceError::Blocked { source } => Self::SourceUnavailable {
                source,
                reset_in_ms: 0,
            },
            SourceError::Transient { source, msg } => Self::Transient { source, msg },
        }
    }
}

/// Failure of the cache backend itself (connection lost, protocol error).
///
/// The engines treat this as a miss/no-op: caching is an optimization, never
/// a correctness dependency.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cache backend unavailable: {0}")]
pub struct CacheError(pub String);
