//! Configuration types shared across the orchestrator and connectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single exchange tried during ISIN resolution against the primary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeCandidate {
    /// Symbol suffix on the primary source (`"L"` for `RR.L`); `None` means
    /// a bare US listing without a suffix.
    pub suffix: Option<String>,
    /// Human-readable exchange name reported in resolved records.
    pub exchange: String,
}

impl ExchangeCandidate {
    /// Build a candidate from a suffix (or `None` for bare US symbols) and an
    /// exchange display name.
    pub fn new(suffix: Option<&str>, exchange: impl Into<String>) -> Self {
        Self {
            suffix: suffix.map(str::to_string),
            exchange: exchange.into(),
        }
    }
}

/// Ordered exchange priority list for ISIN resolution.
///
/// The order is part of the resolution contract: candidates are tried
/// strictly in sequence and the first hit wins. This is domain policy, so it
/// is configuration data rather than embedded logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeCandidates(Vec<ExchangeCandidate>);

impl ExchangeCandidates {
    /// Build a custom priority list. An empty list is valid and limits the
    /// primary source to a single unconstrained lookup.
    #[must_use]
    pub fn new(candidates: Vec<ExchangeCandidate>) -> Self {
        Self(candidates)
    }

    /// Iterate candidates in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExchangeCandidate> {
        self.0.iter()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ExchangeCandidates {
    /// Home-market exchanges before broader listings: US first, then the
    /// large European venues in decreasing listing coverage.
    fn default() -> Self {
        Self(vec![
            ExchangeCandidate::new(None, "NYSE/NASDAQ"),
            ExchangeCandidate::new(Some("L"), "London Stock Exchange"),
            ExchangeCandidate::new(Some("DE"), "Deutsche Börse"),
            ExchangeCandidate::new(Some("PA"), "Euronext Paris"),
            ExchangeCandidate::new(Some("AS"), "Euronext Amsterdam"),
            ExchangeCandidate::new(Some("MI"), "Borsa Italiana"),
            ExchangeCandidate::new(Some("SW"), "SIX Swiss Exchange"),
        ])
    }
}

impl<'a> IntoIterator for &'a ExchangeCandidates {
    type Item = &'a ExchangeCandidate;
    type IntoIter = std::slice::Iter<'a, ExchangeCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cache tuning for resolution results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for successfully resolved records.
    pub positive_ttl: Duration,
    /// Time-to-live for confirmed-absent markers. Kept shorter than
    /// `positive_ttl` so newly listed instruments become resolvable quickly.
    pub negative_ttl: Duration,
    /// Upper bound on cached entries before eviction.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_ttl: Duration::from_secs(24 * 60 * 60),
            negative_ttl: Duration::from_secs(15 * 60),
            max_entries: 10_000,
        }
    }
}

/// Circuit breaker tuning, applied per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive access-denied responses before the breaker opens.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before admitting one probe.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(10 * 60),
        }
    }
}

/// Bounded local retry policy for transient source failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first transient failure.
    pub max_transient_retries: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_transient_retries: 2,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Global configuration for the `Cerca` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Exchange priority list tried against the primary source.
    pub candidates: ExchangeCandidates,
    /// Cache TTLs and capacity.
    pub cache: CacheConfig,
    /// Per-source circuit breaker tuning.
    pub breaker: BreakerConfig,
    /// Transient retry policy.
    pub retry: RetryConfig,
    /// Concurrency cap for batch fan-out.
    pub batch_concurrency: usize,
    /// Timeout for an individual upstream call; elapsing counts as a
    /// transient failure for that call.
    pub provider_timeout: Duration,
    /// Optional overall deadline for a whole batch request. Items cut off by
    /// the deadline report a per-item transient error.
    pub request_timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            candidates: ExchangeCandidates::default(),
            cache: CacheConfig::default(),
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
            batch_concurrency: 8,
            provider_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}
