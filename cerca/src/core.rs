use std::sync::Arc;
use std::time::Duration;

use cerca_core::{
    BreakerConfig, CacheConfig, CacheStore, CercaError, CircuitBreaker, ExchangeCandidates,
    MemoryCache, ResolverConfig, RetryConfig, SourceConnector, SourceError,
};

/// A connector paired with the breaker guarding it. The breaker is shared by
/// every engine that talks to this source.
pub(crate) struct GuardedSource {
    pub(crate) connector: Arc<dyn SourceConnector>,
    pub(crate) breaker: CircuitBreaker,
}

/// Orchestrator for ISIN resolution, quotes, and batch fan-out.
///
/// Cache and breakers are owned here and injected into the engines; there is
/// no process-wide state, so two `Cerca` instances are fully isolated (which
/// is also what makes the engine tests repeatable).
pub struct Cerca {
    pub(crate) primary: GuardedSource,
    pub(crate) secondary: Option<GuardedSource>,
    pub(crate) cache: Arc<dyn CacheStore>,
    pub(crate) cfg: ResolverConfig,
}

/// Builder for constructing a `Cerca` orchestrator with custom configuration.
pub struct CercaBuilder {
    primary: Option<Arc<dyn SourceConnector>>,
    secondary: Option<Arc<dyn SourceConnector>>,
    cache: Option<Arc<dyn CacheStore>>,
    cfg: ResolverConfig,
}

impl Default for CercaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CercaBuilder {
    /// Create a new builder with default configuration and no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            primary: None,
            secondary: None,
            cache: None,
            cfg: ResolverConfig::default(),
        }
    }

    /// Register the primary source. Required; must support both ISIN lookup
    /// and quotes.
    #[must_use]
    pub fn with_primary(mut self, connector: Arc<dyn SourceConnector>) -> Self {
        self.primary = Some(connector);
        self
    }

    /// Register the fallback directory source. Optional; consulted only when
    /// the primary exhausts its exchange candidates or its breaker is open.
    #[must_use]
    pub fn with_secondary(mut self, connector: Arc<dyn SourceConnector>) -> Self {
        self.secondary = Some(connector);
        self
    }

    /// Inject a cache backend. Defaults to the bundled in-memory store sized
    /// by [`CercaBuilder::cache_config`].
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the exchange candidate priority list.
    #[must_use]
    pub fn candidates(mut self, candidates: ExchangeCandidates) -> Self {
        self.cfg.candidates = candidates;
        self
    }

    /// Override cache TTLs and capacity.
    #[must_use]
    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cfg.cache = cache;
        self
    }

    /// Override the per-source breaker tuning.
    #[must_use]
    pub fn breaker_config(mut self, breaker: BreakerConfig) -> Self {
        self.cfg.breaker = breaker;
        self
    }

    /// Override the transient retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.cfg.retry = retry;
        self
    }

    /// Cap concurrent in-flight items during batch fan-out.
    #[must_use]
    pub const fn batch_concurrency(mut self, cap: usize) -> Self {
        self.cfg.batch_concurrency = cap;
        self
    }

    /// Bound each individual upstream call.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Bound a whole batch request. Items cut off by the deadline report a
    /// per-item transient error instead of failing the batch.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Build the `Cerca` orchestrator.
    ///
    /// # Errors
    /// Returns an error when no primary source is registered, when the
    /// primary lacks ISIN-lookup or quote capability, or when a secondary is
    /// registered without ISIN-lookup capability.
    pub fn build(self) -> Result<Cerca, CercaError> {
        let primary = self.primary.ok_or_else(|| {
            CercaError::internal("no primary source registered; add one via with_primary(...)")
        })?;
        if primary.as_isin_lookup().is_none() {
            return Err(CercaError::internal(format!(
                "primary source {} does not support ISIN lookup",
                primary.name()
            )));
        }
        if primary.as_quote_lookup().is_none() {
            return Err(CercaError::internal(format!(
                "primary source {} does not support quotes",
                primary.name()
            )));
        }
        if let Some(secondary) = &self.secondary
            && secondary.as_isin_lookup().is_none()
        {
            return Err(CercaError::internal(format!(
                "secondary source {} does not support ISIN lookup",
                secondary.name()
            )));
        }

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new(&self.cfg.cache)));

        let guard = |connector: Arc<dyn SourceConnector>| {
            let breaker = CircuitBreaker::new(connector.name(), self.cfg.breaker.clone());
            GuardedSource { connector, breaker }
        };

        Ok(Cerca {
            primary: guard(primary),
            secondary: self.secondary.map(guard),
            cache,
            cfg: self.cfg,
        })
    }
}

impl Cerca {
    /// Start building a new `Cerca` instance.
    #[must_use]
    pub fn builder() -> CercaBuilder {
        CercaBuilder::new()
    }

    /// Run one upstream call with the per-call timeout and the bounded
    /// transient retry policy. Timeouts count as transient failures.
    /// Retries never touch the breaker: that budget is reserved for
    /// access-denied outcomes.
    pub(crate) async fn call_with_retry<T, F, Fut>(
        &self,
        source_name: &str,
        call: F,
    ) -> Result<T, SourceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0u32;
        loop {
            let res = match tokio::time::timeout(self.cfg.provider_timeout, call()).await {
                Ok(res) => res,
                Err(_) => Err(SourceError::transient(source_name, "call timed out")),
            };
            match res {
                Err(SourceError::Transient { source, msg })
                    if attempt < self.cfg.retry.max_transient_retries =>
                {
                    attempt += 1;
                    tracing::debug!(
                        source = %source,
                        attempt,
                        msg = %msg,
                        "retrying transient source failure"
                    );
                    tokio::time::sleep(self.cfg.retry.backoff).await;
                }
                other => return other,
            }
        }
    }
}
