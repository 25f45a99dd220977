use cerca_core::{
    CacheEntry, CercaError, ExchangeCandidate, InstrumentRecord, Isin, SourceError,
};

use crate::core::{Cerca, GuardedSource};

fn cache_key(isin: &Isin) -> String {
    format!("isin:{isin}")
}

impl Cerca {
    /// Resolve an ISIN to an instrument record.
    ///
    /// Order of consultation: syntactic validation, cache (positive or
    /// negative), primary source across the exchange candidate list, then
    /// the secondary directory source. A success from either source is
    /// written back to the cache; a confirmed absence from every source is
    /// negatively cached so repeated fruitless lookups stop hitting the
    /// upstream.
    ///
    /// # Errors
    /// - `InvalidIsin`: malformed input; no cache or network access happened.
    /// - `NotFound`: every consulted source confirmed absence.
    /// - `SourceUnavailable`: a breaker is open or a source denied access.
    /// - `Transient`: network failures persisted through the retry budget.
    /// - `Internal`: breaker bookkeeping failed.
    pub async fn search(&self, input: &str) -> Result<InstrumentRecord, CercaError> {
        let isin = Isin::parse(input)?;
        let key = cache_key(&isin);

        match self.cache.get(&key).await {
            Ok(Some(CacheEntry::Found(record))) => {
                tracing::debug!(%isin, symbol = %record.symbol, "cache hit");
                return Ok(record);
            }
            Ok(Some(CacheEntry::NegativeResult)) => {
                tracing::debug!(%isin, "negative cache hit");
                return Err(CercaError::not_found(format!("instrument for {isin}")));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%isin, error = %e, "cache read failed, treating as miss");
            }
        }

        let mut failures: Vec<CercaError> = Vec::new();

        let passes: Vec<Option<&ExchangeCandidate>> = if self.cfg.candidates.is_empty() {
            vec![None]
        } else {
            self.cfg.candidates.iter().map(Some).collect()
        };
        match self.resolve_via(&self.primary, &isin, &passes).await {
            Ok(record) => {
                self.store(&key, CacheEntry::Found(record.clone())).await;
                return Ok(record);
            }
            Err(e) => failures.push(e),
        }

        if let Some(secondary) = &self.secondary {
            match self.resolve_via(secondary, &isin, &[None]).await {
                Ok(record) => {
                    tracing::info!(%isin, symbol = %record.symbol, "resolved via fallback source");
                    self.store(&key, CacheEntry::Found(record.clone())).await;
                    return Ok(record);
                }
                Err(e) => failures.push(e),
            }
        }

        if failures.iter().all(CercaError::is_not_found) {
            self.store(&key, CacheEntry::NegativeResult).await;
            return Err(CercaError::not_found(format!("instrument for {isin}")));
        }

        // Mixed failures: an availability signal beats a transient one, so
        // callers see "try later" rather than a misleading network error.
        let pick = failures
            .iter()
            .find(|e| matches!(e, CercaError::SourceUnavailable { .. }))
            .or_else(|| {
                failures
                    .iter()
                    .find(|e| matches!(e, CercaError::Transient { .. }))
            })
            .or_else(|| failures.first());
        match pick {
            Some(err) => Err(err.clone()),
            None => Err(CercaError::internal("resolution produced no outcome")),
        }
    }

    /// Try one source across the given candidate passes, in strict order.
    ///
    /// The iteration continues only past `NotFound`: a blocked source must
    /// not be probed again within the same call, and a source that kept
    /// failing transiently has already consumed its retry budget.
    async fn resolve_via(
        &self,
        source: &GuardedSource,
        isin: &Isin,
        passes: &[Option<&ExchangeCandidate>],
    ) -> Result<InstrumentRecord, CercaError> {
        source.breaker.check()?;
        let name = source.connector.name();
        let provider = source.connector.as_isin_lookup().ok_or_else(|| {
            CercaError::internal(format!("source {name} lost ISIN lookup capability"))
        })?;

        for candidate in passes {
            match self
                .call_with_retry(name, || provider.lookup_by_isin(isin, *candidate))
                .await
            {
                Ok(record) => {
                    source.breaker.record_success()?;
                    return Ok(record);
                }
                Err(SourceError::NotFound { .. }) => {
                    // The source answered; keep the breaker closed and move
                    // on to the next candidate.
                    source.breaker.record_success()?;
                }
                Err(SourceError::Blocked { source: blocked }) => {
                    source.breaker.record_blocked()?;
                    tracing::warn!(%isin, source = %blocked, "source denied access, aborting attempt");
                    return Err(CercaError::SourceUnavailable {
                        source: blocked,
                        reset_in_ms: 0,
                    });
                }
                Err(err @ SourceError::Transient { .. }) => {
                    return Err(err.into());
                }
            }
        }

        Err(CercaError::not_found(format!("instrument for {isin}")))
    }

    /// Best-effort cache write; a failing backend costs latency, not
    /// correctness.
    async fn store(&self, key: &str, entry: CacheEntry) {
        let ttl = match entry {
            CacheEntry::Found(_) => self.cfg.cache.positive_ttl,
            CacheEntry::NegativeResult => self.cfg.cache.negative_ttl,
        };
        if let Err(e) = self.cache.put(key.to_string(), entry, ttl).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }
}
