use std::time::Duration;

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::types::InstrumentRecord;

/// What a resolution lookup left behind in the cache.
///
/// Negative entries record a confirmed "not found" across every fallback
/// source, so repeated lookups for a delisted or mistyped ISIN stop hitting
/// the upstream until the (shorter) negative TTL elapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheEntry {
    /// A successful resolution.
    Found(InstrumentRecord),
    /// All sources confirmed absence.
    NegativeResult,
}

/// TTL key/value store contract.
///
/// Keys are namespaced by purpose (`isin:<ISIN>` for resolution results).
/// The contract is async because implementations may sit behind a network
/// protocol; callers treat any `CacheError` as a miss/no-op, so a backend
/// outage degrades latency and upstream load, never correctness.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live (non-expired) entry.
    ///
    /// # Errors
    /// `CacheError` when the backend is unreachable.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry with a per-entry time-to-live.
    ///
    /// # Errors
    /// `CacheError` when the backend is unreachable.
    async fn put(&self, key: String, entry: CacheEntry, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Stored {
    entry: CacheEntry,
    ttl: Duration,
}

struct PerEntryExpiry;

impl Expiry<String, Stored> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    // Overwrites carry their own TTL; a refreshed positive entry must not
    // inherit the short deadline of the negative entry it replaces.
    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bundled in-process cache backed by `moka`, with per-entry expiry so
/// positive and negative entries can carry different TTLs in one store.
pub struct MemoryCache {
    inner: Cache<String, Stored>,
}

impl MemoryCache {
    /// Build a cache bounded by `cfg.max_entries`.
    #[must_use]
    pub fn new(cfg: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(cfg.max_entries)
            .expire_after(PerEntryExpiry)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.inner.get(key).await.map(|s| s.entry))
    }

    async fn put(&self, key: String, entry: CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(key, Stored { entry, ttl }).await;
        Ok(())
    }
}
