//! Cerca resolves ISIN codes to tradable ticker symbols and fetches live
//! quotes, surviving an upstream that intermittently blocks or rate-limits
//! callers.
//!
//! Overview
//! - Routes ISIN lookups through an ordered list of exchange candidates on
//!   the primary source, then falls back to a secondary directory source.
//! - Shields the upstream with a TTL cache (positive and negative entries)
//!   consulted before any network call.
//! - Guards each source with a circuit breaker that opens after repeated
//!   access-denied responses, protecting the caller's network identity.
//! - Fans out batch requests concurrently with a bounded cap, collecting
//!   partial successes and per-item errors independently.
//!
//! Key behaviors and trade-offs
//! - Resolution consults the cache first; a cached negative short-circuits to
//!   `NotFound` without touching the network. Quotes are deliberately never
//!   cached: serving a stale price as current is worse than the extra call.
//! - Only access-denied outcomes trip a breaker. Transient network failures
//!   are retried a bounded number of times and never burn the IP-protection
//!   budget; conflating the two would either trip breakers prematurely or
//!   hammer a source that is already blocking us.
//! - The primary source always wins when both could answer; the secondary
//!   exists purely for instruments outside the primary's exchange set.
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use cerca::Cerca;
//! use cerca_yfinance::YfConnector;
//! use cerca_justetf::JustEtfConnector;
//!
//! let cerca = Cerca::builder()
//!     .with_primary(Arc::new(YfConnector::new_default()))
//!     .with_secondary(Arc::new(JustEtfConnector::new_default()))
//!     .build()?;
//!
//! let record = cerca.search("IE00B4L5Y983").await?;
//! let quote = cerca.quote(&record.symbol).await?;
//! let report = cerca.search_batch(&["US0378331005".into()]).await;
//! ```
#![warn(missing_docs)]

mod batch;
mod core;
mod quote;
mod resolve;

pub use crate::core::{Cerca, CercaBuilder};
pub use cerca_core::{
    BatchQuoteReport, BatchSearchReport, BreakerConfig, CacheConfig, CacheEntry, CacheError,
    CacheStore, CercaError, ExchangeCandidate, ExchangeCandidates, InstrumentRecord,
    InstrumentType, Isin, IsinLookupProvider, MemoryCache, QuoteErrorItem, QuoteLookupProvider,
    QuoteRecord, ResolverConfig, RetryConfig, SearchErrorItem, SourceConnector, SourceError,
};
