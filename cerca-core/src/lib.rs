//! cerca-core
//!
//! Core types, traits, and shared-state primitives for the cerca ecosystem.
//!
//! - `types`: domain data structures (validated ISINs, instrument and quote
//!   records).
//! - `error`: the public error taxonomy and the three-way adapter outcome.
//! - `connector`: the `SourceConnector` trait and capability provider traits.
//! - `cache`: the TTL key/value store contract plus the in-memory default.
//! - `breaker`: the per-source circuit breaker guarding abusive retry loops.
//! - `config`: tunables for the resolver, cache, breaker, and retry policy.
//!
//! Async runtime (Tokio)
//! ---------------------
//! This crate assumes the Tokio ecosystem as the async runtime: the cache
//! contract is async (backends may sit behind a network protocol) and the
//! connector traits are `async_trait` methods awaited from Tokio tasks.
//!
#![warn(missing_docs)]

/// Per-source circuit breaker state machine.
pub mod breaker;
/// Cache store contract and the bundled in-memory implementation.
pub mod cache;
/// Resolver, cache, breaker, and retry configuration.
pub mod config;
/// Connector capability traits and the primary `SourceConnector` interface.
pub mod connector;
/// Error taxonomy shared across the workspace.
pub mod error;
/// Batch report types forming the wire compatibility contract.
pub mod reports;
pub mod types;

pub use breaker::CircuitBreaker;
pub use cache::{CacheEntry, CacheStore, MemoryCache};
pub use config::{
    BreakerConfig, CacheConfig, ExchangeCandidate, ExchangeCandidates, ResolverConfig, RetryConfig,
};
pub use connector::{IsinLookupProvider, QuoteLookupProvider, SourceConnector};
pub use error::{CacheError, CercaError, SourceError};
pub use reports::{BatchQuoteReport, BatchSearchReport, QuoteErrorItem, SearchErrorItem};
pub use types::{InstrumentRecord, InstrumentType, Isin, QuoteRecord};
