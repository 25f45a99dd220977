use async_trait::async_trait;

use crate::config::ExchangeCandidate;
use crate::error::SourceError;
use crate::types::{InstrumentRecord, Isin, QuoteRecord};

/// Focused role trait for sources that can resolve an ISIN to a record.
#[async_trait]
pub trait IsinLookupProvider: Send + Sync {
    /// Look up an instrument by ISIN, optionally constrained to one exchange
    /// candidate.
    ///
    /// With `Some(candidate)`, only a listing on that exchange counts as a
    /// hit; with `None`, any listing does. How the constraint is applied
    /// (suffix filter, venue parameter) is adapter-internal.
    ///
    /// # Errors
    /// `SourceError::NotFound` when this source has no matching listing;
    /// `Blocked` on access denial; `Transient` on network failure.
    async fn lookup_by_isin(
        &self,
        isin: &Isin,
        candidate: Option<&ExchangeCandidate>,
    ) -> Result<InstrumentRecord, SourceError>;
}

/// Focused role trait for sources that serve point-in-time quotes.
#[async_trait]
pub trait QuoteLookupProvider: Send + Sync {
    /// Fetch the current quote for a ticker symbol.
    ///
    /// # Errors
    /// `SourceError::NotFound` when the symbol is unknown or carries no
    /// usable price; `Blocked` on access denial; `Transient` on network
    /// failure.
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord, SourceError>;
}

/// An upstream data source. One implementation per provider.
///
/// Connectors advertise capabilities through the `as_*` accessors; an
/// orchestrator never downcasts. A resolution-only directory source simply
/// leaves `as_quote_lookup` at the default `None`.
pub trait SourceConnector: Send + Sync {
    /// Stable machine name, used for breaker attribution and logging.
    fn name(&self) -> &'static str;

    /// Human-readable vendor name.
    fn vendor(&self) -> &'static str;

    /// ISIN resolution capability, if supported.
    fn as_isin_lookup(&self) -> Option<&dyn IsinLookupProvider> {
        None
    }

    /// Quote capability, if supported.
    fn as_quote_lookup(&self) -> Option<&dyn QuoteLookupProvider> {
        None
    }
}
