//! cerca-yfinance
//!
//! Primary source connector implemented on top of the `yfinance-rs` client
//! library. Resolves ISINs through the provider's search endpoint, constrained
//! to one exchange candidate at a time, and serves point-in-time quotes.
#![warn(missing_docs)]

/// Adapter definitions and the production adapter backed by `yfinance-rs`.
pub mod adapter;

#[cfg(feature = "test-adapters")]
use std::sync::Arc;

#[cfg(feature = "test-adapters")]
use adapter::CloneArcAdapters;
use adapter::{RealAdapter, SOURCE_NAME, YfQuotes, YfSearch};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use cerca_core::connector::{IsinLookupProvider, QuoteLookupProvider, SourceConnector};
use cerca_core::{ExchangeCandidate, InstrumentRecord, InstrumentType, Isin, QuoteRecord, SourceError};

#[cfg(not(feature = "test-adapters"))]
type AdapterArc = std::sync::Arc<RealAdapter>;

#[cfg(feature = "test-adapters")]
type SearchAdapter = Arc<dyn YfSearch>;
#[cfg(not(feature = "test-adapters"))]
type SearchAdapter = AdapterArc;

#[cfg(feature = "test-adapters")]
type QuotesAdapter = Arc<dyn YfQuotes>;
#[cfg(not(feature = "test-adapters"))]
type QuotesAdapter = AdapterArc;

/// Public connector type. Production users will construct with
/// `YfConnector::new_default()`.
pub struct YfConnector {
    search: SearchAdapter,
    quotes: QuotesAdapter,
}

/// Exchange names keyed by the provider's symbol suffix, used when the
/// upstream omits the exchange field.
const EXCHANGE_MAP: &[(&str, &str)] = &[
    ("L", "London Stock Exchange"),
    ("DE", "Deutsche Börse"),
    ("PA", "Euronext Paris"),
    ("AS", "Euronext Amsterdam"),
    ("BR", "Euronext Brussels"),
    ("MI", "Borsa Italiana"),
    ("MC", "Bolsa de Madrid"),
    ("SW", "SIX Swiss Exchange"),
    ("TO", "Toronto Stock Exchange"),
    ("V", "TSX Venture Exchange"),
    ("AX", "Australian Securities Exchange"),
    ("HK", "Hong Kong Stock Exchange"),
    ("T", "Tokyo Stock Exchange"),
    ("SS", "Shanghai Stock Exchange"),
    ("SZ", "Shenzhen Stock Exchange"),
];

impl YfConnector {
    /// Build with a fresh `yfinance_rs::YfClient` inside.
    #[must_use]
    pub fn new_default() -> Self {
        let a = RealAdapter::new_default();
        Self::from_adapter(&a)
    }

    /// Build from an existing `yfinance_rs::YfClient`.
    #[must_use]
    pub fn new_with_client(client: yfinance_rs::YfClient) -> Self {
        let a = RealAdapter::new(client);
        Self::from_adapter(&a)
    }

    /// Build from a provided `reqwest::Client` by constructing a
    /// `yfinance_rs::YfClient`.
    ///
    /// Note: the provided client should enable a cookie store for the
    /// provider's auth/crumb flow.
    ///
    /// # Errors
    /// Returns a transient source error if the internal `YfClient` cannot be
    /// constructed from the provided HTTP client.
    pub fn try_new_with_reqwest_client(http: reqwest::Client) -> Result<Self, SourceError> {
        let yf = yfinance_rs::YfClient::builder()
            .custom_client(http)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36")
            .build()
            .map_err(|e| SourceError::transient(SOURCE_NAME, e.to_string()))?;
        Ok(Self::new_with_client(yf))
    }

    /// For tests/injection (requires the `test-adapters` feature).
    ///
    /// Accepts a borrowed adapter to avoid unnecessary moves.
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter<A: CloneArcAdapters + 'static>(adapter: &A) -> Self {
        Self {
            search: adapter.clone_arc_search(),
            quotes: adapter.clone_arc_quotes(),
        }
    }

    #[cfg(not(feature = "test-adapters"))]
    fn from_adapter(adapter: &RealAdapter) -> Self {
        let shared = std::sync::Arc::new(adapter.clone());
        Self {
            search: shared.clone(),
            quotes: shared,
        }
    }
}

/// Whether a provider symbol sits on the candidate exchange. A candidate
/// without a suffix means a bare US listing.
fn matches_candidate(symbol: &str, candidate: Option<&ExchangeCandidate>) -> bool {
    let Some(candidate) = candidate else {
        return true;
    };
    match &candidate.suffix {
        None => !symbol.contains('.'),
        Some(suffix) => symbol
            .strip_suffix(suffix.as_str())
            .is_some_and(|head| head.len() > 1 && head.ends_with('.')),
    }
}

/// Exchange display name from the symbol suffix, defaulting to the US tape.
fn exchange_name_for(symbol: &str) -> &'static str {
    if let Some((_, suffix)) = symbol.rsplit_once('.') {
        for (key, name) in EXCHANGE_MAP {
            if *key == suffix {
                return name;
            }
        }
        return "NYSE/NASDAQ";
    }
    "NYSE/NASDAQ"
}

/// Classify an instrument from the provider's asset kind plus a name
/// heuristic for ETFs filed under generic fund kinds.
fn classify(kind: paft::domain::AssetKind, name: &str) -> InstrumentType {
    let looks_like_etf = name.to_ascii_uppercase().contains("ETF");
    match kind {
        paft::domain::AssetKind::Equity => {
            if looks_like_etf {
                InstrumentType::Etf
            } else {
                InstrumentType::Stock
            }
        }
        paft::domain::AssetKind::Fund => {
            if looks_like_etf {
                InstrumentType::Etf
            } else {
                InstrumentType::Fund
            }
        }
        _ => {
            if looks_like_etf {
                InstrumentType::Etf
            } else {
                InstrumentType::Other
            }
        }
    }
}

impl SourceConnector for YfConnector {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn vendor(&self) -> &'static str {
        "Yahoo Finance"
    }

    fn as_isin_lookup(&self) -> Option<&dyn IsinLookupProvider> {
        Some(self as &dyn IsinLookupProvider)
    }

    fn as_quote_lookup(&self) -> Option<&dyn QuoteLookupProvider> {
        Some(self as &dyn QuoteLookupProvider)
    }
}

#[async_trait]
impl IsinLookupProvider for YfConnector {
    async fn lookup_by_isin(
        &self,
        isin: &Isin,
        candidate: Option<&ExchangeCandidate>,
    ) -> Result<InstrumentRecord, SourceError> {
        let response = self.search.search(isin.as_str()).await?;

        let hit = response
            .results
            .iter()
            .find(|r| {
                let sym = r.symbol.as_str();
                !sym.is_empty() && matches_candidate(sym, candidate)
            })
            .ok_or_else(|| SourceError::not_found(format!("instrument for {isin}")))?;

        let symbol = hit.symbol.as_str().to_string();
        let mut name = hit.name.clone().unwrap_or_default();
        let mut currency = String::new();
        let mut exchange = String::new();

        // Enrich from the quote endpoint; the search response alone often
        // lacks currency and a stable exchange label.
        let quotes = self.quotes.fetch(std::slice::from_ref(&symbol)).await?;
        if let Some(q) = quotes.first() {
            if name.is_empty()
                && let Some(short) = &q.shortname
            {
                name.clone_from(short);
            }
            if let Some(money) = &q.price {
                currency = money.currency().to_string();
            }
            if let Some(ex) = &q.exchange {
                exchange = ex.to_string();
            }
        }

        if name.is_empty() {
            name.clone_from(&symbol);
        }
        if currency.is_empty() {
            currency = "USD".to_string();
        }
        if exchange.is_empty() {
            exchange = candidate
                .map_or_else(
                    || exchange_name_for(&symbol).to_string(),
                    |c| c.exchange.clone(),
                );
        }

        tracing::debug!(%isin, symbol = %symbol, "resolved via provider search");

        Ok(InstrumentRecord {
            isin: isin.clone(),
            symbol,
            kind: classify(hit.kind, &name),
            name,
            currency,
            exchange,
        })
    }
}

#[async_trait]
impl QuoteLookupProvider for YfConnector {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord, SourceError> {
        let quotes = self.quotes.fetch(&[symbol.to_string()]).await?;
        let q = quotes
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::not_found(format!("quote for {symbol}")))?;

        let money = q
            .price
            .ok_or_else(|| SourceError::not_found(format!("no price data for {symbol}")))?;
        let price = money.amount().round_dp(4);
        if price <= Decimal::ZERO {
            return Err(SourceError::not_found(format!("no price data for {symbol}")));
        }

        Ok(QuoteRecord {
            symbol: symbol.to_string(),
            price,
            currency: money.currency().to_string(),
            time: Utc::now(),
        })
    }
}
