use cerca_core::{CercaError, QuoteRecord, SourceError};

use crate::core::Cerca;

/// Symbols the upstream can plausibly serve: ticker body plus the suffix and
/// class separators seen in the wild (`RR.L`, `BTC-USD`, `BRK-B`, `^GSPC`).
fn validate_symbol(input: &str) -> Result<&str, CercaError> {
    let s = input.trim();
    let ok = !s.is_empty()
        && s.len() <= 24
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'^' | b'='));
    if ok {
        Ok(s)
    } else {
        Err(CercaError::InvalidSymbol {
            input: input.to_string(),
        })
    }
}

impl Cerca {
    /// Fetch the current quote for a ticker symbol from the primary source.
    ///
    /// Quotes are never cached: price data is time-sensitive and a cache
    /// would serve stale prices as current. The call still shares the
    /// primary source's circuit breaker with the resolution engine.
    ///
    /// # Errors
    /// - `InvalidSymbol`: implausible input; nothing was called.
    /// - `SourceUnavailable`: the primary breaker is open or the source
    ///   denied access. Distinct from `NotFound`: the instrument may exist.
    /// - `NotFound`: the source has no usable price for this symbol.
    /// - `Transient`: network failures persisted through the retry budget.
    /// - `Internal`: breaker bookkeeping failed.
    pub async fn quote(&self, symbol: &str) -> Result<QuoteRecord, CercaError> {
        let sym = validate_symbol(symbol)?;
        self.primary.breaker.check()?;
        let name = self.primary.connector.name();
        let provider = self.primary.connector.as_quote_lookup().ok_or_else(|| {
            CercaError::internal(format!("source {name} lost quote capability"))
        })?;

        match self.call_with_retry(name, || provider.quote(sym)).await {
            Ok(quote) => {
                self.primary.breaker.record_success()?;
                tracing::debug!(symbol = sym, price = %quote.price, "quote fetched");
                Ok(quote)
            }
            Err(SourceError::NotFound { what }) => {
                self.primary.breaker.record_success()?;
                Err(CercaError::NotFound { what })
            }
            Err(SourceError::Blocked { source }) => {
                self.primary.breaker.record_blocked()?;
                tracing::warn!(symbol = sym, source = %source, "quote source denied access");
                Err(CercaError::SourceUnavailable {
                    source,
                    reset_in_ms: 0,
                })
            }
            Err(err @ SourceError::Transient { .. }) => Err(err.into()),
        }
    }
}
