//! cerca-mock
//!
//! Scriptable mock source connector for tests. Behavior is driven from the
//! outside through a controller handle: tests script per-input outcomes
//! (return, fail, hang) and assert on the recorded call log afterwards, so
//! engine tests can verify not only *what* came back but *which* upstream
//! calls were made, and which were not.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use cerca_core::connector::{IsinLookupProvider, QuoteLookupProvider, SourceConnector};
use cerca_core::{
    ExchangeCandidate, InstrumentRecord, InstrumentType, Isin, QuoteRecord, SourceError,
};

/// Instruction for how a method should behave for a given input.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided outcome.
    Fail(SourceError),
    /// Hang indefinitely (simulate a stalled upstream; pair with a timeout).
    Hang,
}

type LookupKey = (String, Option<String>);

#[derive(Default)]
struct InternalState {
    lookup_rules: HashMap<LookupKey, MockBehavior<InstrumentRecord>>,
    lookup_default: Option<MockBehavior<InstrumentRecord>>,
    quote_rules: HashMap<String, VecDeque<MockBehavior<QuoteRecord>>>,
    lookup_log: Vec<LookupKey>,
    quote_log: Vec<String>,
}

/// Mock source connector. Defaults to `NotFound` for every input until the
/// controller scripts something else.
pub struct MockSource {
    name: &'static str,
    quotes_enabled: bool,
    state: Arc<Mutex<InternalState>>,
}

/// Controller handle used by tests to drive a [`MockSource`] from the outside.
pub struct MockSourceController {
    state: Arc<Mutex<InternalState>>,
}

impl MockSource {
    /// Build a full-capability mock source plus its controller.
    #[must_use]
    pub fn new(name: &'static str) -> (Arc<Self>, MockSourceController) {
        Self::build(name, true)
    }

    /// Build a resolution-only mock (no quote capability), matching the shape
    /// of a directory-style fallback source.
    #[must_use]
    pub fn resolution_only(name: &'static str) -> (Arc<Self>, MockSourceController) {
        Self::build(name, false)
    }

    fn build(name: &'static str, quotes_enabled: bool) -> (Arc<Self>, MockSourceController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let source = Arc::new(Self {
            name,
            quotes_enabled,
            state: Arc::clone(&state),
        });
        (source, MockSourceController { state })
    }
}

impl MockSourceController {
    /// Script the outcome of `lookup_by_isin` for one (isin, suffix) pair.
    pub async fn set_lookup(
        &self,
        isin: &str,
        suffix: Option<&str>,
        behavior: MockBehavior<InstrumentRecord>,
    ) {
        let mut guard = self.state.lock().await;
        guard
            .lookup_rules
            .insert((isin.to_string(), suffix.map(str::to_string)), behavior);
    }

    /// Script the fallback outcome for lookups with no specific rule.
    pub async fn set_lookup_default(&self, behavior: MockBehavior<InstrumentRecord>) {
        let mut guard = self.state.lock().await;
        guard.lookup_default = Some(behavior);
    }

    /// Replace the scripted outcomes for `quote` calls on a symbol.
    pub async fn set_quote(&self, symbol: &str, behavior: MockBehavior<QuoteRecord>) {
        let mut guard = self.state.lock().await;
        guard
            .quote_rules
            .insert(symbol.to_string(), VecDeque::from([behavior]));
    }

    /// Append a scripted outcome for `quote` calls on a symbol. Outcomes are
    /// consumed in order; the last one repeats.
    pub async fn push_quote(&self, symbol: &str, behavior: MockBehavior<QuoteRecord>) {
        let mut guard = self.state.lock().await;
        guard
            .quote_rules
            .entry(symbol.to_string())
            .or_default()
            .push_back(behavior);
    }

    /// Every `lookup_by_isin` call observed so far, as (isin, suffix) pairs
    /// in call order.
    pub async fn lookup_log(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().await.lookup_log.clone()
    }

    /// Total `lookup_by_isin` calls observed.
    pub async fn lookup_calls(&self) -> usize {
        self.state.lock().await.lookup_log.len()
    }

    /// Every `quote` call observed so far, in call order.
    pub async fn quote_log(&self) -> Vec<String> {
        self.state.lock().await.quote_log.clone()
    }

    /// `quote` calls observed for one symbol.
    pub async fn quote_calls(&self, symbol: &str) -> usize {
        self.state
            .lock()
            .await
            .quote_log
            .iter()
            .filter(|s| s.as_str() == symbol)
            .count()
    }
}

impl SourceConnector for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn as_isin_lookup(&self) -> Option<&dyn IsinLookupProvider> {
        Some(self as &dyn IsinLookupProvider)
    }

    fn as_quote_lookup(&self) -> Option<&dyn QuoteLookupProvider> {
        if self.quotes_enabled {
            Some(self as &dyn QuoteLookupProvider)
        } else {
            None
        }
    }
}

#[async_trait]
impl IsinLookupProvider for MockSource {
    async fn lookup_by_isin(
        &self,
        isin: &Isin,
        candidate: Option<&ExchangeCandidate>,
    ) -> Result<InstrumentRecord, SourceError> {
        let suffix = candidate.and_then(|c| c.suffix.clone());
        let key = (isin.as_str().to_string(), suffix);
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.lookup_log.push(key.clone());
            guard
                .lookup_rules
                .get(&key)
                .or(guard.lookup_default.as_ref())
                .cloned()
        };
        match behavior {
            Some(MockBehavior::Return(rec)) => Ok(rec),
            Some(MockBehavior::Fail(err)) => Err(err),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            None => Err(SourceError::not_found(format!("instrument for {isin}"))),
        }
    }
}

#[async_trait]
impl QuoteLookupProvider for MockSource {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord, SourceError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.quote_log.push(symbol.to_string());
            match guard.quote_rules.get_mut(symbol) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match behavior {
            Some(MockBehavior::Return(q)) => Ok(q),
            Some(MockBehavior::Fail(err)) => Err(err),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            None => Err(SourceError::not_found(format!("quote for {symbol}"))),
        }
    }
}

/// Build a plausible resolved record for tests without constructor noise.
///
/// # Panics
/// Panics on an invalid static test ISIN.
#[must_use]
pub fn record(isin: &str, symbol: &str) -> InstrumentRecord {
    InstrumentRecord {
        isin: Isin::parse(isin).expect("valid static test isin"),
        symbol: symbol.to_string(),
        name: format!("{symbol} Test Instrument"),
        kind: InstrumentType::Stock,
        currency: "USD".to_string(),
        exchange: "NASDAQ".to_string(),
    }
}

/// Build a quote record with only the price varying across tests.
///
/// # Panics
/// Panics on an unparsable static test price.
#[must_use]
pub fn quote_fixture(symbol: &str, price: &str) -> QuoteRecord {
    QuoteRecord {
        symbol: symbol.to_string(),
        price: price.parse::<Decimal>().expect("valid static test price"),
        currency: "USD".to_string(),
        time: Utc::now(),
    }
}
