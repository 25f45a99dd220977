use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use cerca::{
    ExchangeCandidate, InstrumentRecord, Isin, IsinLookupProvider, QuoteLookupProvider,
    QuoteRecord, SourceConnector, SourceError,
};
use cerca_mock::{MockBehavior, MockSource, quote_fixture, record};

use crate::helpers::{AAPL_ISIN, MSFT_ISIN, fast_builder, us_only};

#[tokio::test]
async fn mixed_batch_partitions_outcomes_exactly_once() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup(AAPL_ISIN, None, MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;
    ctl.set_lookup(MSFT_ISIN, None, MockBehavior::Return(record(MSFT_ISIN, "MSFT")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let report = cerca
        .search_batch(&[
            AAPL_ISIN.to_string(),
            "INVALID123".to_string(),
            MSFT_ISIN.to_string(),
        ])
        .await;

    assert_eq!(report.results.len() + report.errors.len(), 3);
    let mut symbols: Vec<_> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    symbols.sort_unstable();
    assert_eq!(symbols, ["AAPL", "MSFT"]);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].isin, "INVALID123");
    assert_eq!(report.errors[0].error.kind(), "validation_error");
}

#[tokio::test]
async fn one_failing_item_never_taints_the_others() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_quote("AAPL", MockBehavior::Return(quote_fixture("AAPL", "190.10")))
        .await;
    ctl.set_quote(
        "MSFT",
        MockBehavior::Fail(SourceError::transient("primary", "connection reset")),
    )
    .await;
    ctl.set_quote("NVDA", MockBehavior::Return(quote_fixture("NVDA", "1000.00")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let report = cerca
        .quote_batch(&["AAPL".to_string(), "MSFT".to_string(), "NVDA".to_string()])
        .await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].symbol, "MSFT");
    assert_eq!(report.errors[0].error.kind(), "transient_error");
}

#[tokio::test]
async fn batch_report_serializes_to_the_wire_contract() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup(AAPL_ISIN, None, MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let report = cerca
        .search_batch(&[AAPL_ISIN.to_string(), "BOGUS".to_string()])
        .await;
    let v = serde_json::to_value(&report).unwrap();

    assert!(v["results"].is_array());
    assert!(v["errors"].is_array());
    assert_eq!(v["results"][0]["isin"], AAPL_ISIN);
    assert_eq!(v["results"][0]["type"], "stock");
    assert_eq!(v["errors"][0]["isin"], "BOGUS");
}

/// Source that tracks the maximum number of concurrently in-flight calls.
struct GaugeSource {
    in_flight: AtomicUsize,
    max_seen: AtomicUsize,
}

impl GaugeSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        })
    }

    async fn observe_call(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SourceConnector for GaugeSource {
    fn name(&self) -> &'static str {
        "gauge"
    }

    fn vendor(&self) -> &'static str {
        "Test"
    }

    fn as_isin_lookup(&self) -> Option<&dyn IsinLookupProvider> {
        Some(self as &dyn IsinLookupProvider)
    }

    fn as_quote_lookup(&self) -> Option<&dyn QuoteLookupProvider> {
        Some(self as &dyn QuoteLookupProvider)
    }
}

#[async_trait]
impl IsinLookupProvider for GaugeSource {
    async fn lookup_by_isin(
        &self,
        isin: &Isin,
        _candidate: Option<&ExchangeCandidate>,
    ) -> Result<InstrumentRecord, SourceError> {
        self.observe_call().await;
        Err(SourceError::not_found(format!("instrument for {isin}")))
    }
}

#[async_trait]
impl QuoteLookupProvider for GaugeSource {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord, SourceError> {
        self.observe_call().await;
        Ok(QuoteRecord {
            symbol: symbol.to_string(),
            price: Decimal::ONE,
            currency: "USD".to_string(),
            time: Utc::now(),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_respects_the_concurrency_cap() {
    let gauge = GaugeSource::new();

    let cerca = fast_builder()
        .with_primary(gauge.clone())
        .candidates(us_only())
        .batch_concurrency(3)
        .build()
        .unwrap();

    let symbols: Vec<String> = (0..12).map(|i| format!("SYM{i}")).collect();
    let report = cerca.quote_batch(&symbols).await;

    assert_eq!(report.results.len(), 12);
    let max = gauge.max_seen.load(Ordering::SeqCst);
    assert!(max <= 3, "cap exceeded: {max} in flight");
    assert!(max >= 2, "fan-out did not overlap at all");
}

#[tokio::test]
async fn batch_deadline_reports_per_item_transients() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_quote("AAPL", MockBehavior::Hang).await;
    ctl.set_quote("MSFT", MockBehavior::Hang).await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .provider_timeout(Duration::from_secs(10))
        .request_timeout(Duration::from_millis(80))
        .build()
        .unwrap();

    let report = cerca
        .quote_batch(&["AAPL".to_string(), "MSFT".to_string()])
        .await;

    assert!(report.results.is_empty());
    assert_eq!(report.errors.len(), 2);
    for item in &report.errors {
        assert_eq!(item.error.kind(), "transient_error");
    }
}
