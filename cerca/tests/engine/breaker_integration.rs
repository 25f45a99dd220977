use std::time::Duration;

use cerca::{BreakerConfig, CercaError, SourceError};
use cerca_mock::{MockBehavior, MockSource, quote_fixture, record};

use crate::helpers::{AAPL_ISIN, MSFT_ISIN, fast_builder, us_only};

fn tight_breaker(threshold: u32, cooldown: Duration) -> BreakerConfig {
    BreakerConfig {
        failure_threshold: threshold,
        cooldown,
    }
}

#[tokio::test]
async fn breaker_opens_at_threshold_and_stops_all_traffic() {
    crate::helpers::init_tracing();
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup_default(MockBehavior::Fail(SourceError::blocked("primary")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .breaker_config(tight_breaker(2, Duration::from_secs(60)))
        .build()
        .unwrap();

    let _ = cerca.search(AAPL_ISIN).await.unwrap_err();
    let _ = cerca.search(MSFT_ISIN).await.unwrap_err();
    assert_eq!(ctl.lookup_calls().await, 2);

    // Open: rejections are immediate, with a cooldown hint, and no call
    // reaches the adapter.
    for _ in 0..5 {
        match cerca.search(AAPL_ISIN).await.unwrap_err() {
            CercaError::SourceUnavailable {
                source,
                reset_in_ms,
            } => {
                assert_eq!(source, "primary");
                assert!(reset_in_ms > 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ctl.lookup_calls().await, 2, "open breaker must reject before the adapter");
}

#[tokio::test]
async fn cooldown_admits_one_probe_which_can_close_the_breaker() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup_default(MockBehavior::Fail(SourceError::blocked("primary")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .breaker_config(tight_breaker(1, Duration::from_millis(40)))
        .build()
        .unwrap();

    let _ = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert_eq!(ctl.lookup_calls().await, 1);
    let _ = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert_eq!(ctl.lookup_calls().await, 1, "no probe before the cooldown elapses");

    tokio::time::sleep(Duration::from_millis(60)).await;

    // The upstream has forgotten us; the single admitted probe succeeds and
    // the breaker closes again.
    ctl.set_lookup_default(MockBehavior::Return(record(MSFT_ISIN, "MSFT")))
        .await;
    let resolved = cerca.search(MSFT_ISIN).await.unwrap();
    assert_eq!(resolved.symbol, "MSFT");
    assert_eq!(ctl.lookup_calls().await, 2);

    let resolved = cerca.search(AAPL_ISIN).await.unwrap();
    assert_eq!(resolved.symbol, "MSFT");
    assert_eq!(ctl.lookup_calls().await, 3, "closed breaker admits traffic again");
}

#[tokio::test]
async fn transient_failures_never_move_the_breaker() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup_default(MockBehavior::Fail(SourceError::transient(
        "primary",
        "connection reset by peer",
    )))
    .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .breaker_config(tight_breaker(1, Duration::from_secs(60)))
        .build()
        .unwrap();

    for _ in 0..4 {
        let err = cerca.search(AAPL_ISIN).await.unwrap_err();
        assert!(matches!(err, CercaError::Transient { .. }));
    }
    // Threshold is 1, yet the source is still being attempted: the failures
    // above did not count against the IP-protection budget.
    assert_eq!(ctl.lookup_calls().await, 4);

    ctl.set_lookup_default(MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;
    assert_eq!(cerca.search(AAPL_ISIN).await.unwrap().symbol, "AAPL");
}

#[tokio::test]
async fn transient_retry_budget_is_bounded() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup_default(MockBehavior::Fail(SourceError::transient(
        "primary",
        "upstream timeout",
    )))
    .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .retry(cerca::RetryConfig {
            max_transient_retries: 2,
            backoff: Duration::from_millis(1),
        })
        .build()
        .unwrap();

    let err = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert!(matches!(err, CercaError::Transient { .. }));
    assert_eq!(ctl.lookup_calls().await, 3, "one attempt plus two retries");
}

#[tokio::test]
async fn quote_and_resolution_share_the_primary_breaker() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_quote("AAPL", MockBehavior::Fail(SourceError::blocked("primary")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .breaker_config(tight_breaker(1, Duration::from_secs(60)))
        .build()
        .unwrap();

    // A blocked quote trips the shared breaker...
    let err = cerca.quote("AAPL").await.unwrap_err();
    assert!(matches!(err, CercaError::SourceUnavailable { .. }));

    // ...and resolution is locked out without reaching the adapter.
    let err = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert!(matches!(err, CercaError::SourceUnavailable { .. }));
    assert_eq!(ctl.lookup_calls().await, 0);
}

#[tokio::test]
async fn hung_upstream_times_out_as_transient() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_quote("AAPL", MockBehavior::Hang).await;
    ctl.set_quote("MSFT", MockBehavior::Return(quote_fixture("MSFT", "420.00")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = cerca.quote("AAPL").await.unwrap_err();
    assert!(matches!(err, CercaError::Transient { .. }));

    // The stall neither tripped the breaker nor wedged the engine.
    assert_eq!(cerca.quote("MSFT").await.unwrap().symbol, "MSFT");
    assert_eq!(ctl.quote_calls("MSFT").await, 1);
}
