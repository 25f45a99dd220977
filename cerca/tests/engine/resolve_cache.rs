use std::sync::Arc;
use std::time::Duration;

use cerca::{CacheConfig, CercaError};
use cerca_mock::{MockBehavior, MockSource, record};

use crate::helpers::{AAPL_ISIN, FailingCache, fast_builder, us_only};

#[tokio::test]
async fn positive_cache_hit_prevents_upstream_calls() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup(AAPL_ISIN, None, MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let first = cerca.search(AAPL_ISIN).await.unwrap();
    assert_eq!(ctl.lookup_calls().await, 1);

    let second = cerca.search(AAPL_ISIN).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(ctl.lookup_calls().await, 1, "second search must be served from cache");
}

#[tokio::test]
async fn negative_cache_short_circuits_repeat_misses() {
    let (primary, primary_ctl) = MockSource::new("primary");
    let (secondary, secondary_ctl) = MockSource::resolution_only("secondary");

    let cerca = fast_builder()
        .with_primary(primary)
        .with_secondary(secondary)
        .candidates(us_only())
        .build()
        .unwrap();

    let err = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(primary_ctl.lookup_calls().await, 1);
    assert_eq!(secondary_ctl.lookup_calls().await, 1);

    // Confirmed absence is cached: the retry is answered without any
    // upstream contact and still reports NotFound, not a generic failure.
    let err = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(primary_ctl.lookup_calls().await, 1);
    assert_eq!(secondary_ctl.lookup_calls().await, 1);
}

#[tokio::test]
async fn negative_entries_expire_before_positive_ones() {
    let (primary, ctl) = MockSource::new("primary");

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .cache_config(CacheConfig {
            positive_ttl: Duration::from_secs(3600),
            negative_ttl: Duration::from_millis(30),
            max_entries: 64,
        })
        .build()
        .unwrap();

    let _ = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert_eq!(ctl.lookup_calls().await, 1);

    tokio::time::sleep(Duration::from_millis(60)).await;

    // The negative marker has lapsed; the instrument is looked up afresh.
    ctl.set_lookup(AAPL_ISIN, None, MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;
    let resolved = cerca.search(AAPL_ISIN).await.unwrap();
    assert_eq!(resolved.symbol, "AAPL");
    assert_eq!(ctl.lookup_calls().await, 2);
}

#[tokio::test]
async fn unreachable_cache_degrades_to_upstream_lookups() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_lookup(AAPL_ISIN, None, MockBehavior::Return(record(AAPL_ISIN, "AAPL")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .with_cache(Arc::new(FailingCache))
        .candidates(us_only())
        .build()
        .unwrap();

    // Every search reaches the upstream, and none of them fail on account
    // of the dead cache backend.
    for expected_calls in 1..=3 {
        let record = cerca.search(AAPL_ISIN).await.unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(ctl.lookup_calls().await, expected_calls);
    }
}

#[tokio::test]
async fn cached_error_is_domain_not_found() {
    let (primary, _ctl) = MockSource::new("primary");

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let _ = cerca.search(AAPL_ISIN).await.unwrap_err();
    let err = cerca.search(AAPL_ISIN).await.unwrap_err();
    assert!(matches!(err, CercaError::NotFound { .. }));
    assert_eq!(err.kind(), "not_found");
}
