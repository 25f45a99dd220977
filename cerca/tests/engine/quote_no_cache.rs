use rust_decimal::Decimal;

use cerca::CercaError;
use cerca_mock::{MockBehavior, MockSource, quote_fixture};

use crate::helpers::{fast_builder, us_only};

#[tokio::test]
async fn sequential_quotes_always_reach_the_adapter() {
    let (primary, ctl) = MockSource::new("primary");
    // Two scripted prices: if any caching interfered, the second call would
    // repeat the first price instead of observing the move.
    ctl.push_quote("AAPL", MockBehavior::Return(quote_fixture("AAPL", "190.10")))
        .await;
    ctl.push_quote("AAPL", MockBehavior::Return(quote_fixture("AAPL", "191.35")))
        .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let first = cerca.quote("AAPL").await.unwrap();
    let second = cerca.quote("AAPL").await.unwrap();

    assert_eq!(first.price, "190.10".parse::<Decimal>().unwrap());
    assert_eq!(second.price, "191.35".parse::<Decimal>().unwrap());
    assert_eq!(ctl.quote_calls("AAPL").await, 2);
}

#[tokio::test]
async fn invalid_symbol_fails_fast() {
    let (primary, ctl) = MockSource::new("primary");

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    for input in ["", "  ", "AAPL GOOG", "not/a/symbol"] {
        let err = cerca.quote(input).await.unwrap_err();
        assert!(matches!(err, CercaError::InvalidSymbol { .. }), "{input:?}: {err}");
    }
    assert_eq!(ctl.quote_log().await.len(), 0);
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let (primary, _ctl) = MockSource::new("primary");

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .build()
        .unwrap();

    let err = cerca.quote("ZZZZ").await.unwrap_err();
    assert!(matches!(err, CercaError::NotFound { .. }));
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn open_breaker_is_unavailable_not_not_found() {
    let (primary, ctl) = MockSource::new("primary");
    ctl.set_quote(
        "AAPL",
        MockBehavior::Fail(cerca::SourceError::blocked("primary")),
    )
    .await;

    let cerca = fast_builder()
        .with_primary(primary)
        .candidates(us_only())
        .breaker_config(cerca::BreakerConfig {
            failure_threshold: 1,
            cooldown: std::time::Duration::from_secs(60),
        })
        .build()
        .unwrap();

    let _ = cerca.quote("AAPL").await.unwrap_err();

    // The instrument may well exist; callers must see "try later".
    let err = cerca.quote("AAPL").await.unwrap_err();
    assert!(matches!(err, CercaError::SourceUnavailable { .. }));
    assert_eq!(err.kind(), "source_unavailable");
    assert_eq!(ctl.quote_calls("AAPL").await, 1);
}
