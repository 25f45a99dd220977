#[cfg(feature = "test-adapters")]
use std::sync::Arc;

use async_trait::async_trait;

use cerca_core::SourceError;
use paft::market::responses::search::SearchResponse;
use yfinance_rs as yf;

/// Source name reported to breakers and logs.
pub const SOURCE_NAME: &str = "cerca-yfinance";

/// Search abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait YfSearch: Send + Sync {
    /// Run a provider-native text search (ISINs are accepted as queries).
    async fn search(&self, query: &str) -> Result<SearchResponse, SourceError>;
}

/// Quotes abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait YfQuotes: Send + Sync {
    /// Fetch quotes for a batch of symbols.
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<yf::core::Quote>, SourceError>;
}

/// Real adapter backed by a single `YfClient` instance.
/// `YfClient` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone)]
pub struct RealAdapter {
    client: yf::YfClient,
}

impl RealAdapter {
    /// Build a default `YfClient` with a recommended user agent.
    ///
    /// # Panics
    /// Panics if building the underlying `YfClient` fails, which is
    /// unexpected in normal environments (invalid user agent configuration).
    #[must_use]
    pub fn new_default() -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .no_proxy()
            .build()
            .expect("Failed to build reqwest client for YfClient");
        Self {
            client: yf::YfClient::builder()
                .custom_client(http)
                .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36")
                .build()
                .expect("Failed to build YfClient with user agent"),
        }
    }

    /// Wrap an existing `YfClient`.
    #[must_use]
    pub const fn new(client: yf::YfClient) -> Self {
        Self { client }
    }
}

fn is_denied_status(status: impl std::fmt::Display) -> bool {
    let s = status.to_string();
    s.starts_with("401") || s.starts_with("403") || s.starts_with("429")
}

/// Map upstream errors onto the three-way outcome the engines route on.
/// Rate limiting and auth rejections count as denials: they are the signals
/// that precede an IP block, so they must feed the breaker.
fn map_yf_err(e: &yf::YfError, context: &str) -> SourceError {
    match e {
        yf::YfError::NotFound { .. } => SourceError::not_found(context.to_string()),
        yf::YfError::RateLimited { .. } => SourceError::blocked(SOURCE_NAME),
        yf::YfError::Status { status, .. } if is_denied_status(status) => {
            SourceError::blocked(SOURCE_NAME)
        }
        yf::YfError::Status { status, .. } => {
            SourceError::transient(SOURCE_NAME, format!("status {status}: {context}"))
        }
        yf::YfError::ServerError { status, .. } => {
            SourceError::transient(SOURCE_NAME, format!("server error {status}: {context}"))
        }
        other => SourceError::transient(SOURCE_NAME, format!("{other}: {context}")),
    }
}

#[async_trait]
impl YfSearch for RealAdapter {
    async fn search(&self, query: &str) -> Result<SearchResponse, SourceError> {
        yf::search::SearchBuilder::new(&self.client, query)
            .fetch()
            .await
            .map_err(|e| map_yf_err(&e, &format!("search for {query}")))
    }
}

#[async_trait]
impl YfQuotes for RealAdapter {
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<yf::core::Quote>, SourceError> {
        yf::quote::quotes(&self.client, symbols.iter().cloned())
            .await
            .map_err(|e| map_yf_err(&e, "quotes"))
    }
}

/// For tests/injection (requires the `test-adapters` feature): hand the
/// connector its role adapters as shared trait objects.
#[cfg(feature = "test-adapters")]
pub trait CloneArcAdapters {
    /// Shared handle to the search role.
    fn clone_arc_search(&self) -> Arc<dyn YfSearch>;
    /// Shared handle to the quotes role.
    fn clone_arc_quotes(&self) -> Arc<dyn YfQuotes>;
}

#[cfg(feature = "test-adapters")]
impl CloneArcAdapters for RealAdapter {
    fn clone_arc_search(&self) -> Arc<dyn YfSearch> {
        Arc::new(self.clone())
    }

    fn clone_arc_quotes(&self) -> Arc<dyn YfQuotes> {
        Arc::new(self.clone())
    }
}
