//! cerca-justetf
//!
//! Fallback source connector backed by the justETF profile pages. Covers
//! European ETFs the primary source's exchange set misses. Resolution only:
//! the connector advertises no quote capability.
//!
//! The profile page is fetched by ISIN and mined for a ticker, an exchange,
//! and a currency; the exchange is mapped onto the primary source's symbol
//! suffix scheme so the resolved symbol is immediately tradable there.
#![warn(missing_docs)]

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use cerca_core::connector::{IsinLookupProvider, SourceConnector};
use cerca_core::{ExchangeCandidate, InstrumentRecord, InstrumentType, Isin, SourceError};

/// Source name reported to breakers and logs.
pub const SOURCE_NAME: &str = "cerca-justetf";

const DEFAULT_BASE_URL: &str = "https://www.justetf.com/en/etf-profile.html";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// justETF exchange labels mapped to the primary source's symbol suffixes.
/// Scanned in order; the first label present on the page wins.
const EXCHANGE_TO_SUFFIX: &[(&str, &str)] = &[
    ("XETRA", ".DE"),
    ("gettex", ".DE"),
    ("London Stock Exchange", ".L"),
    ("Euronext Paris", ".PA"),
    ("Euronext Amsterdam", ".AS"),
    ("Borsa Italiana", ".MI"),
    ("SIX Swiss Exchange", ".SW"),
];

static TICKER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)"ticker"\s*:\s*"([A-Z0-9]+)""#,
        r"(?i)Ticker[:\s]+([A-Z0-9]{2,10})\b",
        r#"(?i)data-ticker="([A-Z0-9]+)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static ticker pattern compiles"))
    .collect()
});

static CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(EUR|USD|GBP|CHF)\b").expect("static currency pattern compiles"));

/// Fallback connector scraping the justETF directory.
pub struct JustEtfConnector {
    http: reqwest::Client,
    base_url: String,
}

impl JustEtfConnector {
    /// Build with a fresh HTTP client and the production endpoint.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be constructed, which is unexpected
    /// in normal environments.
    #[must_use]
    pub fn new_default() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to build reqwest client for JustEtfConnector");
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build against a custom endpoint (tests point this at a local mock).
    #[must_use]
    pub fn new_with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl SourceConnector for JustEtfConnector {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn vendor(&self) -> &'static str {
        "justETF"
    }

    fn as_isin_lookup(&self) -> Option<&dyn IsinLookupProvider> {
        Some(self as &dyn IsinLookupProvider)
    }
}

#[async_trait]
impl IsinLookupProvider for JustEtfConnector {
    async fn lookup_by_isin(
        &self,
        isin: &Isin,
        _candidate: Option<&ExchangeCandidate>,
    ) -> Result<InstrumentRecord, SourceError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("isin", isin.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::transient(SOURCE_NAME, e.to_string()))?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403 | 429) {
            tracing::warn!(%isin, status = status.as_u16(), "directory denied access");
            return Err(SourceError::blocked(SOURCE_NAME));
        }
        if status.as_u16() == 404 {
            return Err(SourceError::not_found(format!("instrument for {isin}")));
        }
        if !status.is_success() {
            return Err(SourceError::transient(
                SOURCE_NAME,
                format!("unexpected status {status}"),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SourceError::transient(SOURCE_NAME, e.to_string()))?;

        let profile = parse_profile(&html)
            .ok_or_else(|| SourceError::not_found(format!("instrument for {isin}")))?;

        tracing::debug!(%isin, symbol = %profile.symbol, "resolved via directory page");

        Ok(InstrumentRecord {
            isin: isin.clone(),
            name: profile.name.clone().unwrap_or_else(|| profile.ticker.clone()),
            symbol: profile.symbol,
            kind: InstrumentType::Etf,
            currency: profile.currency.unwrap_or_else(|| "EUR".to_string()),
            exchange: profile.exchange.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

struct ParsedProfile {
    ticker: String,
    symbol: String,
    name: Option<String>,
    exchange: Option<String>,
    currency: Option<String>,
}

/// Mine a profile page for ticker, name, exchange, and currency. Returns
/// `None` when no ticker can be extracted: the page was delivered but holds
/// nothing usable, which callers treat as a miss rather than a failure.
fn parse_profile(html: &str) -> Option<ParsedProfile> {
    let ticker = extract_ticker(html)?;

    let (exchange, suffix) = extract_exchange(html);
    let symbol = format!("{ticker}{suffix}");

    let doc = Html::parse_document(html);
    let name = extract_name(&doc);
    let currency = CURRENCY_PATTERN
        .find(html)
        .map(|m| m.as_str().to_string());

    Some(ParsedProfile {
        ticker,
        symbol,
        name,
        exchange,
        currency,
    })
}

fn extract_ticker(html: &str) -> Option<String> {
    for pattern in TICKER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(html) {
            return Some(caps[1].to_ascii_uppercase());
        }
    }
    None
}

/// The page lists its venues by display name; the first known label decides
/// the suffix. Unlisted venues keep the LSE suffix, the broadest coverage
/// for the UCITS universe this directory serves.
fn extract_exchange(html: &str) -> (Option<String>, &'static str) {
    for (label, suffix) in EXCHANGE_TO_SUFFIX {
        if html.contains(label) {
            return (Some((*label).to_string()), suffix);
        }
    }
    (None, ".L")
}

fn extract_name(doc: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").expect("static selector parses");
    if let Some(el) = doc.select(&h1).next() {
        let text = el.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let title = Selector::parse("title").expect("static selector parses");
    if let Some(el) = doc.select(&title).next() {
        let text = el.text().collect::<String>();
        let head = text.split('|').next().unwrap_or("").trim().to_string();
        if !head.is_empty() {
            return Some(head);
        }
    }

    None
}
