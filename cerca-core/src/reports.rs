//! Aggregate result types for batch operations.
//!
//! Field names form the wire compatibility contract: embedding layers
//! serialize these directly, and callers rely on parallel `results`/`errors`
//! lists keyed by the original identifier.

use serde::{Deserialize, Serialize};

use crate::error::CercaError;
use crate::types::{InstrumentRecord, QuoteRecord};

/// One failed item in a batch resolution, keyed by the ISIN as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchErrorItem {
    /// The input that failed, exactly as the caller sent it.
    pub isin: String,
    /// The typed per-item outcome.
    pub error: CercaError,
}

/// Outcome of `search_batch`: partial successes plus per-item errors.
/// Every input appears exactly once across the two lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSearchReport {
    /// Successfully resolved records.
    pub results: Vec<InstrumentRecord>,
    /// Per-item failures.
    pub errors: Vec<SearchErrorItem>,
}

/// One failed item in a batch quote, keyed by the symbol as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteErrorItem {
    /// The input that failed, exactly as the caller sent it.
    pub symbol: String,
    /// The typed per-item outcome.
    pub error: CercaError,
}

/// Outcome of `quote_batch`: partial successes plus per-item errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuoteReport {
    /// Successfully fetched quotes.
    pub results: Vec<QuoteRecord>,
    /// Per-item failures.
    pub errors: Vec<QuoteErrorItem>,
}
