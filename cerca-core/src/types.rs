//! Domain data structures shared across the workspace.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CercaError;

/// A validated International Securities Identification Number.
///
/// Canonical form: 12 characters, two-letter country prefix, nine-character
/// alphanumeric body, and a trailing check digit verified with the standard
/// double-add-double algorithm. Input is upper-cased on parse; the inner
/// string never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isin(String);

impl Isin {
    /// Parse and validate an ISIN.
    ///
    /// # Errors
    /// Returns `CercaError::InvalidIsin` on bad length, charset, structure,
    /// or check digit. Validation is purely syntactic and never performs I/O.
    pub fn parse(input: &str) -> Result<Self, CercaError> {
        let s = input.trim().to_ascii_uppercase();
        if s.len() != 12 {
            return Err(CercaError::invalid_isin(input, "must be 12 characters"));
        }
        let bytes = s.as_bytes();
        if !bytes[..2].iter().all(u8::is_ascii_uppercase) {
            return Err(CercaError::invalid_isin(
                input,
                "must start with a two-letter country code",
            ));
        }
        if !bytes[2..11]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(CercaError::invalid_isin(
                input,
                "body must be alphanumeric",
            ));
        }
        if !bytes[11].is_ascii_digit() {
            return Err(CercaError::invalid_isin(
                input,
                "must end with a numeric check digit",
            ));
        }
        if !luhn_valid(&s) {
            return Err(CercaError::invalid_isin(input, "check digit mismatch"));
        }
        Ok(Self(s))
    }

    /// Borrow the canonical 12-character string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Expand letters to their base-36 values and run the Luhn check over the
/// resulting digit string, including the trailing check digit.
fn luhn_valid(isin: &str) -> bool {
    let mut digits: Vec<u8> = Vec::with_capacity(24);
    for c in isin.bytes() {
        if c.is_ascii_digit() {
            digits.push(c - b'0');
        } else {
            let v = c - b'A' + 10;
            digits.push(v / 10);
            digits.push(v % 10);
        }
    }
    let mut sum = 0u32;
    for (i, d) in digits.iter().rev().enumerate() {
        let mut v = u32::from(*d);
        if i % 2 == 1 {
            v *= 2;
            if v > 9 {
                v -= 9;
            }
        }
        sum += v;
    }
    sum % 10 == 0
}

impl FromStr for Isin {
    type Err = CercaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isin {
    type Error = CercaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Isin> for String {
    fn from(isin: Isin) -> Self {
        isin.0
    }
}

impl AsRef<str> for Isin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse instrument classification as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum InstrumentType {
    /// Common equity.
    Stock,
    /// Exchange-traded fund.
    Etf,
    /// Open-ended or mutual fund.
    Fund,
    /// Anything the source reported that does not fit the above.
    Other,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
            Self::Fund => "fund",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Result of a successful ISIN resolution.
///
/// Invariant: a record is never partially populated; adapters return
/// `SourceError::NotFound` instead of a record with an empty `symbol`.
/// Field names are part of the wire compatibility contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    /// The resolved ISIN, canonical uppercase.
    pub isin: Isin,
    /// Exchange-specific ticker symbol, non-empty.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Instrument classification.
    #[serde(rename = "type")]
    pub kind: InstrumentType,
    /// ISO 4217 trading currency.
    pub currency: String,
    /// Source-assigned market code or exchange name.
    pub exchange: String,
}

/// Result of a successful quote lookup.
///
/// Invariant: `price` is strictly positive; the absence of a usable price is
/// a `NotFound` outcome, never a zero value. `price` serializes as a decimal
/// string and `time` as an RFC 3339 timestamp (wire contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Ticker symbol the quote belongs to.
    pub symbol: String,
    /// Last traded or regular-market price, fixed precision.
    pub price: Decimal,
    /// ISO 4217 price currency.
    pub currency: String,
    /// Quote time, timezone-aware.
    pub time: DateTime<Utc>,
}
