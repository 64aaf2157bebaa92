//! Identity types for Tally records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// A scalar as sent by the remote store.
///
/// The transaction backend is inconsistent about whether ids and prices are
/// JSON numbers or strings, so both are accepted and normalized to text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseScalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<LooseScalar> for String {
    fn from(value: LooseScalar) -> Self {
        match value {
            LooseScalar::Int(n) => n.to_string(),
            LooseScalar::Float(n) => n.to_string(),
            LooseScalar::Text(s) => s,
        }
    }
}

/// Identifier of a purchase, rental, product or user.
///
/// Always held as a string on the domain side; deserializes from either a
/// JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "LooseScalar", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or only whitespace.
    ///
    /// A blank id never identifies a record; detail queries for it are inert.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<LooseScalar> for RecordId {
    fn from(value: LooseScalar) -> Self {
        Self(String::from(value))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount as text, exactly as the remote sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LooseScalar", into = "String")]
pub struct PriceText(String);

impl PriceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the leading decimal number, ignoring whatever follows it.
    ///
    /// `"12.50 USD"` is 12.5 and `"1,000"` is 1. Returns `None` when the
    /// text does not start with a number or the number is not finite.
    pub fn parse_amount(&self) -> Option<f64> {
        let prefix = decimal_prefix(self.0.trim_start());
        if prefix.is_empty() {
            return None;
        }
        prefix
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
    }
}

/// Longest prefix of `text` shaped like `[+-]digits[.digits][(e|E)[+-]digits]`,
/// with at least one mantissa digit. Empty when there is none.
fn decimal_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &text[..end]
}

impl From<LooseScalar> for PriceText {
    fn from(value: LooseScalar) -> Self {
        Self(String::from(value))
    }
}

impl From<PriceText> for String {
    fn from(price: PriceText) -> Self {
        price.0
    }
}

impl From<&str> for PriceText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for PriceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
