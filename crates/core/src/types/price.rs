//! Unit prices using decimal arithmetic.
//!
//! Prices reach the cart from untrusted places (persisted slots, form posts,
//! content front matter), so every entry point goes through
//! [`Price::coerce`], which accepts JSON numbers and numeric-looking strings.

use core::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plain decimal notation with an optional exponent: `20`, `-1.5`, `.5`,
/// `3.`, `1e2`. No digit separators, no hex, no `Infinity`.
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("Invalid regex")
});

/// Errors that can occur when coercing a value into a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The value is not a number or a numeric string.
    #[error("price is not a number: {0}")]
    NotANumber(String),
    /// The value is numeric but below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative unit price in euros.
///
/// Serialized as a JSON number so the persisted cart slot keeps the
/// `{ "price": 20 }` shape.
///
/// ```
/// use astro_tickets_core::Price;
/// use serde_json::json;
///
/// assert_eq!(Price::coerce(&json!(10)).unwrap().to_string(), "10.00€");
/// assert_eq!(Price::coerce(&json!("20")).unwrap().to_string(), "20.00€");
/// assert!(Price::coerce(&json!("abc")).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Coerce an untyped value into a price.
    ///
    /// Accepts JSON numbers and strings that parse as a decimal number after
    /// trimming (`"20"`, `" 12.50 "`, `"1e2"`). Everything else - `null`,
    /// booleans, empty strings, arrays, objects - is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] when the value has no numeric
    /// reading, or [`PriceError::Negative`] for amounts below zero.
    pub fn coerce(value: &Value) -> Result<Self, PriceError> {
        let amount = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
        .ok_or_else(|| PriceError::NotANumber(value.to_string()))?;

        Self::new(amount)
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, or `None` if the product overflows.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_euros(self.0))
    }
}

impl From<Price> for Value {
    fn from(price: Price) -> Self {
        // Decimal's string form always re-parses through `Price::coerce`.
        Self::String(price.0.to_string())
    }
}

/// Format an amount with two decimals and a trailing euro sign (`"12.50€"`).
#[must_use]
pub fn format_euros(amount: Decimal) -> String {
    format!("{:.2}€", amount.round_dp(2))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if !NUMERIC_RE.is_match(trimmed) {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
