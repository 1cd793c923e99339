//! Monetary amounts as returned by the Shopify Storefront API.
//!
//! Shopify sends decimal amounts as strings. `Money` keeps the string as the
//! source of truth (it is display data) and parses it on demand with
//! `rust_decimal` when arithmetic is needed.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }

    /// Parse the amount as a decimal.
    ///
    /// Returns `None` for malformed amounts.
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        Decimal::from_str(self.amount.trim()).ok()
    }

    /// Format for display (e.g., "USD 19.99").
    ///
    /// Malformed amounts are shown verbatim.
    #[must_use]
    pub fn display(&self) -> String {
        self.decimal().map_or_else(
            || format!("{} {}", self.currency_code, self.amount),
            |amount| format!("{} {:.2}", self.currency_code, amount.round_dp(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parses_shopify_amounts() {
        assert_eq!(Money::new("30.0", "USD").decimal(), Some(Decimal::new(300, 1)));
        assert_eq!(Money::new(" 12.50 ", "USD").decimal(), Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_decimal_rejects_malformed() {
        assert_eq!(Money::new("", "USD").decimal(), None);
        assert_eq!(Money::new("abc", "USD").decimal(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new("19.9", "EUR").display(), "EUR 19.90");
        assert_eq!(Money::new("n/a", "EUR").display(), "EUR n/a");
    }
}
