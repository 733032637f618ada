//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency assumed when the marketplace omits one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code as reported by the marketplace.
    pub currency: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Create a USD price from whole dollars.
    #[must_use]
    pub fn usd(dollars: i64) -> Self {
        Self::new(Decimal::from(dollars), DEFAULT_CURRENCY)
    }
}

impl core::fmt::Display for Price {
    /// Formats as `USD 19.99`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::new(Decimal::new(1999, 2), "USD").to_string(), "USD 19.99");
        assert_eq!(Price::usd(50).to_string(), "USD 50.00");
        assert_eq!(Price::new(Decimal::new(5, 1), "GBP").to_string(), "GBP 0.50");
    }
}
