//! Type-safe price representation using decimal arithmetic.
//!
//! The shop sells in South African Rand only, so [`CurrencyCode`] defaults
//! to `ZAR`. Amounts are always `rust_decimal::Decimal`; floating point is
//! never used for money.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (Rand, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Rand.
    #[must_use]
    pub const fn zar(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::ZAR)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Format for display, e.g. `R300.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency code. Rand is the only currency the shop trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ZAR,
}

impl CurrencyCode {
    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ZAR => "R",
        }
    }
}

/// Format a bare Rand amount, e.g. `R560.00`.
#[must_use]
pub fn format_zar(amount: Decimal) -> String {
    Price::zar(amount).display()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::zar(Decimal::from(300)).display(), "R300.00");
        assert_eq!(Price::zar(Decimal::new(2605, 1)).display(), "R260.50");
    }

    #[test]
    fn test_times_quantity() {
        let line = Price::zar(Decimal::from(260)).times(3);
        assert_eq!(line.amount, Decimal::from(780));
        assert_eq!(line.currency_code, CurrencyCode::ZAR);
    }

    #[test]
    fn test_only_rand_is_accepted() {
        assert_eq!(CurrencyCode::default().symbol(), "R");
        assert!(serde_json::from_str::<CurrencyCode>("\"ZAR\"").is_ok());
        assert!(serde_json::from_str::<CurrencyCode>("\"USD\"").is_err());
    }

    #[test]
    fn test_format_zar_rounds() {
        assert_eq!(format_zar(Decimal::new(19_999, 3)), "R20.00");
    }
}
