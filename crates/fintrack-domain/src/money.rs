//! Fixed-point money helpers shared by every engine component.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One minor unit (0.01). Used as the tolerance for cent-level comparisons.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true when `a` and `b` differ by at most one cent.
pub fn within_cent(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= CENT
}

/// ISO 4217 style currency code, always stored upper-case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("MVR")
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(33.333333)), dec!(33.33));
    }

    #[test]
    fn cent_constant_is_one_hundredth() {
        assert_eq!(CENT, dec!(0.01));
        assert!(within_cent(dec!(10.00), dec!(10.01)));
        assert!(!within_cent(dec!(10.00), dec!(10.02)));
    }

    #[test]
    fn currency_codes_are_upper_cased() {
        let code = CurrencyCode::new(" usd ");
        assert_eq!(code.as_str(), "USD");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"USD\"");
        let back: CurrencyCode = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(back, CurrencyCode::new("EUR"));
    }
}
