//! Static-table currency conversion through a single base currency.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::warn;

use fintrack_domain::money::{round2, CurrencyCode};

pub const DEFAULT_BASE_CURRENCY: &str = "MVR";

static DEFAULT_RATES: Lazy<BTreeMap<CurrencyCode, Decimal>> = Lazy::new(|| {
    [
        ("MVR", Decimal::ONE),
        ("USD", Decimal::new(1542, 2)),
        ("EUR", Decimal::new(1632, 2)),
        ("GBP", Decimal::new(1855, 2)),
        ("LKR", Decimal::new(49, 3)),
    ]
    .into_iter()
    .map(|(code, rate)| (CurrencyCode::new(code), rate))
    .collect()
});

/// Default table: units of the base currency per one unit of each code.
pub fn default_rates() -> BTreeMap<CurrencyCode, Decimal> {
    DEFAULT_RATES.clone()
}

/// Converts amounts between currency codes using a fixed rate table.
///
/// Each rate is expressed as base-currency units per one unit of the code.
/// Codes missing from the table convert at rate 1, so conversion is total.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_CURRENCY, default_rates())
    }
}

impl CurrencyConverter {
    /// Builds a converter. Non-positive rates are dropped and the base currency
    /// is pinned to 1.
    pub fn new(
        base: impl Into<CurrencyCode>,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Self {
        let base = base.into();
        let mut table: BTreeMap<CurrencyCode, Decimal> = BTreeMap::new();
        for (code, rate) in rates {
            let code = CurrencyCode::new(code.as_str());
            if rate <= Decimal::ZERO {
                warn!(currency = %code, %rate, "ignoring non-positive exchange rate");
                continue;
            }
            table.insert(code, rate);
        }
        table.insert(base.clone(), Decimal::ONE);
        Self { base, rates: table }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<CurrencyCode, Decimal> {
        &self.rates
    }

    pub fn supports(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    /// Base-currency units per one unit of `code`; 1 for unknown codes.
    pub fn rate(&self, code: &CurrencyCode) -> Decimal {
        match self.rates.get(code) {
            Some(rate) => *rate,
            None => {
                warn!(currency = %code, "unknown currency code, converting at rate 1");
                Decimal::ONE
            }
        }
    }

    /// `round2(amount * rate[from] / rate[to])`.
    pub fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> Decimal {
        if from == to {
            return round2(amount);
        }
        round2(amount * self.rate(from) / self.rate(to))
    }

    pub fn to_base(&self, amount: Decimal, currency: &CurrencyCode) -> Decimal {
        self.convert(amount, currency, &self.base)
    }

    pub fn from_base(&self, amount: Decimal, currency: &CurrencyCode) -> Decimal {
        self.convert(amount, &self.base, currency)
    }
}
