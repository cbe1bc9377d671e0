//! Account records and credit-card sub-accounting details.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, NamedEntity};
use crate::money::{round2, CurrencyCode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub currency: CurrencyCode,
    /// Mutated only through the ledger service.
    pub balance: Decimal,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCardDetails>,
}

impl Account {
    /// Creates an active account with a zero balance. Credit-card accounts
    /// receive default card details.
    pub fn new(name: impl Into<String>, kind: AccountKind, currency: impl Into<CurrencyCode>) -> Self {
        let credit_card = match kind {
            AccountKind::CreditCard => Some(CreditCardDetails::default()),
            _ => None,
        };
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            currency: currency.into(),
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            credit_card,
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = round2(balance);
        self
    }

    pub fn with_credit_card(mut self, details: CreditCardDetails) -> Self {
        self.credit_card = Some(details);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_credit_card(&self) -> bool {
        self.kind == AccountKind::CreditCard
    }
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    Cash,
    Bank,
    MobileWallet,
    CreditCard,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::MobileWallet => "mobile-wallet",
            AccountKind::CreditCard => "credit-card",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCardDetails {
    pub statement_start_day: u32,
    pub statement_end_day: u32,
    pub due_day: u32,
    pub credit_limit: Decimal,
    /// Annual percentage rate, e.g. `24` for 24%.
    pub apr: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_days: Option<u32>,
    #[serde(default)]
    pub pending_balance: Decimal,
    pub available_credit: Decimal,
}

impl CreditCardDetails {
    pub fn with_limit(credit_limit: Decimal) -> Self {
        Self {
            credit_limit,
            available_credit: credit_limit,
            ..Self::default()
        }
    }

    /// Share of the limit currently consumed, in percent. Zero for a zero limit.
    pub fn utilization_percent(&self) -> Decimal {
        if self.credit_limit.is_zero() {
            return Decimal::ZERO;
        }
        round2((self.credit_limit - self.available_credit) / self.credit_limit * Decimal::ONE_HUNDRED)
    }
}

impl Default for CreditCardDetails {
    fn default() -> Self {
        let limit = Decimal::from(5000);
        Self {
            statement_start_day: 1,
            statement_end_day: 30,
            due_day: 15,
            credit_limit: limit,
            apr: Decimal::from(24),
            annual_fee: None,
            grace_period_days: Some(21),
            pending_balance: Decimal::ZERO,
            available_credit: limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn credit_card_accounts_get_default_details() {
        let card = Account::new("Visa", AccountKind::CreditCard, "usd");
        let details = card.credit_card.expect("card details");
        assert_eq!(details.due_day, 15);
        assert_eq!(details.credit_limit, dec!(5000));
        assert_eq!(details.available_credit, dec!(5000));
        assert_eq!(card.currency.as_str(), "USD");

        let bank = Account::new("Checking", AccountKind::Bank, "MVR");
        assert!(bank.credit_card.is_none());
    }

    #[test]
    fn utilization_guards_zero_limit() {
        let mut details = CreditCardDetails::with_limit(dec!(1000));
        details.available_credit = dec!(750);
        assert_eq!(details.utilization_percent(), dec!(25));

        let empty = CreditCardDetails::with_limit(Decimal::ZERO);
        assert_eq!(empty.utilization_percent(), Decimal::ZERO);
    }

    #[test]
    fn account_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&AccountKind::MobileWallet).unwrap();
        assert_eq!(json, "\"mobile-wallet\"");
    }
}
