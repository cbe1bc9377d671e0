//! Transaction records as produced by manual entry, imports, bill splits and
//! recurring items.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::Identifiable;
use crate::money::{round2, CurrencyCode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Always a positive magnitude; direction comes from `kind`.
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub status: TransactionStatus,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    /// Explicit destination leg of a cross-currency transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_currency: Option<CurrencyCode>,
    /// Pre-computed amount in the account's currency. When present the ledger
    /// uses it instead of converting `amount` at the configured rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: TransactionSource,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Transaction {
    fn base(kind: TransactionKind, amount: Decimal, currency: CurrencyCode, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount: round2(amount.abs()),
            currency,
            status: TransactionStatus::Posted,
            date,
            account_id: None,
            from_account_id: None,
            to_account_id: None,
            counter_amount: None,
            counter_currency: None,
            account_amount: None,
            category: None,
            contact_id: None,
            description: None,
            source: TransactionSource::Manual,
            metadata: BTreeMap::new(),
        }
    }

    pub fn income(
        account_id: Uuid,
        amount: Decimal,
        currency: impl Into<CurrencyCode>,
        date: NaiveDate,
    ) -> Self {
        let mut txn = Self::base(TransactionKind::Income, amount, currency.into(), date);
        txn.account_id = Some(account_id);
        txn
    }

    pub fn expense(
        account_id: Uuid,
        amount: Decimal,
        currency: impl Into<CurrencyCode>,
        date: NaiveDate,
    ) -> Self {
        let mut txn = Self::base(TransactionKind::Expense, amount, currency.into(), date);
        txn.account_id = Some(account_id);
        txn
    }

    pub fn transfer(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Decimal,
        currency: impl Into<CurrencyCode>,
        date: NaiveDate,
    ) -> Self {
        let mut txn = Self::base(TransactionKind::Transfer, amount, currency.into(), date);
        txn.from_account_id = Some(from_account_id);
        txn.to_account_id = Some(to_account_id);
        txn
    }

    pub fn with_counter(mut self, amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        self.counter_amount = Some(amount);
        self.counter_currency = Some(currency.into());
        self
    }

    pub fn with_account_amount(mut self, amount: Decimal) -> Self {
        self.account_amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_contact(mut self, contact_id: Uuid) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn with_source(mut self, source: TransactionSource) -> Self {
        self.source = source;
        self
    }

    /// Case-insensitive category comparison, ignoring surrounding whitespace.
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .map(|own| own.trim().eq_ignore_ascii_case(category.trim()))
            .unwrap_or(false)
    }

    /// Every account id the transaction touches, in apply order.
    pub fn touched_accounts(&self) -> Vec<Uuid> {
        match self.kind {
            TransactionKind::Income | TransactionKind::Expense => {
                self.account_id.into_iter().collect()
            }
            TransactionKind::Transfer => self
                .from_account_id
                .into_iter()
                .chain(self.to_account_id)
                .collect(),
        }
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Transfer => "transfer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Lifecycle state of a transaction. Transitions are pending → posted.
pub enum TransactionStatus {
    Pending,
    Posted,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Posted => "posted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    #[default]
    Manual,
    Sms,
    Csv,
    Recurring,
    Import,
    BillSplit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn constructors_store_positive_rounded_magnitude() {
        let account = Uuid::new_v4();
        let txn = Transaction::expense(account, dec!(-12.345), "usd", day());
        assert_eq!(txn.amount, dec!(12.35));
        assert_eq!(txn.currency.as_str(), "USD");
        assert_eq!(txn.touched_accounts(), vec![account]);
    }

    #[test]
    fn transfer_touches_both_accounts() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let txn = Transaction::transfer(from, to, dec!(10), "MVR", day());
        assert_eq!(txn.touched_accounts(), vec![from, to]);
    }

    #[test]
    fn category_match_ignores_case() {
        let txn = Transaction::expense(Uuid::new_v4(), dec!(5), "MVR", day())
            .with_category("Groceries ");
        assert!(txn.in_category("groceries"));
        assert!(!txn.in_category("rent"));
    }
}
