//! Loans, repayments and their amortization schedules.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, NamedEntity};
use crate::money::CurrencyCode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Loan {
    pub id: Uuid,
    pub label: String,
    pub contact_id: Uuid,
    pub direction: LoanDirection,
    pub horizon: LoanHorizon,
    pub principal: Decimal,
    pub currency: CurrencyCode,
    /// Annual percentage; zero means interest-free.
    pub interest_rate: Decimal,
    pub term_months: u32,
    pub start_date: NaiveDate,
    /// Derived from payments and schedule; see `LoanService::derive_status`.
    pub status: LoanStatus,
    #[serde(default)]
    pub payments: Vec<LoanPayment>,
    /// Built once at creation and never patched.
    #[serde(default)]
    pub schedule: Vec<AmortizationEntry>,
}

impl Identifiable for Loan {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Loan {
    fn name(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanPayment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LoanPayment {
    pub fn new(date: NaiveDate, amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            amount,
            currency: currency.into(),
            note: None,
        }
    }
}

/// One installment row of an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmortizationEntry {
    pub period: u32,
    pub due_date: NaiveDate,
    pub interest: Decimal,
    pub principal: Decimal,
    /// Remaining principal after this installment.
    pub balance: Decimal,
}

impl AmortizationEntry {
    pub fn installment(&self) -> Decimal {
        self.principal + self.interest
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanDirection {
    Borrowed,
    Lent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoanHorizon {
    /// Single lump-sum repayment.
    ShortTerm,
    LongTerm,
}

impl LoanHorizon {
    pub fn effective_term(self, term_months: u32) -> u32 {
        match self {
            LoanHorizon::ShortTerm => 1,
            LoanHorizon::LongTerm => term_months,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    #[default]
    Active,
    Paid,
    Overdue,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanStatus::Active => "active",
            LoanStatus::Paid => "paid",
            LoanStatus::Overdue => "overdue",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_term_loans_have_single_period() {
        assert_eq!(LoanHorizon::ShortTerm.effective_term(12), 1);
        assert_eq!(LoanHorizon::LongTerm.effective_term(12), 12);
    }

    #[test]
    fn horizon_serializes_kebab_case() {
        let json = serde_json::to_string(&LoanHorizon::ShortTerm).unwrap();
        assert_eq!(json, "\"short-term\"");
    }
}
