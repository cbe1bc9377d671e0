use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, NamedEntity};
use crate::money::CurrencyCode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub label: String,
    pub target_amount: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// Derived from `contributions`; recomputed in full after every change.
    #[serde(default)]
    pub current_amount: Decimal,
    #[serde(default)]
    pub priority: SavingsPriority,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl SavingsGoal {
    pub fn new(label: impl Into<String>, target_amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            target_amount,
            currency: currency.into(),
            target_date: None,
            current_amount: Decimal::ZERO,
            priority: SavingsPriority::Medium,
            contributions: Vec::new(),
        }
    }

    pub fn contribution(&self, id: Uuid) -> Option<&Contribution> {
        self.contributions.iter().find(|entry| entry.id == id)
    }
}

impl Identifiable for SavingsGoal {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for SavingsGoal {
    fn name(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contribution {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Contribution {
    pub fn new(date: NaiveDate, amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            amount,
            currency: currency.into(),
            account_id: None,
            notes: None,
        }
    }

    pub fn from_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum SavingsPriority {
    Low,
    #[default]
    Medium,
    High,
}
