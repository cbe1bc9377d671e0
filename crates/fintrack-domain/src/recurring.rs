//! Recurring income, expenses, transfers and payments with a run cursor.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{add_days, shift_month, shift_year, with_day_clamped};
use crate::common::{Identifiable, NamedEntity};
use crate::money::CurrencyCode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringItem {
    pub id: Uuid,
    pub label: String,
    pub kind: RecurringKind,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// Cursor advanced by one step each time the item runs.
    pub next_run_date: NaiveDate,
    pub recurrence: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub auto_create_transaction: bool,
}

impl RecurringItem {
    pub fn new(
        label: impl Into<String>,
        kind: RecurringKind,
        amount: Decimal,
        currency: impl Into<CurrencyCode>,
        next_run_date: NaiveDate,
        recurrence: RecurrenceRule,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            kind,
            amount,
            currency: currency.into(),
            next_run_date,
            recurrence,
            account_id: None,
            to_account_id: None,
            contact_id: None,
            category: None,
            auto_create_transaction: false,
        }
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_destination(mut self, to_account_id: Uuid) -> Self {
        self.to_account_id = Some(to_account_id);
        self
    }

    pub fn auto_creating(mut self) -> Self {
        self.auto_create_transaction = true;
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == RecurringKind::Income
    }
}

impl Identifiable for RecurringItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for RecurringItem {
    fn name(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurringKind {
    Income,
    Expense,
    Transfer,
    Payment,
}

impl fmt::Display for RecurringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecurringKind::Income => "income",
            RecurringKind::Expense => "expense",
            RecurringKind::Transfer => "transfer",
            RecurringKind::Payment => "payment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
            Cadence::Yearly => "yearly",
            Cadence::Custom => "custom",
        };
        f.write_str(label)
    }
}

/// Cadence plus multiplier. Custom cadences step by `interval` days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub cadence: Cadence,
    #[serde(default = "RecurrenceRule::default_interval")]
    pub interval: u32,
    /// Pins monthly occurrences to this day, clamped to the month length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
}

impl RecurrenceRule {
    pub fn new(cadence: Cadence, interval: u32) -> Self {
        Self {
            cadence,
            interval,
            day_of_month: None,
        }
    }

    pub fn monthly_on(day_of_month: u32) -> Self {
        Self {
            cadence: Cadence::Monthly,
            interval: 1,
            day_of_month: Some(day_of_month),
        }
    }

    pub fn default_interval() -> u32 {
        1
    }

    /// Calculates the next date after `from` according to the rule.
    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        let every = self.interval.max(1);
        if let Some(days) = self.step_days() {
            return add_days(from, days);
        }
        match self.cadence {
            Cadence::Monthly => {
                let shifted = shift_month(from, every as i32);
                match self.day_of_month {
                    Some(day) => with_day_clamped(shifted, day),
                    None => shifted,
                }
            }
            Cadence::Quarterly => shift_month(from, 3 * every as i32),
            _ => shift_year(from, every as i32),
        }
    }

    /// Fixed step length in days, for cadences that have one.
    pub fn step_days(&self) -> Option<i64> {
        let every = self.interval.max(1) as i64;
        match self.cadence {
            Cadence::Daily | Cadence::Custom => Some(every),
            Cadence::Weekly => Some(7 * every),
            Cadence::Biweekly => Some(14 * every),
            Cadence::Monthly | Cadence::Quarterly | Cadence::Yearly => None,
        }
    }

    /// First date on the cadence starting at `cursor` that is on or after
    /// `target`. Day-based cadences jump there directly; calendar cadences
    /// step month by month so end-of-month clamping matches `next_date`.
    pub fn fast_forward(&self, cursor: NaiveDate, target: NaiveDate) -> NaiveDate {
        if cursor >= target {
            return cursor;
        }
        if let Some(days) = self.step_days() {
            let behind = (target - cursor).num_days();
            let steps = (behind + days - 1) / days;
            return add_days(cursor, steps * days);
        }
        let mut current = cursor;
        while current < target {
            let next = self.next_date(current);
            if next <= current {
                break;
            }
            current = next;
        }
        current
    }

    pub fn label(&self) -> String {
        match (self.interval.max(1), self.cadence) {
            (1, cadence) => cadence.to_string(),
            (n, Cadence::Custom) => format!("every {n} days"),
            (n, cadence) => format!("{cadence} x{n}"),
        }
    }
}
