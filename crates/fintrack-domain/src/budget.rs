//! Budgets, category allocations and the derived progress view.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{add_days, shift_month};
use crate::common::{Identifiable, NamedEntity};
use crate::money::CurrencyCode;

/// Length of a custom budget window when no explicit end date is stored.
pub const CUSTOM_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub label: String,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Currency every allocation limit is expressed in.
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub carry_forward: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub categories: Vec<CategoryAllocation>,
}

impl Budget {
    pub fn new(
        label: impl Into<String>,
        period: BudgetPeriod,
        start_date: NaiveDate,
        currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            period,
            start_date,
            end_date: None,
            currency: currency.into(),
            carry_forward: false,
            locked: false,
            categories: Vec::new(),
        }
    }

    pub fn with_allocation(mut self, allocation: CategoryAllocation) -> Self {
        self.categories.push(allocation);
        self
    }

    /// Inclusive date window. A stored end date wins; otherwise the end is
    /// inferred from the period.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = self
            .end_date
            .unwrap_or_else(|| self.period.end_for(self.start_date));
        (self.start_date, end.max(self.start_date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.window();
        date >= start && date <= end
    }

    pub fn allocation(&self, category: &str) -> Option<&CategoryAllocation> {
        self.categories
            .iter()
            .find(|allocation| allocation.matches(category))
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Budget {
    fn name(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Weekly,
    Custom,
}

impl BudgetPeriod {
    /// Inclusive end date of the window beginning at `start`.
    pub fn end_for(self, start: NaiveDate) -> NaiveDate {
        match self {
            BudgetPeriod::Weekly => add_days(start, 6),
            BudgetPeriod::Monthly => add_days(shift_month(start, 1), -1),
            BudgetPeriod::Custom => add_days(start, CUSTOM_PERIOD_DAYS - 1),
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Custom => "custom",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAllocation {
    pub id: Uuid,
    pub category: String,
    pub limit: Decimal,
    #[serde(default)]
    pub carry_forward: bool,
}

impl CategoryAllocation {
    pub fn new(category: impl Into<String>, limit: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            limit,
            carry_forward: false,
        }
    }

    pub fn carrying_forward(mut self) -> Self {
        self.carry_forward = true;
        self
    }

    pub fn matches(&self, category: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category.trim())
    }
}

/// Spent/limit view for one (budget, category) pair. Derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetProgress {
    pub budget_id: Uuid,
    pub category: String,
    pub currency: CurrencyCode,
    /// Effective limit, including any carried-forward amount.
    pub limit: Decimal,
    pub carried_forward: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_end_dates_follow_cadence() {
        assert_eq!(BudgetPeriod::Weekly.end_for(d(2025, 3, 3)), d(2025, 3, 9));
        assert_eq!(BudgetPeriod::Monthly.end_for(d(2025, 3, 1)), d(2025, 3, 31));
        assert_eq!(BudgetPeriod::Monthly.end_for(d(2025, 1, 15)), d(2025, 2, 14));
        assert_eq!(BudgetPeriod::Custom.end_for(d(2025, 3, 1)), d(2025, 3, 30));
    }

    #[test]
    fn explicit_end_date_overrides_inferred_window() {
        let mut budget = Budget::new("Trip", BudgetPeriod::Custom, d(2025, 6, 1), "MVR");
        budget.end_date = Some(d(2025, 6, 10));
        assert_eq!(budget.window(), (d(2025, 6, 1), d(2025, 6, 10)));
        assert!(budget.contains(d(2025, 6, 10)));
        assert!(!budget.contains(d(2025, 6, 11)));
    }
}
