//! Read-side report series built on top of the engine components.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    calendar::{add_days, next_day_of_month},
    money::round2,
    Account, Budget, CurrencyCode, Transaction, TransactionKind,
};

use crate::{
    budget::BudgetService,
    currency::CurrencyConverter,
    forecast::{ForecastInput, ForecastService},
};

/// Days of history covered by a report bundle.
pub const REPORT_LOOKBACK_DAYS: i64 = 90;
/// Days projected by the cashflow series in a report bundle.
pub const REPORT_PROJECTION_DAYS: u32 = 90;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpending {
    pub category: String,
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeExpensePoint {
    /// Calendar month as `YYYY-MM`.
    pub period: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardUtilization {
    pub account_id: Uuid,
    pub account_name: String,
    pub utilization_percent: Decimal,
    pub statement_end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetVsActual {
    pub budget_id: Uuid,
    pub label: String,
    pub category: String,
    pub limit: Decimal,
    pub actual: Decimal,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionPoint {
    pub date: NaiveDate,
    pub projected_balance: Decimal,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportBundle {
    pub timeframe_start: NaiveDate,
    pub timeframe_end: NaiveDate,
    pub spending_by_category: Vec<CategorySpending>,
    pub income_vs_expense: Vec<IncomeExpensePoint>,
    pub credit_card_utilization: Vec<CardUtilization>,
    pub budget_vs_actual: Vec<BudgetVsActual>,
    pub cashflow_projection: Vec<ProjectionPoint>,
}

pub struct ReportService;

impl ReportService {
    /// Expense totals keyed by lower-cased category, in the base currency.
    /// Uncategorised expenses are left out.
    pub fn spending_by_category(fx: &CurrencyConverter, transactions: &[Transaction]) -> Vec<CategorySpending> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for txn in transactions.iter().filter(|txn| txn.kind == TransactionKind::Expense) {
            let Some(category) = txn.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            let total = totals.entry(category.to_lowercase()).or_default();
            *total += fx.to_base(txn.amount, &txn.currency);
        }
        totals
            .into_iter()
            .map(|(category, amount)| CategorySpending {
                category,
                currency: fx.base().clone(),
                amount: round2(amount),
            })
            .collect()
    }

    /// Monthly income and expense totals in the base currency, oldest first.
    pub fn income_expense_trend(fx: &CurrencyConverter, transactions: &[Transaction]) -> Vec<IncomeExpensePoint> {
        let mut months: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
        for txn in transactions {
            let bucket = months.entry((txn.date.year(), txn.date.month())).or_default();
            match txn.kind {
                TransactionKind::Income => bucket.0 += fx.to_base(txn.amount, &txn.currency),
                TransactionKind::Expense => bucket.1 += fx.to_base(txn.amount, &txn.currency),
                TransactionKind::Transfer => {}
            }
        }
        months
            .into_iter()
            .map(|((year, month), (income, expense))| IncomeExpensePoint {
                period: format!("{year:04}-{month:02}"),
                income: round2(income),
                expense: round2(expense),
                currency: fx.base().clone(),
            })
            .collect()
    }

    pub fn card_utilization(accounts: &[Account], today: NaiveDate) -> Vec<CardUtilization> {
        accounts
            .iter()
            .filter(|account| account.is_credit_card())
            .filter_map(|account| {
                let card = account.credit_card.as_ref()?;
                Some(CardUtilization {
                    account_id: account.id,
                    account_name: account.name.clone(),
                    utilization_percent: card.utilization_percent(),
                    statement_end_date: next_day_of_month(today, card.statement_end_day),
                })
            })
            .collect()
    }

    pub fn budget_vs_actual(
        fx: &CurrencyConverter,
        budgets: &[Budget],
        transactions: &[Transaction],
    ) -> Vec<BudgetVsActual> {
        BudgetService::progress_all(fx, budgets, transactions)
            .into_iter()
            .map(|row| {
                let label = budgets
                    .iter()
                    .find(|budget| budget.id == row.budget_id)
                    .map(|budget| budget.label.clone())
                    .unwrap_or_else(|| "Budget".to_string());
                BudgetVsActual {
                    budget_id: row.budget_id,
                    label,
                    category: row.category,
                    limit: row.limit,
                    actual: row.spent,
                    currency: row.currency,
                }
            })
            .collect()
    }

    pub fn cashflow_projection(
        fx: &CurrencyConverter,
        input: ForecastInput<'_>,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Vec<ProjectionPoint> {
        let forecast = ForecastService::project(fx, input, today, horizon_days);
        forecast
            .entries
            .into_iter()
            .map(|entry| ProjectionPoint {
                date: entry.date,
                projected_balance: entry.balance_projection,
                currency: forecast.currency.clone(),
            })
            .collect()
    }

    /// Every report series. History-based series cover the last
    /// [`REPORT_LOOKBACK_DAYS`] days up to `today`.
    pub fn bundle(
        fx: &CurrencyConverter,
        input: ForecastInput<'_>,
        budgets: &[Budget],
        today: NaiveDate,
    ) -> ReportBundle {
        let start = add_days(today, -REPORT_LOOKBACK_DAYS);
        let recent: Vec<Transaction> = input
            .transactions
            .iter()
            .filter(|txn| txn.date >= start)
            .cloned()
            .collect();

        let bundle = ReportBundle {
            timeframe_start: start,
            timeframe_end: today,
            spending_by_category: Self::spending_by_category(fx, &recent),
            income_vs_expense: Self::income_expense_trend(fx, &recent),
            credit_card_utilization: Self::card_utilization(input.accounts, today),
            budget_vs_actual: Self::budget_vs_actual(fx, budgets, input.transactions),
            cashflow_projection: Self::cashflow_projection(fx, input, today, REPORT_PROJECTION_DAYS),
        };
        debug!(%start, %today, transactions = recent.len(), "built report bundle");
        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_domain::{AccountKind, BudgetPeriod, CategoryAllocation};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn spending_groups_case_insensitively_in_base_currency() {
        let fx = CurrencyConverter::default();
        let account = Uuid::new_v4();
        let txns = vec![
            Transaction::expense(account, dec!(100), "MVR", d(2025, 5, 1)).with_category("Food"),
            Transaction::expense(account, dec!(10), "USD", d(2025, 5, 2)).with_category("food"),
            Transaction::expense(account, dec!(40), "MVR", d(2025, 5, 3)).with_category("Rent"),
            Transaction::expense(account, dec!(999), "MVR", d(2025, 5, 3)),
            Transaction::income(account, dec!(500), "MVR", d(2025, 5, 3)).with_category("food"),
        ];
        let rows = ReportService::spending_by_category(&fx, &txns);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "food");
        assert_eq!(rows[0].amount, dec!(254.20));
        assert_eq!(rows[1].category, "rent");
        assert_eq!(rows[1].currency.as_str(), "MVR");
    }

    #[test]
    fn trend_buckets_by_month_in_order() {
        let fx = CurrencyConverter::default();
        let account = Uuid::new_v4();
        let txns = vec![
            Transaction::expense(account, dec!(30), "MVR", d(2025, 6, 20)),
            Transaction::income(account, dec!(500), "MVR", d(2025, 5, 1)),
            Transaction::expense(account, dec!(20), "MVR", d(2025, 5, 9)),
            Transaction::transfer(account, Uuid::new_v4(), dec!(70), "MVR", d(2025, 5, 9)),
        ];
        let points = ReportService::income_expense_trend(&fx, &txns);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].period, "2025-05");
        assert_eq!(points[0].income, dec!(500));
        assert_eq!(points[0].expense, dec!(20));
        assert_eq!(points[1].period, "2025-06");
        assert_eq!(points[1].income, Decimal::ZERO);
    }

    #[test]
    fn card_utilization_skips_non_cards() {
        let mut card = Account::new("Visa", AccountKind::CreditCard, "MVR");
        if let Some(details) = card.credit_card.as_mut() {
            details.available_credit = dec!(3750);
        }
        let accounts = vec![card, Account::new("Bank", AccountKind::Bank, "MVR")];
        let rows = ReportService::card_utilization(&accounts, d(2025, 7, 10));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].utilization_percent, dec!(25));
        assert_eq!(rows[0].statement_end_date, d(2025, 7, 30));
    }

    #[test]
    fn budget_vs_actual_carries_labels() {
        let fx = CurrencyConverter::default();
        let budget = Budget::new("Household", BudgetPeriod::Monthly, d(2025, 7, 1), "MVR")
            .with_allocation(CategoryAllocation::new("Food", dec!(400)));
        let txns = vec![Transaction::expense(Uuid::new_v4(), dec!(150), "MVR", d(2025, 7, 4)).with_category("food")];
        let rows = ReportService::budget_vs_actual(&fx, &[budget], &txns);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "Household");
        assert_eq!(rows[0].limit, dec!(400));
        assert_eq!(rows[0].actual, dec!(150));
    }

    #[test]
    fn bundle_limits_history_to_lookback_window() {
        let fx = CurrencyConverter::default();
        let today = d(2025, 7, 1);
        let account = Uuid::new_v4();
        let txns = vec![
            Transaction::expense(account, dec!(10), "MVR", d(2025, 6, 15)).with_category("food"),
            Transaction::expense(account, dec!(90), "MVR", d(2025, 1, 15)).with_category("food"),
        ];
        let input = ForecastInput {
            transactions: &txns,
            ..ForecastInput::default()
        };
        let bundle = ReportService::bundle(&fx, input, &[], today);
        assert_eq!(bundle.timeframe_start, d(2025, 4, 2));
        assert_eq!(bundle.spending_by_category[0].amount, dec!(10));
        assert_eq!(bundle.cashflow_projection.len(), REPORT_PROJECTION_DAYS as usize);
    }
}
