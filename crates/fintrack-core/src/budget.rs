//! Budget-versus-actual aggregation with carry-forward of unspent limits.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use fintrack_domain::{
    calendar::{add_days, shift_month, with_day_clamped},
    money::round2,
    Budget, BudgetPeriod, BudgetProgress, CategoryAllocation, Transaction, TransactionKind,
};

use crate::{
    currency::CurrencyConverter,
    error::{CoreError, CoreResult},
};

/// Maximum number of earlier periods consulted for a carry-forward chain.
pub const MAX_CARRY_DEPTH: usize = 36;

/// Stateless budgeting utilities operating over supplied budgets and transactions.
pub struct BudgetService;

impl BudgetService {
    pub fn validate(budget: &Budget) -> CoreResult<()> {
        if let Some(end) = budget.end_date {
            if end < budget.start_date {
                return Err(CoreError::invalid("budget end date precedes its start date"));
            }
        }
        let mut seen = HashSet::new();
        for allocation in &budget.categories {
            let key = allocation.category.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(CoreError::invalid("budget category name is required"));
            }
            if allocation.limit < Decimal::ZERO {
                return Err(CoreError::invalid(format!(
                    "limit for `{}` cannot be negative",
                    allocation.category
                )));
            }
            if !seen.insert(key) {
                return Err(CoreError::invalid(format!(
                    "category `{}` is allocated twice",
                    allocation.category
                )));
            }
        }
        Ok(())
    }

    /// A locked budget accepts no change other than clearing the lock.
    pub fn check_edit(previous: &Budget, next: &Budget) -> CoreResult<()> {
        if previous.locked {
            let mut relocked = next.clone();
            relocked.locked = true;
            if &relocked != previous {
                return Err(CoreError::invalid(format!("budget `{}` is locked", previous.label)));
            }
            return Ok(());
        }
        Self::validate(next)
    }

    pub fn check_delete(budget: &Budget) -> CoreResult<()> {
        if budget.locked {
            return Err(CoreError::invalid(format!("budget `{}` is locked", budget.label)));
        }
        Ok(())
    }

    /// Start of the period containing `today`.
    ///
    /// Monthly and custom periods begin on `start_day` of the month (clamped to
    /// shorter months). Weekly periods read `start_day` as an ISO weekday,
    /// 1 = Monday, wrapping past 7.
    pub fn period_start(period: BudgetPeriod, start_day: u32, today: NaiveDate) -> NaiveDate {
        let start_day = start_day.max(1);
        match period {
            BudgetPeriod::Weekly => {
                let target = (start_day - 1) % 7;
                let back = (today.weekday().num_days_from_monday() + 7 - target) % 7;
                add_days(today, -(back as i64))
            }
            BudgetPeriod::Monthly | BudgetPeriod::Custom => {
                let candidate = with_day_clamped(today, start_day);
                if candidate <= today {
                    return candidate;
                }
                let first = today.with_day(1).unwrap_or(today);
                with_day_clamped(shift_month(first, -1), start_day)
            }
        }
    }

    /// Expense total for `category` inside the budget window, in the budget currency.
    pub fn spent(
        fx: &CurrencyConverter,
        budget: &Budget,
        category: &str,
        transactions: &[Transaction],
    ) -> Decimal {
        transactions
            .iter()
            .filter(|txn| txn.kind == TransactionKind::Expense)
            .filter(|txn| txn.in_category(category) && budget.contains(txn.date))
            .map(|txn| fx.convert(txn.amount, &txn.currency, &budget.currency))
            .fold(Decimal::ZERO, |acc, amount| round2(acc + amount))
    }

    /// The budget whose window ends the day before `budget` starts and that
    /// allocates the same category.
    pub fn predecessor<'a>(budget: &Budget, category: &str, budgets: &'a [Budget]) -> Option<&'a Budget> {
        let previous_end = add_days(budget.start_date, -1);
        budgets.iter().find(|candidate| {
            candidate.id != budget.id
                && candidate.window().1 == previous_end
                && candidate.allocation(category).is_some()
        })
    }

    /// Unspent amount rolled into `allocation` from earlier periods, in the
    /// budget currency. Zero unless carry-forward is enabled for the category.
    pub fn carried_forward(
        fx: &CurrencyConverter,
        budget: &Budget,
        allocation: &CategoryAllocation,
        budgets: &[Budget],
        transactions: &[Transaction],
    ) -> Decimal {
        if !carries_forward(budget, allocation) {
            return Decimal::ZERO;
        }
        let category = allocation.category.as_str();
        let mut chain: Vec<&Budget> = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([budget.id]);
        let mut current = budget;
        while let Some(previous) = Self::predecessor(current, category, budgets) {
            if !visited.insert(previous.id) {
                break;
            }
            chain.push(previous);
            if chain.len() >= MAX_CARRY_DEPTH {
                warn!(budget = %budget.id, category, "carry-forward chain truncated");
                break;
            }
            let carries = previous
                .allocation(category)
                .map(|prior| carries_forward(previous, prior))
                .unwrap_or(false);
            if !carries {
                break;
            }
            current = previous;
        }

        // Oldest period first: each unspent remainder feeds the next limit.
        let mut carry = Decimal::ZERO;
        let mut carry_currency = budget.currency.clone();
        for period in chain.iter().rev() {
            let Some(prior) = period.allocation(category) else {
                continue;
            };
            let inherited = fx.convert(carry, &carry_currency, &period.currency);
            let effective = round2(prior.limit + inherited);
            let spent = Self::spent(fx, period, category, transactions);
            carry = (effective - spent).max(Decimal::ZERO);
            carry_currency = period.currency.clone();
        }
        fx.convert(carry, &carry_currency, &budget.currency)
    }

    /// Progress for every allocation of one budget.
    pub fn progress(
        fx: &CurrencyConverter,
        budget: &Budget,
        budgets: &[Budget],
        transactions: &[Transaction],
    ) -> Vec<BudgetProgress> {
        budget
            .categories
            .iter()
            .map(|allocation| {
                let carried = Self::carried_forward(fx, budget, allocation, budgets, transactions);
                let limit = round2(allocation.limit + carried);
                let spent = Self::spent(fx, budget, &allocation.category, transactions);
                BudgetProgress {
                    budget_id: budget.id,
                    category: allocation.category.clone(),
                    currency: budget.currency.clone(),
                    limit,
                    carried_forward: carried,
                    spent,
                    remaining: round2(limit - spent),
                    percent: percent_of(spent, limit),
                }
            })
            .collect()
    }

    /// Progress across every supplied budget, in the order given.
    pub fn progress_all(
        fx: &CurrencyConverter,
        budgets: &[Budget],
        transactions: &[Transaction],
    ) -> Vec<BudgetProgress> {
        let rows: Vec<BudgetProgress> = budgets
            .iter()
            .flat_map(|budget| Self::progress(fx, budget, budgets, transactions))
            .collect();
        debug!(budgets = budgets.len(), rows = rows.len(), "aggregated budget progress");
        rows
    }
}

fn carries_forward(budget: &Budget, allocation: &CategoryAllocation) -> bool {
    allocation.carry_forward || budget.carry_forward
}

fn percent_of(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(spent / limit * Decimal::ONE_HUNDRED).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fintrack_domain::BudgetPeriod;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn food(date: NaiveDate, amount: Decimal) -> Transaction {
        Transaction::expense(Uuid::new_v4(), amount, "MVR", date).with_category("Food")
    }

    fn monthly(start: NaiveDate, limit: Decimal, carry: bool) -> Budget {
        let allocation = CategoryAllocation::new("food", limit);
        let allocation = if carry { allocation.carrying_forward() } else { allocation };
        Budget::new("Monthly", BudgetPeriod::Monthly, start, "MVR").with_allocation(allocation)
    }

    #[test]
    fn spent_counts_matching_expenses_in_window() {
        let fx = CurrencyConverter::default();
        let budget = monthly(d(2025, 3, 1), dec!(1000), false);
        let txns = vec![
            food(d(2025, 3, 1), dec!(100)),
            food(d(2025, 3, 31), dec!(50)),
            food(d(2025, 4, 1), dec!(999)),
            Transaction::income(Uuid::new_v4(), dec!(500), "MVR", d(2025, 3, 5)).with_category("food"),
            Transaction::expense(Uuid::new_v4(), dec!(10), "USD", d(2025, 3, 9)).with_category("FOOD"),
        ];
        let rows = BudgetService::progress(&fx, &budget, &[budget.clone()], &txns);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].spent, dec!(304.20));
        assert_eq!(rows[0].remaining, dec!(695.80));
        assert_eq!(rows[0].percent, dec!(30.42));
    }

    #[test]
    fn locked_budgets_only_accept_unlocking() {
        let mut locked = monthly(d(2025, 3, 1), dec!(100), false);
        locked.locked = true;

        let mut raised = locked.clone();
        raised.categories[0].limit = dec!(200);
        assert!(BudgetService::check_edit(&locked, &raised).is_err());
        assert!(BudgetService::check_delete(&locked).is_err());

        let mut unlocked = locked.clone();
        unlocked.locked = false;
        assert!(BudgetService::check_edit(&locked, &unlocked).is_ok());
        assert!(BudgetService::check_edit(&unlocked, &raised).is_ok());
    }

    #[test]
    fn period_start_follows_start_day() {
        let month = BudgetPeriod::Monthly;
        assert_eq!(BudgetService::period_start(month, 1, d(2025, 6, 14)), d(2025, 6, 1));
        assert_eq!(BudgetService::period_start(month, 25, d(2025, 6, 14)), d(2025, 5, 25));
        assert_eq!(BudgetService::period_start(month, 31, d(2025, 3, 2)), d(2025, 2, 28));
        // 2025-06-14 is a Saturday.
        assert_eq!(BudgetService::period_start(BudgetPeriod::Weekly, 1, d(2025, 6, 14)), d(2025, 6, 9));
        assert_eq!(BudgetService::period_start(BudgetPeriod::Weekly, 6, d(2025, 6, 14)), d(2025, 6, 14));
    }

    #[test]
    fn zero_limit_reports_zero_percent() {
        let fx = CurrencyConverter::default();
        let budget = monthly(d(2025, 3, 1), dec!(0), false);
        let txns = vec![food(d(2025, 3, 2), dec!(40))];
        let rows = BudgetService::progress(&fx, &budget, &[], &txns);
        assert_eq!(rows[0].percent, Decimal::ZERO);
        assert_eq!(rows[0].remaining, dec!(-40));
    }

    #[test]
    fn carry_forward_walks_back_through_flagged_periods() {
        let fx = CurrencyConverter::default();
        let january = monthly(d(2025, 1, 1), dec!(100), false);
        let february = monthly(d(2025, 2, 1), dec!(100), true);
        let march = monthly(d(2025, 3, 1), dec!(100), true);
        let budgets = vec![january, february, march.clone()];
        let txns = vec![
            food(d(2025, 1, 10), dec!(60)),
            food(d(2025, 2, 10), dec!(120)),
            food(d(2025, 3, 10), dec!(10)),
        ];
        // January leaves 40, February has 140 and spends 120, March inherits 20.
        let rows = BudgetService::progress(&fx, &march, &budgets, &txns);
        assert_eq!(rows[0].carried_forward, dec!(20));
        assert_eq!(rows[0].limit, dec!(120));
        assert_eq!(rows[0].spent, dec!(10));
    }

    #[test]
    fn overspent_predecessor_carries_nothing() {
        let fx = CurrencyConverter::default();
        let february = monthly(d(2025, 2, 1), dec!(50), false);
        let march = monthly(d(2025, 3, 1), dec!(100), true);
        let budgets = vec![february, march.clone()];
        let txns = vec![food(d(2025, 2, 3), dec!(80))];
        let rows = BudgetService::progress(&fx, &march, &budgets, &txns);
        assert_eq!(rows[0].carried_forward, Decimal::ZERO);
        assert_eq!(rows[0].limit, dec!(100));
    }

    #[test]
    fn validate_rejects_duplicate_categories() {
        let budget = monthly(d(2025, 3, 1), dec!(10), false)
            .with_allocation(CategoryAllocation::new("Food ", dec!(5)));
        assert!(BudgetService::validate(&budget).is_err());
    }
}
