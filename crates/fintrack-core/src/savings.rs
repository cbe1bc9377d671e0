use std::cmp::Reverse;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{money::round2, Contribution, CurrencyCode, SavingsGoal, SavingsPriority};

use crate::{
    currency::CurrencyConverter,
    error::{CoreError, CoreResult},
};

/// Progress row for one goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsStatus {
    pub goal_id: Uuid,
    pub label: String,
    pub priority: SavingsPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    pub currency: CurrencyCode,
    pub current_amount: Decimal,
    pub target_amount: Decimal,
    pub percent: Decimal,
}

pub struct SavingsService;

impl SavingsService {
    pub fn validate_goal(goal: &SavingsGoal) -> CoreResult<()> {
        if goal.label.trim().is_empty() {
            return Err(CoreError::invalid("savings goal label is required"));
        }
        if goal.target_amount <= Decimal::ZERO {
            return Err(CoreError::invalid("savings target must be positive"));
        }
        Ok(())
    }

    /// Sum of every contribution through the base currency, expressed in the
    /// goal's currency. Always computed from scratch.
    pub fn current_amount(fx: &CurrencyConverter, goal: &SavingsGoal) -> Decimal {
        let in_base: Decimal = goal
            .contributions
            .iter()
            .map(|entry| fx.to_base(entry.amount, &entry.currency))
            .sum();
        fx.from_base(round2(in_base), &goal.currency)
    }

    pub fn recompute(fx: &CurrencyConverter, goal: &mut SavingsGoal) -> Decimal {
        goal.current_amount = Self::current_amount(fx, goal);
        goal.current_amount
    }

    pub fn add_contribution(
        fx: &CurrencyConverter,
        goal: &mut SavingsGoal,
        mut contribution: Contribution,
    ) -> CoreResult<Decimal> {
        if contribution.amount <= Decimal::ZERO {
            return Err(CoreError::invalid("contribution amount must be positive"));
        }
        contribution.amount = round2(contribution.amount);
        goal.contributions.push(contribution);
        let current = Self::recompute(fx, goal);
        debug!(goal = %goal.id, %current, "added savings contribution");
        Ok(current)
    }

    pub fn remove_contribution(
        fx: &CurrencyConverter,
        goal: &mut SavingsGoal,
        contribution_id: Uuid,
    ) -> CoreResult<Contribution> {
        let index = goal
            .contributions
            .iter()
            .position(|entry| entry.id == contribution_id)
            .ok_or(CoreError::ContributionNotFound(contribution_id))?;
        let removed = goal.contributions.remove(index);
        let current = Self::recompute(fx, goal);
        debug!(goal = %goal.id, %current, "removed savings contribution");
        Ok(removed)
    }

    /// Progress rows with amounts recomputed, most urgent goal first: higher
    /// priority, then earlier target date (undated last), then label.
    pub fn overview(fx: &CurrencyConverter, goals: &[SavingsGoal]) -> Vec<SavingsStatus> {
        let mut ordered: Vec<&SavingsGoal> = goals.iter().collect();
        ordered.sort_by(|a, b| {
            Reverse(a.priority)
                .cmp(&Reverse(b.priority))
                .then_with(|| match (a.target_date, b.target_date) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.label.cmp(&b.label))
        });
        ordered
            .into_iter()
            .map(|goal| {
                let mut goal = goal.clone();
                Self::recompute(fx, &mut goal);
                SavingsStatus {
                    goal_id: goal.id,
                    percent: Self::progress_percent(&goal),
                    label: goal.label,
                    priority: goal.priority,
                    target_date: goal.target_date,
                    currency: goal.currency,
                    current_amount: goal.current_amount,
                    target_amount: goal.target_amount,
                }
            })
            .collect()
    }

    /// Progress toward the target in percent; zero for a zero target.
    pub fn progress_percent(goal: &SavingsGoal) -> Decimal {
        if goal.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round2(goal.current_amount / goal.target_amount * Decimal::ONE_HUNDRED)
    }
}
