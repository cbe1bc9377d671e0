//! Fixed-schedule loan repayment tables.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, error};

use fintrack_domain::{calendar::shift_month, money::round2, AmortizationEntry};

use crate::error::{CoreError, CoreResult};

const MONTHS_PER_YEAR: i64 = 12;

pub struct AmortizationService;

impl AmortizationService {
    /// Monthly rate as a fraction; zero for interest-free loans.
    pub fn monthly_rate(annual_rate_pct: Decimal) -> Decimal {
        if annual_rate_pct <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        annual_rate_pct / Decimal::ONE_HUNDRED / Decimal::from(MONTHS_PER_YEAR)
    }

    /// Level installment for the loan, rounded to cents. Straight-line when the
    /// rate is zero.
    pub fn monthly_payment(
        principal: Decimal,
        annual_rate_pct: Decimal,
        term_months: u32,
    ) -> CoreResult<Decimal> {
        if term_months == 0 {
            return Ok(Decimal::ZERO);
        }
        let rate = Self::monthly_rate(annual_rate_pct);
        if rate.is_zero() {
            return Ok(round2(principal / Decimal::from(term_months)));
        }
        let growth = compound(Decimal::ONE + rate, term_months)?;
        let denominator = growth - Decimal::ONE;
        if denominator <= Decimal::ZERO {
            return Err(CoreError::Consistency(format!(
                "annuity factor collapsed for rate {annual_rate_pct}% over {term_months} months"
            )));
        }
        Ok(round2(principal * rate * growth / denominator))
    }

    /// Builds the full schedule. Returns an empty schedule when the principal or
    /// term is not positive.
    ///
    /// The last entry always closes at a zero balance and absorbs any rounding
    /// residue, so the principal column sums to `principal` exactly.
    pub fn build(
        principal: Decimal,
        annual_rate_pct: Decimal,
        term_months: u32,
        start_date: NaiveDate,
    ) -> CoreResult<Vec<AmortizationEntry>> {
        if principal <= Decimal::ZERO || term_months == 0 {
            return Ok(Vec::new());
        }
        if annual_rate_pct < Decimal::ZERO {
            return Err(CoreError::invalid("interest rate cannot be negative"));
        }
        let principal = round2(principal);
        let rate = Self::monthly_rate(annual_rate_pct);
        let payment = Self::monthly_payment(principal, annual_rate_pct, term_months)?;

        let mut balance = principal;
        let mut schedule = Vec::with_capacity(term_months as usize);
        for period in 1..=term_months {
            let interest = round2(balance * rate);
            let scheduled = if rate.is_zero() {
                payment
            } else {
                round2(payment - interest)
            };
            let principal_portion = scheduled.max(Decimal::ZERO).min(balance);
            balance = round2(balance - principal_portion);
            schedule.push(AmortizationEntry {
                period,
                due_date: shift_month(start_date, period as i32 - 1),
                interest,
                principal: principal_portion,
                balance,
            });
        }

        close_final_period(&mut schedule, principal)?;
        debug!(
            %principal,
            rate = %annual_rate_pct,
            term_months,
            %payment,
            "built amortization schedule"
        );
        Ok(schedule)
    }
}

fn compound(factor: Decimal, periods: u32) -> CoreResult<Decimal> {
    (0..periods).try_fold(Decimal::ONE, |acc, _| {
        acc.checked_mul(factor).ok_or_else(|| {
            CoreError::Consistency(format!("compound factor overflow after {periods} periods"))
        })
    })
}

fn close_final_period(schedule: &mut [AmortizationEntry], principal: Decimal) -> CoreResult<()> {
    let Some(last) = schedule.last_mut() else {
        return Ok(());
    };
    let residual = last.balance;
    if residual < Decimal::ZERO {
        error!(%residual, "amortization closed below zero");
        return Err(CoreError::Consistency(format!(
            "schedule balance went negative by {}",
            residual.abs()
        )));
    }
    last.principal = round2(last.principal + residual);
    last.balance = Decimal::ZERO;

    let total: Decimal = schedule.iter().map(|entry| entry.principal).sum();
    if total != principal {
        error!(%total, %principal, "amortization principal mismatch");
        return Err(CoreError::Consistency(format!(
            "schedule principal {total} does not match loan principal {principal}"
        )));
    }
    Ok(())
}
