//! Loan creation, repayment tracking and derived status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    money::round2,
    AmortizationEntry, CurrencyCode, Loan, LoanDirection, LoanHorizon, LoanPayment, LoanStatus,
};

use crate::{
    amortization::AmortizationService,
    currency::CurrencyConverter,
    error::{CoreError, CoreResult},
};

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub label: String,
    pub contact_id: Uuid,
    pub direction: LoanDirection,
    pub horizon: LoanHorizon,
    pub principal: Decimal,
    pub currency: CurrencyCode,
    pub interest_rate: Decimal,
    pub term_months: u32,
    pub start_date: NaiveDate,
}

pub struct LoanService;

impl LoanService {
    /// Validates the request and builds the schedule once. Short-term loans are
    /// amortized over a single period.
    pub fn create(input: NewLoan) -> CoreResult<Loan> {
        if input.principal <= Decimal::ZERO {
            return Err(CoreError::invalid("principal must be greater than zero"));
        }
        if input.horizon == LoanHorizon::LongTerm && input.term_months == 0 {
            return Err(CoreError::invalid("term must be greater than zero"));
        }
        if input.interest_rate < Decimal::ZERO {
            return Err(CoreError::invalid("interest rate cannot be negative"));
        }
        let term_months = input.horizon.effective_term(input.term_months);
        let principal = round2(input.principal);
        let schedule = AmortizationService::build(
            principal,
            input.interest_rate,
            term_months,
            input.start_date,
        )?;
        let label = match input.label.trim() {
            "" => "Loan".to_string(),
            trimmed => trimmed.to_string(),
        };
        let loan = Loan {
            id: Uuid::new_v4(),
            label,
            contact_id: input.contact_id,
            direction: input.direction,
            horizon: input.horizon,
            principal,
            currency: input.currency,
            interest_rate: input.interest_rate,
            term_months,
            start_date: input.start_date,
            status: LoanStatus::Active,
            payments: Vec::new(),
            schedule,
        };
        debug!(loan = %loan.id, %principal, term_months, "created loan");
        Ok(loan)
    }

    /// Total of every installment, or the principal when no schedule is stored.
    pub fn scheduled_total(loan: &Loan) -> Decimal {
        if loan.schedule.is_empty() {
            return round2(loan.principal);
        }
        round2(loan.schedule.iter().map(AmortizationEntry::installment).sum())
    }

    /// Payments expressed in the loan currency.
    pub fn total_paid(fx: &CurrencyConverter, loan: &Loan) -> Decimal {
        loan.payments
            .iter()
            .map(|payment| fx.convert(payment.amount, &payment.currency, &loan.currency))
            .fold(Decimal::ZERO, |acc, amount| round2(acc + amount))
    }

    pub fn outstanding(fx: &CurrencyConverter, loan: &Loan) -> Decimal {
        (Self::scheduled_total(loan) - Self::total_paid(fx, loan)).max(Decimal::ZERO)
    }

    /// First installment that cumulative payments do not yet cover.
    pub fn next_due<'a>(fx: &CurrencyConverter, loan: &'a Loan) -> Option<&'a AmortizationEntry> {
        let paid = Self::total_paid(fx, loan);
        let mut covered = Decimal::ZERO;
        loan.schedule.iter().find(|entry| {
            covered = round2(covered + entry.installment());
            covered > paid
        })
    }

    pub fn derive_status(fx: &CurrencyConverter, loan: &Loan, today: NaiveDate) -> LoanStatus {
        if Self::outstanding(fx, loan).is_zero() {
            return LoanStatus::Paid;
        }
        match Self::next_due(fx, loan) {
            Some(entry) if entry.due_date < today => LoanStatus::Overdue,
            _ => LoanStatus::Active,
        }
    }

    /// Re-derives and stores the loan status.
    pub fn refresh_status(fx: &CurrencyConverter, loan: &mut Loan, today: NaiveDate) -> LoanStatus {
        loan.status = Self::derive_status(fx, loan, today);
        loan.status
    }

    pub fn record_payment(
        fx: &CurrencyConverter,
        loan: &mut Loan,
        mut payment: LoanPayment,
        today: NaiveDate,
    ) -> CoreResult<LoanStatus> {
        if payment.amount <= Decimal::ZERO {
            return Err(CoreError::invalid("payment amount must be positive"));
        }
        payment.amount = round2(payment.amount);
        payment.note = payment
            .note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());
        loan.payments.push(payment);
        let status = Self::refresh_status(fx, loan, today);
        debug!(loan = %loan.id, %status, "recorded loan payment");
        Ok(status)
    }
}
