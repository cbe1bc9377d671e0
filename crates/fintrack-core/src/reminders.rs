//! Upcoming obligations: card due dates, loan installments and open bill splits.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    calendar::add_days, Account, BillSplit, BillSplitStatus, CurrencyCode, Loan, LoanStatus,
};

use crate::{currency::CurrencyConverter, forecast::ForecastService, loans::LoanService};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    CreditCardDue,
    LoanPayment,
    BillSplit,
}

/// Which reminder kinds are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFilter {
    pub credit_card_due: bool,
    pub loan_payments: bool,
    pub bill_splits: bool,
}

impl Default for ReminderFilter {
    fn default() -> Self {
        Self {
            credit_card_due: true,
            loan_payments: true,
            bill_splits: true,
        }
    }
}

impl ReminderFilter {
    pub fn allows(&self, kind: ReminderKind) -> bool {
        match kind {
            ReminderKind::CreditCardDue => self.credit_card_due,
            ReminderKind::LoanPayment => self.loan_payments,
            ReminderKind::BillSplit => self.bill_splits,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub kind: ReminderKind,
    /// Account, loan or bill split the reminder is about.
    pub reference_id: Uuid,
    pub label: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

pub struct ReminderService;

impl ReminderService {
    /// Reminders due before `today + horizon_days`, oldest first.
    ///
    /// Cards remind for their pending balance on the next due day. Loans remind
    /// for the first installment payments do not yet cover, including overdue
    /// ones. Unsettled bill splits remind for their outstanding total from the
    /// split date.
    pub fn upcoming(
        fx: &CurrencyConverter,
        accounts: &[Account],
        loans: &[Loan],
        bill_splits: &[BillSplit],
        filter: ReminderFilter,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Vec<Reminder> {
        let until = add_days(today, horizon_days as i64);
        let mut reminders = Vec::new();

        if filter.allows(ReminderKind::CreditCardDue) {
            for account in accounts.iter().filter(|account| account.is_active()) {
                let Some(card) = account.credit_card.as_ref().filter(|_| account.is_credit_card()) else {
                    continue;
                };
                if card.pending_balance <= Decimal::ZERO {
                    continue;
                }
                let due_date = ForecastService::card_due_date(card, today);
                if due_date >= until {
                    continue;
                }
                reminders.push(Reminder {
                    kind: ReminderKind::CreditCardDue,
                    reference_id: account.id,
                    label: account.name.clone(),
                    due_date,
                    amount: card.pending_balance,
                    currency: account.currency.clone(),
                });
            }
        }

        if filter.allows(ReminderKind::LoanPayment) {
            for loan in loans.iter().filter(|loan| loan.status != LoanStatus::Paid) {
                let Some(entry) = LoanService::next_due(fx, loan) else {
                    continue;
                };
                if entry.due_date >= until {
                    continue;
                }
                reminders.push(Reminder {
                    kind: ReminderKind::LoanPayment,
                    reference_id: loan.id,
                    label: loan.label.clone(),
                    due_date: entry.due_date,
                    amount: entry.installment(),
                    currency: loan.currency.clone(),
                });
            }
        }

        if filter.allows(ReminderKind::BillSplit) {
            for split in bill_splits
                .iter()
                .filter(|split| split.status != BillSplitStatus::Settled)
            {
                let amount = split.total_outstanding();
                if amount <= Decimal::ZERO {
                    continue;
                }
                reminders.push(Reminder {
                    kind: ReminderKind::BillSplit,
                    reference_id: split.id,
                    label: split.description.clone(),
                    due_date: split.date,
                    amount,
                    currency: split.currency.clone(),
                });
            }
        }

        reminders.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.kind.cmp(&b.kind)));
        debug!(%today, horizon_days, count = reminders.len(), "collected reminders");
        reminders
    }
}
