//! Expansion and execution of recurring items.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use fintrack_domain::{
    RecurringItem, RecurringKind, Transaction, TransactionSource, TransactionStatus,
};

use crate::error::{CoreError, CoreResult};

pub struct RecurrenceService;

impl RecurrenceService {
    pub fn validate(item: &RecurringItem) -> CoreResult<()> {
        if item.amount <= Decimal::ZERO {
            return Err(CoreError::invalid("recurring amount must be positive"));
        }
        if item.currency.is_empty() {
            return Err(CoreError::invalid("recurring currency is required"));
        }
        if let Some(day) = item.recurrence.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(CoreError::invalid("day of month must be between 1 and 31"));
            }
        }
        Ok(())
    }

    /// Dates in `[from, until)` produced by stepping the cadence forward from
    /// the item's cursor. A stale cursor is fast-forwarded to `from` first.
    pub fn occurrences(item: &RecurringItem, from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut cursor = item.recurrence.fast_forward(item.next_run_date, from);
        while cursor < until {
            if cursor >= from {
                dates.push(cursor);
            }
            let next = item.recurrence.next_date(cursor);
            if next <= cursor {
                break;
            }
            cursor = next;
        }
        dates
    }

    /// Moves the cursor one cadence step forward and returns the new date.
    pub fn advance(item: &mut RecurringItem) -> NaiveDate {
        item.next_run_date = item.recurrence.next_date(item.next_run_date);
        item.next_run_date
    }

    /// Executes one run. Items without auto-creation yield `None` and keep
    /// their cursor. Otherwise a pending transaction is produced and the cursor
    /// advances.
    pub fn run(item: &mut RecurringItem, run_date: NaiveDate) -> CoreResult<Option<Transaction>> {
        if !item.auto_create_transaction {
            return Ok(None);
        }
        Self::validate(item)?;
        let account_id = item
            .account_id
            .ok_or_else(|| CoreError::invalid("recurring item has no account"))?;
        let txn = match item.kind {
            RecurringKind::Income => Transaction::income(account_id, item.amount, item.currency.clone(), run_date),
            RecurringKind::Expense => Transaction::expense(account_id, item.amount, item.currency.clone(), run_date),
            RecurringKind::Transfer | RecurringKind::Payment => {
                let to_account_id = item.to_account_id.ok_or_else(|| {
                    CoreError::invalid("recurring transfer has no destination account")
                })?;
                Transaction::transfer(account_id, to_account_id, item.amount, item.currency.clone(), run_date)
            }
        };
        let mut txn = txn
            .with_status(TransactionStatus::Pending)
            .with_source(TransactionSource::Recurring);
        txn.category = item.category.clone();
        txn.contact_id = item.contact_id;
        txn.description = Some(item.label.clone());

        let next = Self::advance(item);
        debug!(item = %item.id, %run_date, %next, "ran recurring item");
        Ok(Some(txn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_domain::{Cadence, RecurrenceRule, TransactionKind};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekly(kind: RecurringKind) -> RecurringItem {
        RecurringItem::new(
            "Groceries",
            kind,
            dec!(75),
            "MVR",
            d(2025, 3, 3),
            RecurrenceRule::new(Cadence::Weekly, 1),
        )
    }

    #[test]
    fn occurrences_are_bounded_by_window() {
        let item = weekly(RecurringKind::Expense);
        let dates = RecurrenceService::occurrences(&item, d(2025, 3, 5), d(2025, 3, 24));
        assert_eq!(dates, vec![d(2025, 3, 10), d(2025, 3, 17)]);
    }

    #[test]
    fn stale_daily_cursor_still_reaches_the_window() {
        let mut item = weekly(RecurringKind::Expense);
        item.recurrence = RecurrenceRule::new(Cadence::Daily, 3);
        item.next_run_date = d(1990, 1, 1);
        let dates = RecurrenceService::occurrences(&item, d(2025, 3, 1), d(2025, 3, 8));
        assert_eq!(dates.len(), 3);
        assert!(dates.windows(2).all(|pair| (pair[1] - pair[0]).num_days() == 3));
        let offset = (dates[0] - d(1990, 1, 1)).num_days();
        assert_eq!(offset % 3, 0);
        assert!(dates[0] >= d(2025, 3, 1) && dates[0] < d(2025, 3, 4));
    }

    #[test]
    fn stale_monthly_cursor_keeps_clamped_days() {
        let mut item = weekly(RecurringKind::Expense);
        item.recurrence = RecurrenceRule::new(Cadence::Monthly, 1);
        item.next_run_date = d(2001, 1, 31);
        let dates = RecurrenceService::occurrences(&item, d(2025, 3, 1), d(2025, 5, 1));
        assert_eq!(dates, vec![d(2025, 3, 28), d(2025, 4, 28)]);
    }

    #[test]
    fn run_without_auto_create_keeps_cursor() {
        let mut item = weekly(RecurringKind::Expense).with_account(Uuid::new_v4());
        assert!(RecurrenceService::run(&mut item, d(2025, 3, 3)).unwrap().is_none());
        assert_eq!(item.next_run_date, d(2025, 3, 3));
    }

    #[test]
    fn run_creates_pending_transaction_and_advances() {
        let account = Uuid::new_v4();
        let mut item = weekly(RecurringKind::Expense).with_account(account).auto_creating();
        let txn = RecurrenceService::run(&mut item, d(2025, 3, 3)).unwrap().unwrap();
        assert_eq!(txn.kind, TransactionKind::Expense);
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.source, TransactionSource::Recurring);
        assert_eq!(txn.account_id, Some(account));
        assert_eq!(item.next_run_date, d(2025, 3, 10));
    }

    #[test]
    fn payments_become_transfers_and_need_destination() {
        let mut item = weekly(RecurringKind::Payment)
            .with_account(Uuid::new_v4())
            .auto_creating();
        assert!(RecurrenceService::run(&mut item, d(2025, 3, 3)).is_err());
        assert_eq!(item.next_run_date, d(2025, 3, 3));

        let mut item = item.with_destination(Uuid::new_v4());
        let txn = RecurrenceService::run(&mut item, d(2025, 3, 3)).unwrap().unwrap();
        assert_eq!(txn.kind, TransactionKind::Transfer);
    }
}
