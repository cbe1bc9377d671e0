//! Day-by-day cashflow projection in the base currency.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fintrack_domain::{
    calendar::{add_days, next_day_of_month},
    money::round2,
    Account, CreditCardDetails, CurrencyCode, Loan, LoanStatus, RecurringItem, Transaction,
    TransactionKind,
};

use crate::{currency::CurrencyConverter, recurrence::RecurrenceService};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Ok,
    Warning,
    Due,
}

impl Highlight {
    pub fn classify(inflow: Decimal, outflow: Decimal, net: Decimal, balance: Decimal) -> Self {
        if balance < Decimal::ZERO {
            Highlight::Due
        } else if outflow > inflow && net.abs() > inflow {
            Highlight::Warning
        } else {
            Highlight::Ok
        }
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Highlight::Ok => "ok",
            Highlight::Warning => "warning",
            Highlight::Due => "due",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub balance_projection: Decimal,
    pub highlight: Highlight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashflowForecast {
    pub currency: CurrencyCode,
    pub starting_balance: Decimal,
    pub entries: Vec<ForecastEntry>,
}

/// Read-only snapshot the projection runs over.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastInput<'a> {
    pub accounts: &'a [Account],
    pub transactions: &'a [Transaction],
    pub recurring: &'a [RecurringItem],
    pub loans: &'a [Loan],
}

#[derive(Debug, Default, Clone)]
struct DayTotals {
    inflow: Decimal,
    outflow: Decimal,
    loans_due: usize,
    cards_due: usize,
}

pub struct ForecastService;

impl ForecastService {
    /// Next occurrence of the card's due day on or after `today`.
    pub fn card_due_date(card: &CreditCardDetails, today: NaiveDate) -> NaiveDate {
        next_day_of_month(today, card.due_day)
    }

    pub fn starting_balance(fx: &CurrencyConverter, accounts: &[Account]) -> Decimal {
        accounts
            .iter()
            .filter(|account| account.is_active())
            .map(|account| fx.to_base(account.balance, &account.currency))
            .fold(Decimal::ZERO, |acc, amount| round2(acc + amount))
    }

    /// Projects `horizon_days` days starting at `today`. Pure: identical inputs
    /// produce identical output.
    pub fn project(
        fx: &CurrencyConverter,
        input: ForecastInput<'_>,
        today: NaiveDate,
        horizon_days: u32,
    ) -> CashflowForecast {
        let until = add_days(today, horizon_days as i64);
        let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

        for item in input.recurring {
            let amount = fx.to_base(item.amount, &item.currency);
            for date in RecurrenceService::occurrences(item, today, until) {
                let totals = days.entry(date).or_default();
                if item.is_income() {
                    totals.inflow = round2(totals.inflow + amount);
                } else {
                    totals.outflow = round2(totals.outflow + amount);
                }
            }
        }

        for loan in input.loans.iter().filter(|loan| loan.status != LoanStatus::Paid) {
            let mut counted: Vec<NaiveDate> = Vec::new();
            for entry in loan
                .schedule
                .iter()
                .filter(|entry| entry.due_date >= today && entry.due_date < until)
            {
                let totals = days.entry(entry.due_date).or_default();
                totals.outflow = round2(totals.outflow + fx.to_base(entry.installment(), &loan.currency));
                if !counted.contains(&entry.due_date) {
                    counted.push(entry.due_date);
                    totals.loans_due += 1;
                }
            }
        }

        for account in input.accounts.iter().filter(|account| account.is_active()) {
            let Some(card) = account.credit_card.as_ref().filter(|_| account.is_credit_card()) else {
                continue;
            };
            let due = Self::card_due_date(card, today);
            if due >= until {
                continue;
            }
            let totals = days.entry(due).or_default();
            let amount = account.balance.max(Decimal::ZERO);
            totals.outflow = round2(totals.outflow + fx.to_base(amount, &account.currency));
            totals.cards_due += 1;
        }

        for txn in input
            .transactions
            .iter()
            .filter(|txn| txn.date >= today && txn.date < until)
        {
            let amount = fx.to_base(txn.amount, &txn.currency);
            let totals = days.entry(txn.date).or_default();
            match txn.kind {
                TransactionKind::Income => totals.inflow = round2(totals.inflow + amount),
                TransactionKind::Expense => totals.outflow = round2(totals.outflow + amount),
                TransactionKind::Transfer => {}
            }
        }

        let starting_balance = Self::starting_balance(fx, input.accounts);
        let mut balance = starting_balance;
        let mut entries = Vec::with_capacity(horizon_days as usize);
        for offset in 0..horizon_days {
            let date = add_days(today, offset as i64);
            let totals = days.get(&date).cloned().unwrap_or_default();
            let net = round2(totals.inflow - totals.outflow);
            balance = round2(balance + net);
            entries.push(ForecastEntry {
                date,
                inflow: totals.inflow,
                outflow: totals.outflow,
                net,
                balance_projection: balance,
                highlight: Highlight::classify(totals.inflow, totals.outflow, net, balance),
                notes: notes_for(&totals),
            });
        }
        debug!(%today, horizon_days, %starting_balance, "projected cashflow");
        CashflowForecast {
            currency: fx.base().clone(),
            starting_balance,
            entries,
        }
    }
}

fn notes_for(totals: &DayTotals) -> Option<String> {
    let mut notes = Vec::new();
    if totals.loans_due > 0 {
        let plural = if totals.loans_due > 1 { "s" } else { "" };
        notes.push(format!("{} loan payment{}", totals.loans_due, plural));
    }
    if totals.cards_due > 0 {
        notes.push(format!("{} card due", totals.cards_due));
    }
    if notes.is_empty() {
        None
    } else {
        Some(notes.join(", "))
    }
}
