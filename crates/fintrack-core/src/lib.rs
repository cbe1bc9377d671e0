//! fintrack-core
//!
//! Finance engine services: currency conversion, amortization, balance
//! bookkeeping, bill splits, budgets, savings, recurrences, reminders and
//! forecasts.
//! Depends on fintrack-domain. Stateless: every service takes its data as
//! arguments and returns plain values. Persistence stays behind [`Repository`].

pub mod amortization;
pub mod bill_split;
pub mod budget;
pub mod contacts;
pub mod currency;
pub mod error;
pub mod forecast;
pub mod ledger;
pub mod loans;
pub mod recurrence;
pub mod reminders;
pub mod reports;
pub mod repository;
pub mod savings;
pub mod time;

pub use amortization::*;
pub use bill_split::*;
pub use budget::*;
pub use contacts::*;
pub use currency::*;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use forecast::*;
pub use ledger::*;
pub use loans::*;
pub use recurrence::*;
pub use reminders::*;
pub use reports::*;
pub use repository::*;
pub use savings::*;
pub use time::*;
