//! fintrack-domain
//!
//! Pure finance data model (accounts, transactions, loans, bill splits, budgets,
//! savings goals, recurring items) plus money and calendar helpers.
//! No I/O, no storage. Only data types and the derived-field rules that belong to them.

pub mod account;
pub mod bill_split;
pub mod budget;
pub mod calendar;
pub mod common;
pub mod loan;
pub mod money;
pub mod recurring;
pub mod savings;
pub mod transaction;

pub use account::*;
pub use bill_split::*;
pub use budget::*;
pub use common::*;
pub use loan::*;
pub use money::*;
pub use recurring::*;
pub use savings::*;
pub use transaction::*;
