//! Caller-side workflows that pair a service call with the matching
//! repository writes.
//!
//! Each workflow loads the records it needs, runs the service against the
//! in-memory copies and only writes back once the service succeeded. A
//! rejected operation therefore leaves the stores untouched. Account balances
//! are written before the record that caused them; when a later write fails
//! the earlier ones are restored.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fintrack_core::{
    BudgetService, CoreError, CoreResult, InMemoryRepository, LedgerService, LoanService,
    NewBillSplit, NewLoan, RecurrenceService, Repository, SavingsService,
};
use fintrack_domain::{
    Account, BillSplit, BillSplitStatus, Budget, Contribution, LoanDirection, LoanHorizon,
    Loan, LoanPayment, LoanStatus, RecurringItem, SavingsGoal, Transaction, TransactionStatus,
};
use fintrack_storage_json::JsonStore;

use crate::{engine::FinanceEngine, errors::EngineResult};

/// One repository per record collection.
pub struct Repositories {
    pub accounts: Box<dyn Repository<Account>>,
    pub transactions: Box<dyn Repository<Transaction>>,
    pub loans: Box<dyn Repository<Loan>>,
    pub bill_splits: Box<dyn Repository<BillSplit>>,
    pub budgets: Box<dyn Repository<Budget>>,
    pub savings_goals: Box<dyn Repository<SavingsGoal>>,
    pub recurring: Box<dyn Repository<RecurringItem>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            accounts: Box::new(InMemoryRepository::new("accounts")),
            transactions: Box::new(InMemoryRepository::new("transactions")),
            loans: Box::new(InMemoryRepository::new("loans")),
            bill_splits: Box::new(InMemoryRepository::new("bill_splits")),
            budgets: Box::new(InMemoryRepository::new("budgets")),
            savings_goals: Box::new(InMemoryRepository::new("savings_goals")),
            recurring: Box::new(InMemoryRepository::new("recurring_items")),
        }
    }

    pub fn json(store: &JsonStore) -> Self {
        Self {
            accounts: Box::new(store.repository::<Account>()),
            transactions: Box::new(store.repository::<Transaction>()),
            loans: Box::new(store.repository::<Loan>()),
            bill_splits: Box::new(store.repository::<BillSplit>()),
            budgets: Box::new(store.repository::<Budget>()),
            savings_goals: Box::new(store.repository::<SavingsGoal>()),
            recurring: Box::new(store.repository::<RecurringItem>()),
        }
    }

    /// Loads every account the given transactions touch, once each.
    fn accounts_for(&self, txns: &[&Transaction]) -> EngineResult<Vec<Account>> {
        let mut accounts: Vec<Account> = Vec::new();
        for id in txns.iter().flat_map(|txn| txn.touched_accounts()) {
            if accounts.iter().any(|account| account.id == id) {
                continue;
            }
            let account = self
                .accounts
                .find_by_id(id)?
                .ok_or(CoreError::AccountNotFound(id))?;
            accounts.push(account);
        }
        Ok(accounts)
    }

    /// Writes `updated` in order. If one write fails, the accounts already
    /// written are put back to their `originals`.
    fn write_accounts(&self, originals: &[Account], updated: Vec<Account>) -> EngineResult<()> {
        for (written, account) in updated.into_iter().enumerate() {
            if let Err(err) = self.accounts.update(account) {
                self.restore_accounts(&originals[..written]);
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn restore_accounts(&self, originals: &[Account]) {
        for account in originals {
            if let Err(err) = self.accounts.update(account.clone()) {
                warn!(account = %account.id, error = %err, "failed to restore account");
            }
        }
    }

    /// Passes `result` through, restoring `originals` first when it failed.
    fn or_restore<T>(&self, originals: &[Account], result: CoreResult<T>) -> EngineResult<T> {
        result.map_err(|err| {
            self.restore_accounts(originals);
            err.into()
        })
    }
}

impl FinanceEngine {
    /// Applies `txn` to its accounts and stores it.
    pub fn create_transaction(&self, repos: &Repositories, txn: Transaction) -> EngineResult<Transaction> {
        LedgerService::validate(&txn)?;
        let originals = repos.accounts_for(&[&txn])?;
        let mut accounts = originals.clone();
        LedgerService::apply(self.converter(), &mut accounts, &txn)?;
        repos.write_accounts(&originals, accounts)?;
        let stored = repos.or_restore(&originals, repos.transactions.create(txn))?;
        info!(transaction = %stored.id, kind = %stored.kind, "created transaction");
        Ok(stored)
    }

    /// Replaces a stored transaction, moving balances from the old version to
    /// the new one. Edits to transactions dated before today are refused
    /// unless backdated edits are allowed.
    pub fn update_transaction(&self, repos: &Repositories, next: Transaction) -> EngineResult<Transaction> {
        let previous = repos.transactions.get(next.id)?;
        if !self.config().allow_backdated_edits {
            let today = self.today();
            if previous.date < today || next.date < today {
                return Err(CoreError::Validation("backdated edits are disabled".into()).into());
            }
        }
        let originals = repos.accounts_for(&[&previous, &next])?;
        let mut accounts = originals.clone();
        LedgerService::replace(self.converter(), &mut accounts, &previous, &next)?;
        repos.write_accounts(&originals, accounts)?;
        let stored = repos.or_restore(&originals, repos.transactions.update(next))?;
        debug!(transaction = %stored.id, "updated transaction");
        Ok(stored)
    }

    pub fn set_transaction_status(
        &self,
        repos: &Repositories,
        transaction_id: Uuid,
        status: TransactionStatus,
    ) -> EngineResult<Transaction> {
        let mut txn = repos.transactions.get(transaction_id)?;
        let originals = repos.accounts_for(&[&txn])?;
        let mut accounts = originals.clone();
        LedgerService::change_status(self.converter(), &mut accounts, &mut txn, status)?;
        repos.write_accounts(&originals, accounts)?;
        let stored = repos.or_restore(&originals, repos.transactions.update(txn))?;
        Ok(stored)
    }

    /// Reverses the transaction's balance effect and removes it.
    pub fn delete_transaction(&self, repos: &Repositories, transaction_id: Uuid) -> EngineResult<Transaction> {
        let txn = repos.transactions.get(transaction_id)?;
        let originals = repos.accounts_for(&[&txn])?;
        let mut accounts = originals.clone();
        LedgerService::reverse(self.converter(), &mut accounts, &txn)?;
        repos.write_accounts(&originals, accounts)?;
        let removed = repos.or_restore(&originals, repos.transactions.delete(transaction_id))?;
        info!(transaction = %removed.id, "deleted transaction");
        Ok(removed)
    }

    /// Runs a stored recurring item once. Returns the created transaction, if
    /// the item auto-creates one. When the advanced cursor cannot be stored,
    /// the transaction is removed again so the next run does not post it twice.
    pub fn run_recurring(&self, repos: &Repositories, item_id: Uuid) -> EngineResult<Option<Transaction>> {
        let mut item = repos.recurring.get(item_id)?;
        let run_date = item.next_run_date;
        let Some(txn) = RecurrenceService::run(&mut item, run_date)? else {
            return Ok(None);
        };
        let stored = self.create_transaction(repos, txn)?;
        if let Err(err) = repos.recurring.update(item) {
            if let Err(undo) = self.delete_transaction(repos, stored.id) {
                warn!(transaction = %stored.id, error = %undo, "failed to undo recurring transaction");
            }
            return Err(err.into());
        }
        Ok(Some(stored))
    }

    pub fn add_savings_contribution(
        &self,
        repos: &Repositories,
        goal_id: Uuid,
        contribution: Contribution,
    ) -> EngineResult<SavingsGoal> {
        let mut goal = repos.savings_goals.get(goal_id)?;
        SavingsService::add_contribution(self.converter(), &mut goal, contribution)?;
        Ok(repos.savings_goals.update(goal)?)
    }

    pub fn delete_savings_contribution(
        &self,
        repos: &Repositories,
        goal_id: Uuid,
        contribution_id: Uuid,
    ) -> EngineResult<SavingsGoal> {
        let mut goal = repos.savings_goals.get(goal_id)?;
        SavingsService::remove_contribution(self.converter(), &mut goal, contribution_id)?;
        Ok(repos.savings_goals.update(goal)?)
    }

    pub fn store_loan(&self, repos: &Repositories, input: NewLoan) -> EngineResult<Loan> {
        let loan = self.create_loan(input)?;
        Ok(repos.loans.create(loan)?)
    }

    pub fn record_loan_payment(
        &self,
        repos: &Repositories,
        loan_id: Uuid,
        payment: LoanPayment,
    ) -> EngineResult<LoanStatus> {
        let mut loan = repos.loans.get(loan_id)?;
        let status = LoanService::record_payment(self.converter(), &mut loan, payment, self.today())?;
        repos.loans.update(loan)?;
        Ok(status)
    }

    /// Stores a new split. When someone else paid and the current user owes
    /// a share, a short-term borrowed loan to the payer is stored with it.
    pub fn store_bill_split(
        &self,
        repos: &Repositories,
        input: NewBillSplit,
    ) -> EngineResult<(BillSplit, Option<Loan>)> {
        let split = self.create_bill_split(input)?;
        let receivable = match bill_split_receivable(&split, self.self_contact()) {
            Some(request) => Some(self.create_loan(request)?),
            None => None,
        };
        let split = repos.bill_splits.create(split)?;
        let receivable = match receivable {
            Some(loan) => match repos.loans.create(loan) {
                Ok(loan) => Some(loan),
                Err(err) => {
                    if let Err(undo) = repos.bill_splits.delete(split.id) {
                        warn!(split = %split.id, error = %undo, "failed to undo bill split");
                    }
                    return Err(err.into());
                }
            },
            None => None,
        };
        Ok((split, receivable))
    }

    /// Validates and stores a budget.
    pub fn store_budget(&self, repos: &Repositories, budget: Budget) -> EngineResult<Budget> {
        BudgetService::validate(&budget)?;
        Ok(repos.budgets.create(budget)?)
    }

    /// Replaces a stored budget. A locked budget only accepts being unlocked.
    pub fn update_budget(&self, repos: &Repositories, next: Budget) -> EngineResult<Budget> {
        let previous = repos.budgets.get(next.id)?;
        BudgetService::check_edit(&previous, &next)?;
        Ok(repos.budgets.update(next)?)
    }

    pub fn delete_budget(&self, repos: &Repositories, budget_id: Uuid) -> EngineResult<Budget> {
        let budget = repos.budgets.get(budget_id)?;
        BudgetService::check_delete(&budget)?;
        Ok(repos.budgets.delete(budget_id)?)
    }

    pub fn settle_bill_split_share(
        &self,
        repos: &Repositories,
        split_id: Uuid,
        contact_id: Uuid,
        paid: Decimal,
    ) -> EngineResult<BillSplitStatus> {
        let mut split = repos.bill_splits.get(split_id)?;
        let status = self.record_bill_split_payment(&mut split, contact_id, paid)?;
        repos.bill_splits.update(split)?;
        Ok(status)
    }
}

/// Loan request for the current user's unpaid share of a split someone else
/// paid for. `None` when the user paid, is not a participant, or owes nothing.
pub fn bill_split_receivable(split: &BillSplit, self_contact: Uuid) -> Option<NewLoan> {
    if split.payer_contact_id == self_contact {
        return None;
    }
    let owed = split.participant(self_contact)?.outstanding();
    if owed <= Decimal::ZERO {
        return None;
    }
    Some(NewLoan {
        label: format!("Bill split: {}", split.description),
        contact_id: split.payer_contact_id,
        direction: LoanDirection::Borrowed,
        horizon: LoanHorizon::ShortTerm,
        principal: owed,
        currency: split.currency.clone(),
        interest_rate: Decimal::ZERO,
        term_months: 1,
        start_date: split.date,
    })
}
