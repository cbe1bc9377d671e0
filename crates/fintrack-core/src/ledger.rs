//! Balance bookkeeping for transactions.
//!
//! Every mutation is planned first as a list of [`BalanceEffect`]s against an
//! immutable view of the accounts, then committed in one pass. A rejected
//! transaction therefore never leaves a partially applied balance behind.

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    money::round2, Account, CurrencyCode, Transaction, TransactionKind, TransactionStatus,
};

use crate::{
    currency::CurrencyConverter,
    error::{CoreError, CoreResult},
};

/// Whether a transaction's effect is being added to or removed from balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Reverse,
}

impl Direction {
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Apply => Decimal::ONE,
            Direction::Reverse => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Signed change to one account. `card_delta` moves the credit-card pending
/// balance up and the available credit down by the same amount.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEffect {
    pub account_id: Uuid,
    pub balance_delta: Decimal,
    pub card_delta: Decimal,
}

pub struct LedgerService;

impl LedgerService {
    /// Adds the transaction's effect to the touched accounts.
    pub fn apply(
        fx: &CurrencyConverter,
        accounts: &mut [Account],
        txn: &Transaction,
    ) -> CoreResult<()> {
        Self::post(fx, accounts, txn, Direction::Apply)
    }

    /// Removes the transaction's effect; the exact inverse of [`Self::apply`].
    pub fn reverse(
        fx: &CurrencyConverter,
        accounts: &mut [Account],
        txn: &Transaction,
    ) -> CoreResult<()> {
        Self::post(fx, accounts, txn, Direction::Reverse)
    }

    pub fn post(
        fx: &CurrencyConverter,
        accounts: &mut [Account],
        txn: &Transaction,
        direction: Direction,
    ) -> CoreResult<()> {
        let effects = Self::effects(fx, accounts, txn, direction)?;
        commit(accounts, &effects);
        debug!(
            transaction = %txn.id,
            kind = %txn.kind,
            ?direction,
            accounts = effects.len(),
            "posted transaction to ledger"
        );
        Ok(())
    }

    /// Moves a transaction to `status` as reverse-then-apply, so balances stay
    /// consistent whatever the status transition.
    pub fn change_status(
        fx: &CurrencyConverter,
        accounts: &mut [Account],
        txn: &mut Transaction,
        status: TransactionStatus,
    ) -> CoreResult<()> {
        if txn.status == status {
            return Ok(());
        }
        let mut updated = txn.clone();
        updated.status = status;
        Self::replace(fx, accounts, txn, &updated)?;
        txn.status = status;
        Ok(())
    }

    /// Swaps `previous` for `next` in one step. Both sides are validated before
    /// any balance moves.
    pub fn replace(
        fx: &CurrencyConverter,
        accounts: &mut [Account],
        previous: &Transaction,
        next: &Transaction,
    ) -> CoreResult<()> {
        let mut effects = Self::effects(fx, accounts, previous, Direction::Reverse)?;
        effects.extend(Self::effects(fx, accounts, next, Direction::Apply)?);
        commit(accounts, &effects);
        debug!(previous = %previous.id, next = %next.id, "replaced transaction in ledger");
        Ok(())
    }

    /// Plans the balance changes for `txn` without touching any account.
    pub fn effects(
        fx: &CurrencyConverter,
        accounts: &[Account],
        txn: &Transaction,
        direction: Direction,
    ) -> CoreResult<Vec<BalanceEffect>> {
        Self::validate(txn)?;
        let sign = direction.sign();
        match txn.kind {
            TransactionKind::Income | TransactionKind::Expense => {
                let account_id = txn.account_id.ok_or_else(|| {
                    CoreError::invalid("account is required for income and expense transactions")
                })?;
                let account = find(accounts, account_id)?;
                let amount = amount_for_account(fx, txn, &account.currency);
                let signed = match txn.kind {
                    TransactionKind::Income => amount,
                    _ => -amount,
                };
                let card_delta = if txn.kind == TransactionKind::Expense && account.is_credit_card() {
                    sign * amount
                } else {
                    Decimal::ZERO
                };
                Ok(vec![BalanceEffect {
                    account_id,
                    balance_delta: sign * signed,
                    card_delta,
                }])
            }
            TransactionKind::Transfer => {
                let (from_id, to_id) = match (txn.from_account_id, txn.to_account_id) {
                    (Some(from), Some(to)) => (from, to),
                    _ => {
                        return Err(CoreError::invalid(
                            "transfers require both a source and a destination account",
                        ))
                    }
                };
                let from = find(accounts, from_id)?;
                let to = find(accounts, to_id)?;
                let debit = amount_for_account(fx, txn, &from.currency);
                let credit = transfer_credit(fx, txn, &to.currency);
                Ok(vec![
                    BalanceEffect {
                        account_id: from_id,
                        balance_delta: -(sign * debit),
                        card_delta: Decimal::ZERO,
                    },
                    BalanceEffect {
                        account_id: to_id,
                        balance_delta: sign * credit,
                        card_delta: Decimal::ZERO,
                    },
                ])
            }
        }
    }

    /// Field-level checks shared by every ledger entry point.
    pub fn validate(txn: &Transaction) -> CoreResult<()> {
        if txn.amount <= Decimal::ZERO {
            return Err(CoreError::invalid("transaction amount must be positive"));
        }
        if txn.currency.is_empty() {
            return Err(CoreError::invalid("transaction currency is required"));
        }
        if matches!(txn.counter_amount, Some(value) if value <= Decimal::ZERO) {
            return Err(CoreError::invalid("counter amount must be positive"));
        }
        if matches!(txn.account_amount, Some(value) if value <= Decimal::ZERO) {
            return Err(CoreError::invalid("account amount must be positive"));
        }
        match txn.kind {
            TransactionKind::Income | TransactionKind::Expense => {
                if txn.account_id.is_none() {
                    return Err(CoreError::invalid(
                        "account is required for income and expense transactions",
                    ));
                }
            }
            TransactionKind::Transfer => match (txn.from_account_id, txn.to_account_id) {
                (Some(from), Some(to)) if from == to => {
                    return Err(CoreError::invalid(
                        "transfer source and destination must differ",
                    ));
                }
                (Some(_), Some(_)) => {}
                _ => {
                    return Err(CoreError::invalid(
                        "transfers require both a source and a destination account",
                    ));
                }
            },
        }
        Ok(())
    }
}

fn find(accounts: &[Account], id: Uuid) -> CoreResult<&Account> {
    accounts
        .iter()
        .find(|account| account.id == id)
        .ok_or(CoreError::AccountNotFound(id))
}

/// Amount expressed in the account's currency. A stored override wins over a
/// live conversion when the currencies differ.
fn amount_for_account(fx: &CurrencyConverter, txn: &Transaction, currency: &CurrencyCode) -> Decimal {
    if &txn.currency == currency {
        return round2(txn.amount);
    }
    match txn.account_amount {
        Some(explicit) => round2(explicit),
        None => fx.convert(txn.amount, &txn.currency, currency),
    }
}

fn transfer_credit(fx: &CurrencyConverter, txn: &Transaction, currency: &CurrencyCode) -> Decimal {
    match (txn.counter_amount, txn.counter_currency.as_ref()) {
        (Some(amount), Some(counter)) => fx.convert(amount, counter, currency),
        // A bare counter amount is already in the destination currency.
        (Some(amount), None) => round2(amount),
        (None, _) => fx.convert(txn.amount, &txn.currency, currency),
    }
}

fn commit(accounts: &mut [Account], effects: &[BalanceEffect]) {
    for effect in effects {
        let Some(account) = accounts.iter_mut().find(|account| account.id == effect.account_id) else {
            continue;
        };
        account.balance = round2(account.balance + effect.balance_delta);
        if effect.card_delta.is_zero() {
            continue;
        }
        if let Some(card) = account.credit_card.as_mut() {
            card.pending_balance = round2(card.pending_balance + effect.card_delta);
            card.available_credit = round2(card.available_credit - effect.card_delta);
        }
    }
}
