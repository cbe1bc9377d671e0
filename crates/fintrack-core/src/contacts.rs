//! Per-contact receivable and payable totals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fintrack_domain::{
    money::round2, BillSplit, CurrencyCode, Loan, LoanDirection, Transaction, TransactionKind,
};

use crate::{currency::CurrencyConverter, loans::LoanService};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactBalance {
    pub currency: CurrencyCode,
    pub owed_to_you: Decimal,
    pub you_owe: Decimal,
    /// `owed_to_you - you_owe`.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactSummary {
    pub contact_id: Uuid,
    pub totals: Vec<ContactBalance>,
}

impl ContactSummary {
    pub fn in_currency(&self, currency: &CurrencyCode) -> Option<&ContactBalance> {
        self.totals.iter().find(|bucket| &bucket.currency == currency)
    }
}

#[derive(Default)]
struct Buckets {
    by_contact: BTreeMap<Uuid, Vec<ContactBalance>>,
}

impl Buckets {
    fn add(&mut self, contact_id: Uuid, currency: &CurrencyCode, owed_to_you: Decimal, you_owe: Decimal) {
        let buckets = self.by_contact.entry(contact_id).or_default();
        let index = match buckets.iter().position(|bucket| &bucket.currency == currency) {
            Some(index) => index,
            None => {
                buckets.push(ContactBalance {
                    currency: currency.clone(),
                    owed_to_you: Decimal::ZERO,
                    you_owe: Decimal::ZERO,
                    balance: Decimal::ZERO,
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[index];
        bucket.owed_to_you = round2(bucket.owed_to_you + owed_to_you);
        bucket.you_owe = round2(bucket.you_owe + you_owe);
        bucket.balance = round2(bucket.owed_to_you - bucket.you_owe);
    }
}

pub struct ContactService;

impl ContactService {
    /// Totals per contact and currency, seen from `self_contact`'s side.
    ///
    /// Contact-tagged expenses count as owed to you and income as owed by you.
    /// Open loans count by direction. Bill-split balances count against the
    /// payer when the current user is a participant, or against each
    /// participant when the current user paid. Other splits fall back to
    /// the participant's own outstanding amount.
    pub fn summaries(
        fx: &CurrencyConverter,
        self_contact: Uuid,
        transactions: &[Transaction],
        loans: &[Loan],
        bill_splits: &[BillSplit],
    ) -> Vec<ContactSummary> {
        let mut buckets = Buckets::default();

        for txn in transactions {
            let Some(contact_id) = txn.contact_id else {
                continue;
            };
            match txn.kind {
                TransactionKind::Expense => buckets.add(contact_id, &txn.currency, txn.amount, Decimal::ZERO),
                TransactionKind::Income => buckets.add(contact_id, &txn.currency, Decimal::ZERO, txn.amount),
                TransactionKind::Transfer => {}
            }
        }

        for loan in loans {
            let outstanding = LoanService::outstanding(fx, loan);
            if outstanding.is_zero() {
                continue;
            }
            match loan.direction {
                LoanDirection::Lent => buckets.add(loan.contact_id, &loan.currency, outstanding, Decimal::ZERO),
                LoanDirection::Borrowed => buckets.add(loan.contact_id, &loan.currency, Decimal::ZERO, outstanding),
            }
        }

        for split in bill_splits {
            for participant in &split.participants {
                let owed = participant.outstanding();
                if owed.is_zero() {
                    continue;
                }
                let (counterparty, receivable) = if split.payer_contact_id == self_contact {
                    if participant.contact_id == self_contact {
                        continue;
                    }
                    (participant.contact_id, true)
                } else if participant.contact_id == self_contact {
                    (split.payer_contact_id, false)
                } else if participant.contact_id != split.payer_contact_id {
                    (participant.contact_id, false)
                } else {
                    continue;
                };
                // An overpayment flips the direction of the balance.
                let (owed_to_you, you_owe) = if receivable == (owed > Decimal::ZERO) {
                    (owed.abs(), Decimal::ZERO)
                } else {
                    (Decimal::ZERO, owed.abs())
                };
                buckets.add(counterparty, &split.currency, owed_to_you, you_owe);
            }
        }

        buckets.by_contact.remove(&self_contact);
        buckets
            .by_contact
            .into_iter()
            .map(|(contact_id, totals)| ContactSummary { contact_id, totals })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill_split::{BillSplitService, NewBillSplit, SplitShares};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    fn split(payer: Uuid, members: Vec<Uuid>, total: Decimal) -> BillSplit {
        BillSplitService::create(NewBillSplit {
            description: "Lunch".into(),
            date: day(),
            currency: CurrencyCode::new("MVR"),
            total_amount: total,
            payer_contact_id: payer,
            shares: SplitShares::Equal(members),
        })
        .unwrap()
    }

    #[test]
    fn tagged_transactions_accumulate_per_currency() {
        let fx = CurrencyConverter::default();
        let me = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let txns = vec![
            Transaction::expense(Uuid::new_v4(), dec!(30), "MVR", day()).with_contact(friend),
            Transaction::income(Uuid::new_v4(), dec!(10), "MVR", day()).with_contact(friend),
            Transaction::expense(Uuid::new_v4(), dec!(5), "USD", day()).with_contact(friend),
        ];
        let summaries = ContactService::summaries(&fx, me, &txns, &[], &[]);
        assert_eq!(summaries.len(), 1);
        let mvr = summaries[0].in_currency(&CurrencyCode::new("MVR")).unwrap();
        assert_eq!(mvr.owed_to_you, dec!(30));
        assert_eq!(mvr.you_owe, dec!(10));
        assert_eq!(mvr.balance, dec!(20));
        assert_eq!(summaries[0].totals.len(), 2);
    }

    #[test]
    fn splits_paid_by_you_are_receivables() {
        let fx = CurrencyConverter::default();
        let me = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let splits = vec![split(me, vec![me, friend], dec!(60))];
        let summaries = ContactService::summaries(&fx, me, &[], &[], &splits);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].contact_id, friend);
        assert_eq!(summaries[0].totals[0].owed_to_you, dec!(30));
    }

    #[test]
    fn splits_paid_by_others_are_payables_to_the_payer() {
        let fx = CurrencyConverter::default();
        let me = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let splits = vec![split(friend, vec![friend, me], dec!(60))];
        let summaries = ContactService::summaries(&fx, me, &[], &[], &splits);
        let friend_summary = summaries.iter().find(|s| s.contact_id == friend).unwrap();
        assert_eq!(friend_summary.totals[0].you_owe, dec!(30));
        assert_eq!(friend_summary.totals[0].balance, dec!(-30));
    }
}
