//! Shared expenses divided among contacts.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::Identifiable;
use crate::money::{round2, CurrencyCode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillSplit {
    pub id: Uuid,
    pub description: String,
    pub date: NaiveDate,
    pub currency: CurrencyCode,
    pub total_amount: Decimal,
    pub payer_contact_id: Uuid,
    pub participants: Vec<Participant>,
    pub status: BillSplitStatus,
}

impl BillSplit {
    pub fn participant(&self, contact_id: Uuid) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.contact_id == contact_id)
    }

    pub fn participant_mut(&mut self, contact_id: Uuid) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|participant| participant.contact_id == contact_id)
    }

    /// Re-derives `status` from the participants. Call after every mutation.
    pub fn recompute_status(&mut self) -> BillSplitStatus {
        self.status = BillSplitStatus::derive(&self.participants);
        self.status
    }

    pub fn total_outstanding(&self) -> Decimal {
        self.participants
            .iter()
            .map(Participant::outstanding)
            .filter(|owed| owed.is_sign_positive())
            .fold(Decimal::ZERO, |acc, owed| round2(acc + owed))
    }
}

impl Identifiable for BillSplit {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub contact_id: Uuid,
    /// What the participant owes toward the total.
    pub share: Decimal,
    /// What the participant has settled so far.
    pub paid: Decimal,
}

impl Participant {
    /// `share - paid`, rounded to cents. Negative when overpaid.
    pub fn outstanding(&self) -> Decimal {
        round2(self.share - self.paid)
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding() <= Decimal::ZERO
    }

    fn owes_full_share(&self) -> bool {
        let outstanding = self.outstanding();
        outstanding > Decimal::ZERO && outstanding >= round2(self.share)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BillSplitStatus {
    Open,
    Partial,
    Settled,
}

impl BillSplitStatus {
    /// Pure function of participant state; order of participants is irrelevant.
    pub fn derive(participants: &[Participant]) -> BillSplitStatus {
        if participants.iter().all(Participant::is_settled) {
            BillSplitStatus::Settled
        } else if participants.iter().all(Participant::owes_full_share) {
            BillSplitStatus::Open
        } else {
            BillSplitStatus::Partial
        }
    }
}

impl fmt::Display for BillSplitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillSplitStatus::Open => "open",
            BillSplitStatus::Partial => "partial",
            BillSplitStatus::Settled => "settled",
        };
        f.write_str(label)
    }
}
