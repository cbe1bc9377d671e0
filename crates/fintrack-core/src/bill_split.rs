//! Allocation and settlement of shared expenses.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    money::{round2, CENT},
    BillSplit, BillSplitStatus, CurrencyCode, Participant,
};

use crate::error::{CoreError, CoreResult};

/// How the total is divided among participants.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitShares {
    /// Equal shares in whole cents; leftover cents land on the trailing
    /// participants, one each.
    Equal(Vec<Uuid>),
    /// Caller-supplied shares that must sum to the total within one cent.
    Custom(Vec<(Uuid, Decimal)>),
}

impl SplitShares {
    fn contact_ids(&self) -> Vec<Uuid> {
        match self {
            SplitShares::Equal(ids) => ids.clone(),
            SplitShares::Custom(shares) => shares.iter().map(|(id, _)| *id).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBillSplit {
    pub description: String,
    pub date: NaiveDate,
    pub currency: CurrencyCode,
    pub total_amount: Decimal,
    pub payer_contact_id: Uuid,
    pub shares: SplitShares,
}

pub struct BillSplitService;

impl BillSplitService {
    pub fn create(input: NewBillSplit) -> CoreResult<BillSplit> {
        let total = round2(input.total_amount);
        if total <= Decimal::ZERO {
            return Err(CoreError::invalid("bill split total must be positive"));
        }
        let contact_ids = input.shares.contact_ids();
        if contact_ids.is_empty() {
            return Err(CoreError::invalid("at least one participant is required"));
        }
        let unique: HashSet<Uuid> = contact_ids.iter().copied().collect();
        if unique.len() != contact_ids.len() {
            return Err(CoreError::invalid("participants must be distinct"));
        }
        if !unique.contains(&input.payer_contact_id) {
            return Err(CoreError::invalid("payer must be one of the participants"));
        }

        let shares = match &input.shares {
            SplitShares::Equal(ids) => equal_shares(total, ids.len()),
            SplitShares::Custom(custom) => custom_shares(total, custom)?,
        };

        let participants = contact_ids
            .into_iter()
            .zip(shares)
            .map(|(contact_id, share)| Participant {
                contact_id,
                share,
                paid: if contact_id == input.payer_contact_id {
                    total
                } else {
                    Decimal::ZERO
                },
            })
            .collect::<Vec<_>>();

        let description = match input.description.trim() {
            "" => "Bill Split".to_string(),
            trimmed => trimmed.to_string(),
        };
        let mut split = BillSplit {
            id: Uuid::new_v4(),
            description,
            date: input.date,
            currency: input.currency,
            total_amount: total,
            payer_contact_id: input.payer_contact_id,
            participants,
            status: BillSplitStatus::Open,
        };
        split.recompute_status();
        debug!(split = %split.id, %total, participants = split.participants.len(), status = %split.status, "created bill split");
        Ok(split)
    }

    /// Sets the cumulative amount `contact_id` has paid and re-derives status.
    pub fn record_payment(
        split: &mut BillSplit,
        contact_id: Uuid,
        paid: Decimal,
    ) -> CoreResult<BillSplitStatus> {
        if paid < Decimal::ZERO {
            return Err(CoreError::invalid("paid amount cannot be negative"));
        }
        let split_id = split.id;
        let participant = split
            .participant_mut(contact_id)
            .ok_or(CoreError::ParticipantNotFound {
                split: split_id,
                contact: contact_id,
            })?;
        participant.paid = round2(paid);
        let status = split.recompute_status();
        debug!(split = %split_id, contact = %contact_id, %status, "recorded bill split payment");
        Ok(status)
    }

    pub fn outstanding_for(split: &BillSplit, contact_id: Uuid) -> CoreResult<Decimal> {
        split
            .participant(contact_id)
            .map(Participant::outstanding)
            .ok_or(CoreError::ParticipantNotFound {
                split: split.id,
                contact: contact_id,
            })
    }
}

fn equal_shares(total: Decimal, count: usize) -> Vec<Decimal> {
    let parts = Decimal::from(count as u64);
    let cents = total * Decimal::ONE_HUNDRED;
    let base = (cents / parts).floor();
    let leftover = cents - base * parts;
    // Leftover cents go one each to the trailing participants.
    (0..count)
        .map(|idx| {
            let from_end = Decimal::from((count - 1 - idx) as u64);
            let extra = if from_end < leftover { Decimal::ONE } else { Decimal::ZERO };
            round2((base + extra) / Decimal::ONE_HUNDRED)
        })
        .collect()
}

fn custom_shares(total: Decimal, custom: &[(Uuid, Decimal)]) -> CoreResult<Vec<Decimal>> {
    let mut shares: Vec<Decimal> = custom.iter().map(|(_, share)| round2(*share)).collect();
    if shares.iter().any(|share| *share < Decimal::ZERO) {
        return Err(CoreError::invalid("shares cannot be negative"));
    }
    let allocated: Decimal = shares.iter().copied().sum();
    if (allocated - total).abs() > CENT {
        return Err(CoreError::invalid(format!(
            "shares sum to {allocated} but the total is {total}"
        )));
    }
    if let Some(last) = shares.last_mut() {
        *last = round2(*last + total - allocated);
        if *last < Decimal::ZERO {
            return Err(CoreError::invalid("shares cannot be negative"));
        }
    }
    Ok(shares)
}
