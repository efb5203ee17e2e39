//! Read-only projections over an arrangement's payment progress.
//!
//! An arrangement tracks progress either through a full instalment ledger or,
//! for older simple records, through the flat `payments_made`/`total_payments`
//! counters. The ledger wins whenever it is present. Nothing outside this
//! module reads those fields directly.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::arrangement::Arrangement;
use crate::decimal::Money;
use crate::instalments::Instalment;

fn ledger(arrangement: &Arrangement) -> Option<&[Instalment]> {
    arrangement
        .payment_instalments
        .as_deref()
        .filter(|entries| !entries.is_empty())
}

/// true when a non-empty instalment ledger drives progress
pub fn has_ledger(arrangement: &Arrangement) -> bool {
    ledger(arrangement).is_some()
}

/// instalment at the current index, if a ledger exists
pub fn current_instalment(arrangement: &Arrangement) -> Option<&Instalment> {
    ledger(arrangement)?.get(arrangement.current_instalment_index)
}

/// instalment after the current one
pub fn next_instalment(arrangement: &Arrangement) -> Option<&Instalment> {
    ledger(arrangement)?.get(arrangement.current_instalment_index + 1)
}

/// a single-payment arrangement is trivially on its last payment
pub fn is_last_instalment(arrangement: &Arrangement) -> bool {
    match ledger(arrangement) {
        None => true,
        Some(entries) => arrangement.current_instalment_index + 1 >= entries.len(),
    }
}

pub fn total_instalments(arrangement: &Arrangement) -> u32 {
    match ledger(arrangement) {
        Some(entries) => entries.len() as u32,
        None => arrangement.total_payments.filter(|n| *n > 0).unwrap_or(1),
    }
}

pub fn paid_instalments(arrangement: &Arrangement) -> u32 {
    match ledger(arrangement) {
        Some(entries) => entries.iter().filter(|i| i.is_paid()).count() as u32,
        None => arrangement.payments_made,
    }
}

/// sum of everything recorded against paid ledger entries
pub fn total_paid(arrangement: &Arrangement) -> Money {
    ledger(arrangement)
        .map(|entries| {
            entries
                .iter()
                .filter(|i| i.is_paid())
                .map(Instalment::settled_amount)
                .sum()
        })
        .unwrap_or(Money::ZERO)
}

/// balance the whole arrangement is measured against
pub fn balance_basis(arrangement: &Arrangement) -> Money {
    arrangement.total_amount_owed.unwrap_or(arrangement.amount)
}

/// outstanding balance, floored at zero to tolerate over-payment
pub fn remaining_balance(arrangement: &Arrangement) -> Money {
    balance_basis(arrangement).saturating_sub(total_paid(arrangement))
}

/// amount due for the current obligation
pub fn current_amount(arrangement: &Arrangement) -> Money {
    current_instalment(arrangement)
        .map(|i| i.amount)
        .unwrap_or(arrangement.amount)
}

/// due date of the current obligation
pub fn due_date(arrangement: &Arrangement) -> NaiveDate {
    current_instalment(arrangement)
        .map(|i| i.scheduled_date)
        .unwrap_or(arrangement.scheduled_date)
}

/// whole-number percentage of instalments paid, 0..=100
pub fn completion_percentage(arrangement: &Arrangement) -> u8 {
    let total = total_instalments(arrangement);
    let paid = paid_instalments(arrangement).min(total);
    if total == 0 {
        return 0;
    }

    let pct = Decimal::from(paid) * Decimal::from(100) / Decimal::from(total);
    pct.floor().to_u8().unwrap_or(0)
}

/// all progress projections computed once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub total_instalments: u32,
    pub paid_instalments: u32,
    pub current_index: usize,
    pub is_last: bool,
    pub current_amount: Money,
    pub due_date: NaiveDate,
    pub total_paid: Money,
    pub remaining_balance: Money,
    pub completion_percentage: u8,
}

impl ProgressView {
    pub fn of(arrangement: &Arrangement) -> Self {
        Self {
            total_instalments: total_instalments(arrangement),
            paid_instalments: paid_instalments(arrangement),
            current_index: arrangement.current_instalment_index,
            is_last: is_last_instalment(arrangement),
            current_amount: current_amount(arrangement),
            due_date: due_date(arrangement),
            total_paid: total_paid(arrangement),
            remaining_balance: remaining_balance(arrangement),
            completion_percentage: completion_percentage(arrangement),
        }
    }
}
