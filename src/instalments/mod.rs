pub mod ledger;
pub mod recurrence;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{ArrangementError, Result};

pub use ledger::ProgressView;
pub use recurrence::{generate_instalments, RecurrencePlan, SplitRounding};

/// instalment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstalmentStatus {
    #[default]
    Pending,
    Paid,
}

/// one scheduled payment within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instalment {
    pub amount: Money,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub status: InstalmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Money>,
}

impl Instalment {
    pub fn pending(amount: Money, scheduled_date: NaiveDate) -> Self {
        Self {
            amount,
            scheduled_date,
            status: InstalmentStatus::Pending,
            paid_date: None,
            paid_amount: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstalmentStatus::Paid
    }

    /// amount that counts towards the balance once paid
    pub fn settled_amount(&self) -> Money {
        self.paid_amount.unwrap_or(self.amount)
    }

    /// mark paid; a paid instalment is never reset to pending
    pub fn mark_paid(&mut self, paid_date: NaiveDate, paid_amount: Money) {
        self.status = InstalmentStatus::Paid;
        self.paid_date = Some(paid_date);
        self.paid_amount = Some(paid_amount);
    }

    /// check the paid => (paid date, paid amount) invariant and a positive amount
    pub fn validate(&self, position: usize) -> Result<()> {
        if !self.amount.is_positive() || !self.amount.is_within_limit() {
            return Err(ArrangementError::InvalidAmount {
                input: format!("instalment {}: {}", position + 1, self.amount),
            });
        }

        if let Some(paid) = self.paid_amount.filter(|p| !p.is_within_limit()) {
            return Err(ArrangementError::InvalidAmount {
                input: format!("instalment {} paid: {}", position + 1, paid),
            });
        }

        if self.is_paid() && (self.paid_date.is_none() || self.paid_amount.is_none()) {
            return Err(ArrangementError::inconsistent(format!(
                "instalment {} is paid but has no paid date or amount",
                position + 1
            )));
        }

        Ok(())
    }
}
