use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for an arrangement
pub type ArrangementId = Uuid;

/// arrangement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrangementStatus {
    /// agreed and awaiting the current payment
    Scheduled,
    /// debtor has confirmed the payment date
    Confirmed,
    /// closed, either paid or written off as defaulted
    Completed,
    /// withdrawn before completion
    Cancelled,
    /// payment date passed without a payment
    Missed,
}

impl ArrangementStatus {
    /// statuses the three payment actions may be applied to
    pub fn accepts_payment_actions(&self) -> bool {
        matches!(self, ArrangementStatus::Scheduled | ArrangementStatus::Confirmed)
    }

    /// no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArrangementStatus::Completed | ArrangementStatus::Cancelled)
    }

    /// still owes a payment, so reminders apply
    pub fn is_awaiting_payment(&self) -> bool {
        !self.is_terminal()
    }
}

/// cadence used to generate a multi-instalment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    #[default]
    None,
    Weekly,
    Biweekly,
    Monthly,
}

/// short tag reported to the accounting collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeCode {
    /// one instalment of an arrangement was paid
    #[serde(rename = "ARR")]
    Arrangement,
    /// the remaining balance was paid in full
    #[serde(rename = "PIF")]
    PaidInFull,
    /// closed without a payment
    #[serde(rename = "Done")]
    Done,
}

impl OutcomeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::Arrangement => "ARR",
            OutcomeCode::PaidInFull => "PIF",
            OutcomeCode::Done => "Done",
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// outcome reported to the accounting collaborator after a payment action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub address_index: usize,
    pub code: OutcomeCode,
    pub amount: Option<Money>,
    pub arrangement_id: Option<ArrangementId>,
    pub case_reference: Option<String>,
}

/// reminder notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[default]
    PaymentDue,
}

/// reminder notification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Dismissed,
}

impl NotificationStatus {
    /// the reminder has been handled and must not resurface
    pub fn is_acted_on(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Dismissed)
    }
}
