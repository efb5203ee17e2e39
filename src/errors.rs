use std::fmt;

use thiserror::Error;

use crate::arrangement::Arrangement;
use crate::types::ArrangementStatus;

/// which external collaborator rejected a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorKind {
    Accounting,
    Persistence,
    AddressResolution,
    Delivery,
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollaboratorKind::Accounting => "accounting",
            CollaboratorKind::Persistence => "persistence",
            CollaboratorKind::AddressResolution => "address resolution",
            CollaboratorKind::Delivery => "delivery",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ArrangementError {
    #[error("invalid amount: {input:?}")]
    InvalidAmount {
        input: String,
    },

    #[error("an address is required")]
    MissingAddress,

    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid recurrence: {message}")]
    InvalidRecurrence {
        message: String,
    },

    #[error("inconsistent state: {message}")]
    InconsistentState {
        message: String,
    },

    #[error("cannot {action} an arrangement that is {from:?}")]
    InvalidTransition {
        from: ArrangementStatus,
        action: String,
    },

    #[error("sms reminders are disabled")]
    DeliveryDisabled,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    /// the in-memory computation succeeded but a collaborator call did not;
    /// `computed` holds the state the caller may retry with or discard
    #[error("{kind} collaborator failed: {message}")]
    CollaboratorFailure {
        kind: CollaboratorKind,
        message: String,
        computed: Option<Box<Arrangement>>,
    },
}

impl ArrangementError {
    pub fn validation(message: impl Into<String>) -> Self {
        ArrangementError::Validation {
            message: message.into(),
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        ArrangementError::InconsistentState {
            message: message.into(),
        }
    }

    /// true for errors raised before any state was touched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ArrangementError::InvalidAmount { .. }
                | ArrangementError::MissingAddress
                | ArrangementError::Validation { .. }
                | ArrangementError::InvalidDate { .. }
                | ArrangementError::InvalidRecurrence { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ArrangementError>;
