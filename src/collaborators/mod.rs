//! Ports to the systems around the engine: the accounting ledger, the
//! arrangement store, the address book and SMS delivery.
//!
//! All calls are synchronous. The engine never retries; a failure is handed
//! back to the caller together with whatever was already computed.

pub mod memory;

use thiserror::Error;

use crate::arrangement::{Arrangement, ArrangementPatch};
use crate::errors::{ArrangementError, CollaboratorKind};
use crate::reminders::ReminderNotification;
use crate::types::{ArrangementId, OutcomeRecord};

pub use memory::{InMemoryStore, Outbox, RecordingLedger};

/// failure reported by a collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// wrap as an engine error, keeping the state computed before the call
    pub fn into_failure(self, kind: CollaboratorKind, computed: Option<&Arrangement>) -> ArrangementError {
        ArrangementError::CollaboratorFailure {
            kind,
            message: self.message,
            computed: computed.map(|a| Box::new(a.clone())),
        }
    }
}

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// receives outcome records for completed payment actions
pub trait AccountingLedger {
    fn record_outcome(&self, outcome: &OutcomeRecord) -> CollaboratorResult<()>;
}

/// durable storage for arrangements and acted-on reminders
pub trait ArrangementStore {
    fn add_arrangement(&self, arrangement: &Arrangement) -> CollaboratorResult<()>;
    fn update_arrangement(&self, id: ArrangementId, patch: &ArrangementPatch) -> CollaboratorResult<()>;
    fn delete_arrangement(&self, id: ArrangementId) -> CollaboratorResult<()>;
    fn record_notification(&self, notification: &ReminderNotification) -> CollaboratorResult<()>;
}

/// maps a free-text address to its index in the address book, adding it if new
pub trait AddressResolver {
    fn resolve_or_create(&self, address: &str) -> CollaboratorResult<usize>;
}

/// sends a rendered message
pub trait MessageDelivery {
    fn deliver(&self, phone_number: &str, body: &str) -> CollaboratorResult<()>;
}
