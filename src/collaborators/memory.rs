use std::collections::HashMap;
use std::sync::RwLock;

use super::{
    AccountingLedger, AddressResolver, ArrangementStore, CollaboratorError, CollaboratorResult,
    MessageDelivery,
};
use crate::arrangement::{Arrangement, ArrangementPatch};
use crate::reminders::ReminderNotification;
use crate::types::{ArrangementId, OutcomeRecord};

fn poisoned<T>(_: T) -> CollaboratorError {
    CollaboratorError::new("in-memory lock poisoned")
}

/// In-memory arrangement store and address book.
///
/// Holds everything behind `RwLock`s so it can be shared by reference with
/// the service. Used by the demos and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    arrangements: RwLock<HashMap<ArrangementId, Arrangement>>,
    notifications: RwLock<Vec<ReminderNotification>>,
    addresses: RwLock<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ArrangementId) -> Option<Arrangement> {
        self.arrangements.read().ok()?.get(&id).cloned()
    }

    /// all arrangements ordered by creation time
    pub fn arrangements(&self) -> Vec<Arrangement> {
        let mut all: Vec<Arrangement> = self
            .arrangements
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|a| (a.created_at, a.id));
        all
    }

    pub fn notifications(&self) -> Vec<ReminderNotification> {
        self.notifications.read().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.addresses.read().map(|a| a.clone()).unwrap_or_default()
    }
}

impl ArrangementStore for InMemoryStore {
    fn add_arrangement(&self, arrangement: &Arrangement) -> CollaboratorResult<()> {
        let mut arrangements = self.arrangements.write().map_err(poisoned)?;
        if arrangements.contains_key(&arrangement.id) {
            return Err(CollaboratorError::new(format!("arrangement {} already exists", arrangement.id)));
        }
        arrangements.insert(arrangement.id, arrangement.clone());
        Ok(())
    }

    fn update_arrangement(&self, id: ArrangementId, patch: &ArrangementPatch) -> CollaboratorResult<()> {
        let mut arrangements = self.arrangements.write().map_err(poisoned)?;
        let stored = arrangements
            .get_mut(&id)
            .ok_or_else(|| CollaboratorError::new(format!("arrangement {} not found", id)))?;
        patch.apply_to(stored);
        Ok(())
    }

    fn delete_arrangement(&self, id: ArrangementId) -> CollaboratorResult<()> {
        let mut arrangements = self.arrangements.write().map_err(poisoned)?;
        arrangements
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CollaboratorError::new(format!("arrangement {} not found", id)))
    }

    fn record_notification(&self, notification: &ReminderNotification) -> CollaboratorResult<()> {
        self.notifications.write().map_err(poisoned)?.push(notification.clone());
        Ok(())
    }
}

impl AddressResolver for InMemoryStore {
    fn resolve_or_create(&self, address: &str) -> CollaboratorResult<usize> {
        let wanted = address.trim();
        let mut addresses = self.addresses.write().map_err(poisoned)?;

        if let Some(index) = addresses.iter().position(|a| a.eq_ignore_ascii_case(wanted)) {
            return Ok(index);
        }
        addresses.push(wanted.to_string());
        Ok(addresses.len() - 1)
    }
}

/// accounting ledger that keeps every outcome it is given
#[derive(Debug, Default)]
pub struct RecordingLedger {
    outcomes: RwLock<Vec<OutcomeRecord>>,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes.read().map(|o| o.clone()).unwrap_or_default()
    }
}

impl AccountingLedger for RecordingLedger {
    fn record_outcome(&self, outcome: &OutcomeRecord) -> CollaboratorResult<()> {
        self.outcomes.write().map_err(poisoned)?.push(outcome.clone());
        Ok(())
    }
}

/// delivery that queues messages instead of sending them
#[derive(Debug, Default)]
pub struct Outbox {
    sent: RwLock<Vec<(String, String)>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// (phone number, body) pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl MessageDelivery for Outbox {
    fn deliver(&self, phone_number: &str, body: &str) -> CollaboratorResult<()> {
        self.sent
            .write()
            .map_err(poisoned)?
            .push((phone_number.to_string(), body.to_string()));
        Ok(())
    }
}
