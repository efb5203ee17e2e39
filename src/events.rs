use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ArrangementId, ArrangementStatus, OutcomeCode};

/// all events that can be emitted while working an arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    ArrangementCreated {
        arrangement_id: ArrangementId,
        amount: Money,
        instalments: u32,
        first_due: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    ArrangementDeleted {
        arrangement_id: ArrangementId,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        arrangement_id: ArrangementId,
        old_status: ArrangementStatus,
        new_status: ArrangementStatus,
        reason: String,
    },
    Rescheduled {
        arrangement_id: ArrangementId,
        old_date: NaiveDate,
        new_date: NaiveDate,
    },
    PlanRevised {
        arrangement_id: ArrangementId,
        instalments: u32,
        current_index: usize,
    },

    // payment events
    InstalmentPaid {
        arrangement_id: ArrangementId,
        index: usize,
        amount: Money,
        paid_date: NaiveDate,
    },
    PlanAdvanced {
        arrangement_id: ArrangementId,
        current_index: usize,
        next_due: NaiveDate,
        next_amount: Money,
    },
    OutcomeReported {
        arrangement_id: ArrangementId,
        code: OutcomeCode,
        amount: Option<Money>,
    },

    // reminder events
    ReminderSent {
        arrangement_id: ArrangementId,
        offset_days: u32,
        fire_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    ReminderDismissed {
        arrangement_id: ArrangementId,
        offset_days: u32,
        fire_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// append events collected elsewhere, keeping their order
    pub fn extend(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
