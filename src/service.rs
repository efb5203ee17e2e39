use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{info, warn};

use crate::arrangement::{Arrangement, NewArrangement};
use crate::collaborators::{AccountingLedger, AddressResolver, ArrangementStore, MessageDelivery};
use crate::config::{EngineConfig, ReminderSettings};
use crate::errors::{ArrangementError, CollaboratorKind, Result};
use crate::events::{Event, EventStore};
use crate::instalments::{ledger, Instalment};
use crate::lifecycle::{self, ActionResult, PaymentAction, StatusEvent, StatusUpdate};
use crate::reminders::{
    self, ComposedMessage, MessageComposer, PendingReminder, ReminderEvaluator,
    ReminderNotification, ReminderStats,
};

/// a reminder that went out, and what was recorded for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReminder {
    pub arrangement: Arrangement,
    pub notification: ReminderNotification,
    pub message: ComposedMessage,
}

/// Drives arrangements through their lifecycle against the collaborators.
///
/// Every operation computes the next state in memory first and only then
/// calls out. If a call fails the error carries the computed arrangement; the
/// service never retries and never rolls back calls that already succeeded.
/// Events reach `events` only once every call of the operation has succeeded.
pub struct ArrangementService<'a> {
    pub config: EngineConfig,
    pub events: EventStore,
    accounting: &'a dyn AccountingLedger,
    store: &'a dyn ArrangementStore,
    addresses: &'a dyn AddressResolver,
    delivery: &'a dyn MessageDelivery,
}

impl<'a> ArrangementService<'a> {
    pub fn new(
        config: EngineConfig,
        accounting: &'a dyn AccountingLedger,
        store: &'a dyn ArrangementStore,
        addresses: &'a dyn AddressResolver,
        delivery: &'a dyn MessageDelivery,
    ) -> Self {
        Self {
            config,
            events: EventStore::new(),
            accounting,
            store,
            addresses,
            delivery,
        }
    }

    /// validate form input, resolve the address and store the new arrangement
    pub fn create(
        &mut self,
        input: &NewArrangement,
        time_provider: &SafeTimeProvider,
    ) -> Result<Arrangement> {
        let now = time_provider.now();

        // full validation before the address book is touched
        let mut arrangement = Arrangement::create(input, 0, &self.config, now)?;

        let address_index = self
            .addresses
            .resolve_or_create(&arrangement.address)
            .map_err(|e| e.into_failure(CollaboratorKind::AddressResolution, Some(&arrangement)))?;
        arrangement.address_index = address_index;

        self.store
            .add_arrangement(&arrangement)
            .map_err(|e| e.into_failure(CollaboratorKind::Persistence, Some(&arrangement)))?;

        self.events.emit(Event::ArrangementCreated {
            arrangement_id: arrangement.id,
            amount: ledger::balance_basis(&arrangement),
            instalments: ledger::total_instalments(&arrangement),
            first_due: arrangement.scheduled_date,
            timestamp: now,
        });

        info!(
            arrangement_id = %arrangement.id,
            address_index = arrangement.address_index,
            amount = %arrangement.amount,
            due = %arrangement.scheduled_date,
            "arrangement created"
        );

        Ok(arrangement)
    }

    pub fn confirm(&mut self, arrangement: &Arrangement, time_provider: &SafeTimeProvider) -> Result<Arrangement> {
        self.change_status(arrangement, StatusEvent::Confirm, "confirmed", time_provider)
    }

    pub fn cancel(&mut self, arrangement: &Arrangement, time_provider: &SafeTimeProvider) -> Result<Arrangement> {
        self.change_status(arrangement, StatusEvent::Cancel, "cancelled", time_provider)
    }

    pub fn mark_missed(&mut self, arrangement: &Arrangement, time_provider: &SafeTimeProvider) -> Result<Arrangement> {
        self.change_status(arrangement, StatusEvent::MarkMissed, "payment missed", time_provider)
    }

    fn change_status(
        &mut self,
        arrangement: &Arrangement,
        event: StatusEvent,
        reason: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<Arrangement> {
        let mut pending = EventStore::new();
        let update = lifecycle::change_status(arrangement, event, reason, time_provider.now(), &mut pending)?;
        self.persist(update, pending)
    }

    pub fn reschedule(
        &mut self,
        arrangement: &Arrangement,
        date: NaiveDate,
        time: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Arrangement> {
        let mut pending = EventStore::new();
        let update = lifecycle::reschedule(arrangement, date, time, time_provider.now(), &mut pending)?;
        self.persist(update, pending)
    }

    pub fn revise_plan(
        &mut self,
        arrangement: &Arrangement,
        instalments: Vec<Instalment>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Arrangement> {
        let mut pending = EventStore::new();
        let update = lifecycle::revise_plan(arrangement, instalments, time_provider.now(), &mut pending)?;
        self.persist(update, pending)
    }

    /// store the update, then publish the events it produced
    fn persist(&mut self, update: StatusUpdate, mut pending: EventStore) -> Result<Arrangement> {
        let StatusUpdate { arrangement, patch } = update;
        if !patch.is_empty() {
            self.store
                .update_arrangement(arrangement.id, &patch)
                .map_err(|e| e.into_failure(CollaboratorKind::Persistence, Some(&arrangement)))?;
        }
        self.events.extend(pending.take_events());
        Ok(arrangement)
    }

    /// apply a payment action with system time
    pub fn apply_action_now(&mut self, arrangement: &Arrangement, action: PaymentAction) -> Result<ActionResult> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.apply_action(arrangement, action, &time)
    }

    /// apply a payment action, report the outcome and persist the new state
    pub fn apply_action(
        &mut self,
        arrangement: &Arrangement,
        action: PaymentAction,
        time_provider: &SafeTimeProvider,
    ) -> Result<ActionResult> {
        let mut pending = EventStore::new();
        let result = lifecycle::apply_action(arrangement, action, time_provider.now(), &mut pending)?;

        self.accounting
            .record_outcome(&result.outcome)
            .map_err(|e| e.into_failure(CollaboratorKind::Accounting, Some(&result.arrangement)))?;

        self.store
            .update_arrangement(result.arrangement.id, &result.patch)
            .map_err(|e| {
                warn!(
                    arrangement_id = %result.arrangement.id,
                    code = %result.outcome.code,
                    "outcome recorded but arrangement update failed"
                );
                e.into_failure(CollaboratorKind::Persistence, Some(&result.arrangement))
            })?;

        self.events.extend(pending.take_events());
        Ok(result)
    }

    pub fn delete(&mut self, arrangement: &Arrangement, time_provider: &SafeTimeProvider) -> Result<()> {
        self.store
            .delete_arrangement(arrangement.id)
            .map_err(|e| e.into_failure(CollaboratorKind::Persistence, Some(arrangement)))?;

        self.events.emit(Event::ArrangementDeleted {
            arrangement_id: arrangement.id,
            timestamp: time_provider.now(),
        });
        info!(arrangement_id = %arrangement.id, "arrangement deleted");
        Ok(())
    }

    pub fn pending_reminders(
        &self,
        arrangements: &[Arrangement],
        notifications: &[ReminderNotification],
        settings: &ReminderSettings,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<PendingReminder>> {
        ReminderEvaluator::new(settings, &self.config).pending(
            arrangements,
            notifications,
            time_provider.now().date_naive(),
        )
    }

    pub fn reminder_stats(
        &self,
        arrangements: &[Arrangement],
        notifications: &[ReminderNotification],
        settings: &ReminderSettings,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReminderStats> {
        ReminderEvaluator::new(settings, &self.config).stats(
            arrangements,
            notifications,
            time_provider.now().date_naive(),
        )
    }

    /// render and deliver a reminder, then record it as sent
    pub fn send_reminder(
        &mut self,
        arrangement: &Arrangement,
        reminder: &PendingReminder,
        settings: &ReminderSettings,
        time_provider: &SafeTimeProvider,
    ) -> Result<SentReminder> {
        ensure_same_arrangement(arrangement, reminder)?;
        if !arrangement.status.is_awaiting_payment() {
            return Err(ArrangementError::InvalidTransition {
                from: arrangement.status,
                action: "send a reminder for".to_string(),
            });
        }
        if reminder.due_date != ledger::due_date(arrangement) {
            return Err(ArrangementError::inconsistent(format!(
                "reminder is for {}, but the next payment is due {}",
                reminder.due_date,
                ledger::due_date(arrangement)
            )));
        }
        let now = time_provider.now();

        let message = MessageComposer::new(settings).compose(arrangement)?;

        self.delivery
            .deliver(&message.phone_number, &message.body)
            .map_err(|e| e.into_failure(CollaboratorKind::Delivery, None))?;

        let mut pending = EventStore::new();
        let notification = reminders::mark_sent(reminder, now, &mut pending);
        let update = reminders::record_reminder_sent(arrangement, now);

        self.store
            .record_notification(&notification)
            .map_err(|e| e.into_failure(CollaboratorKind::Persistence, Some(&update.arrangement)))?;
        let arrangement = self.persist(update, pending)?;

        info!(
            arrangement_id = %arrangement.id,
            offset_days = reminder.offset_days,
            template = %message.template_id,
            "reminder sent"
        );

        Ok(SentReminder {
            arrangement,
            notification,
            message,
        })
    }

    pub fn dismiss_reminder(
        &mut self,
        arrangement: &Arrangement,
        reminder: &PendingReminder,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReminderNotification> {
        ensure_same_arrangement(arrangement, reminder)?;

        let mut pending = EventStore::new();
        let notification = reminders::mark_dismissed(reminder, time_provider.now(), &mut pending);
        self.store
            .record_notification(&notification)
            .map_err(|e| e.into_failure(CollaboratorKind::Persistence, None))?;

        self.events.extend(pending.take_events());
        Ok(notification)
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

fn ensure_same_arrangement(arrangement: &Arrangement, reminder: &PendingReminder) -> Result<()> {
    if reminder.arrangement_id != arrangement.id {
        return Err(ArrangementError::inconsistent(format!(
            "reminder belongs to arrangement {}, not {}",
            reminder.arrangement_id, arrangement.id
        )));
    }
    Ok(())
}
