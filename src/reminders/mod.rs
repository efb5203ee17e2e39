//! Reminder notifications: which are due, how they read, and what is recorded
//! once the agent acts on one.

pub mod evaluator;
pub mod templates;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arrangement::Arrangement;
use crate::events::{Event, EventStore};
use crate::lifecycle::StatusUpdate;
use crate::types::{ArrangementId, NotificationStatus, NotificationType};

pub use evaluator::{PendingReminder, ReminderEvaluator, ReminderStats};
pub use templates::{ComposedMessage, MessageComposer, Placeholder, RenderContext};

/// durable record of a reminder the agent sent or dismissed
///
/// Pending reminders are recomputed on demand and never stored; a record only
/// exists once the reminder has been acted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderNotification {
    pub id: Uuid,
    pub arrangement_id: ArrangementId,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    /// fire date of the occurrence this record settles
    pub scheduled_date: NaiveDate,
    pub status: NotificationStatus,
    #[serde(default)]
    pub offset_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acted_at: Option<DateTime<Utc>>,
}

impl ReminderNotification {
    fn acted_on(reminder: &PendingReminder, status: NotificationStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            arrangement_id: reminder.arrangement_id,
            kind: reminder.kind,
            scheduled_date: reminder.fire_date,
            status,
            offset_days: reminder.offset_days,
            acted_at: Some(now),
        }
    }

    /// true when this record settles the occurrence at `fire_date`
    pub fn settles(&self, arrangement_id: ArrangementId, kind: NotificationType, fire_date: NaiveDate) -> bool {
        self.arrangement_id == arrangement_id
            && self.kind == kind
            && self.scheduled_date == fire_date
            && self.status.is_acted_on()
    }
}

pub fn mark_sent(
    reminder: &PendingReminder,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> ReminderNotification {
    events.emit(Event::ReminderSent {
        arrangement_id: reminder.arrangement_id,
        offset_days: reminder.offset_days,
        fire_date: reminder.fire_date,
        timestamp: now,
    });
    ReminderNotification::acted_on(reminder, NotificationStatus::Sent, now)
}

pub fn mark_dismissed(
    reminder: &PendingReminder,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> ReminderNotification {
    events.emit(Event::ReminderDismissed {
        arrangement_id: reminder.arrangement_id,
        offset_days: reminder.offset_days,
        fire_date: reminder.fire_date,
        timestamp: now,
    });
    ReminderNotification::acted_on(reminder, NotificationStatus::Dismissed, now)
}

/// stamp the arrangement's reminder bookkeeping after a send
pub fn record_reminder_sent(arrangement: &Arrangement, now: DateTime<Utc>) -> StatusUpdate {
    let mut next = arrangement.clone();
    next.last_reminder_sent = Some(now);
    next.reminder_count += 1;
    next.touch(now);
    StatusUpdate::between(arrangement, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::tests::single_arrangement;
    use chrono::TimeZone;

    fn reminder(arrangement: &Arrangement) -> PendingReminder {
        PendingReminder {
            arrangement_id: arrangement.id,
            kind: NotificationType::PaymentDue,
            offset_days: 3,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            fire_date: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            is_overdue: false,
        }
    }

    #[test]
    fn test_mark_sent_builds_durable_record() {
        let arrangement = single_arrangement("50");
        let now = Utc.with_ymd_and_hms(2025, 1, 12, 8, 30, 0).unwrap();
        let mut events = EventStore::new();

        let record = mark_sent(&reminder(&arrangement), now, &mut events);

        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.scheduled_date, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
        assert_eq!(record.acted_at, Some(now));
        assert!(record.settles(arrangement.id, NotificationType::PaymentDue, record.scheduled_date));
        assert_eq!(events.events().len(), 1);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "payment_due");
        assert_eq!(json["status"], "sent");
    }

    #[test]
    fn test_dismissed_record_settles_only_its_date() {
        let arrangement = single_arrangement("50");
        let now = Utc.with_ymd_and_hms(2025, 1, 12, 8, 30, 0).unwrap();
        let mut events = EventStore::new();

        let record = mark_dismissed(&reminder(&arrangement), now, &mut events);
        let other_date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();

        assert_eq!(record.status, NotificationStatus::Dismissed);
        assert!(!record.settles(arrangement.id, NotificationType::PaymentDue, other_date));
    }

    #[test]
    fn test_record_reminder_sent_counts() {
        let arrangement = single_arrangement("50");
        let now = Utc.with_ymd_and_hms(2025, 1, 12, 8, 30, 0).unwrap();

        let first = record_reminder_sent(&arrangement, now);
        let second = record_reminder_sent(&first.arrangement, now);

        assert_eq!(second.arrangement.reminder_count, 2);
        assert_eq!(second.arrangement.last_reminder_sent, Some(now));
        assert_eq!(first.patch.reminder_count, Some(1));
        assert_eq!(first.patch.last_reminder_sent, Some(Some(now)));
    }
}
