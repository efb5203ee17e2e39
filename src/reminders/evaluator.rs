use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arrangement::Arrangement;
use crate::calendar::{add_days, end_of_week, start_of_week};
use crate::config::{EngineConfig, ReminderSettings};
use crate::errors::Result;
use crate::instalments::ledger;
use crate::reminders::ReminderNotification;
use crate::types::{ArrangementId, ArrangementStatus, NotificationType};

/// one reminder occurrence that should fire (or has fired) and is not settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReminder {
    pub arrangement_id: ArrangementId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub offset_days: u32,
    pub due_date: NaiveDate,
    pub fire_date: NaiveDate,
    pub is_overdue: bool,
}

/// dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderStats {
    pub total_pending: usize,
    pub due_today: usize,
    /// arrangements still `Scheduled` whose due date has passed
    pub overdue_payments: usize,
    /// arrangements awaiting payment that fall due this calendar week
    pub due_this_week: usize,
}

/// computes reminder occurrences from arrangements and the notification log
pub struct ReminderEvaluator<'a> {
    settings: &'a ReminderSettings,
    config: &'a EngineConfig,
}

impl<'a> ReminderEvaluator<'a> {
    pub fn new(settings: &'a ReminderSettings, config: &'a EngineConfig) -> Self {
        Self { settings, config }
    }

    /// every occurrence for one arrangement, settled or not, in offset order
    fn occurrences(&self, arrangement: &Arrangement, today: NaiveDate) -> Result<Vec<PendingReminder>> {
        if !self.settings.global_enabled || !arrangement.status.is_awaiting_payment() {
            return Ok(Vec::new());
        }

        let due_date = ledger::due_date(arrangement);
        self.settings
            .customizable_schedule
            .offsets()
            .into_iter()
            .map(|offset_days| {
                let fire_date = add_days(due_date, -i64::from(offset_days))?;
                Ok(PendingReminder {
                    arrangement_id: arrangement.id,
                    kind: NotificationType::PaymentDue,
                    offset_days,
                    due_date,
                    fire_date,
                    is_overdue: fire_date < today,
                })
            })
            .collect()
    }

    fn is_settled(reminder: &PendingReminder, notifications: &[ReminderNotification]) -> bool {
        notifications
            .iter()
            .any(|n| n.settles(reminder.arrangement_id, reminder.kind, reminder.fire_date))
    }

    /// unsettled reminders for one arrangement whose fire date has arrived
    pub fn pending_for(
        &self,
        arrangement: &Arrangement,
        notifications: &[ReminderNotification],
        today: NaiveDate,
    ) -> Result<Vec<PendingReminder>> {
        let mut pending: Vec<PendingReminder> = self
            .occurrences(arrangement, today)?
            .into_iter()
            .filter(|r| r.fire_date <= today && !Self::is_settled(r, notifications))
            .collect();
        sort_reminders(&mut pending);
        Ok(pending)
    }

    /// unsettled reminders across all arrangements, oldest fire date first
    pub fn pending(
        &self,
        arrangements: &[Arrangement],
        notifications: &[ReminderNotification],
        today: NaiveDate,
    ) -> Result<Vec<PendingReminder>> {
        let mut pending = Vec::new();
        for arrangement in arrangements {
            pending.extend(self.pending_for(arrangement, notifications, today)?);
        }
        sort_reminders(&mut pending);

        debug!(count = pending.len(), %today, "evaluated pending reminders");
        Ok(pending)
    }

    /// reminders that will fire after today and within `horizon_days`
    pub fn upcoming(
        &self,
        arrangements: &[Arrangement],
        notifications: &[ReminderNotification],
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<PendingReminder>> {
        let horizon = add_days(today, i64::from(horizon_days))?;

        let mut upcoming = Vec::new();
        for arrangement in arrangements {
            upcoming.extend(
                self.occurrences(arrangement, today)?
                    .into_iter()
                    .filter(|r| r.fire_date > today && r.fire_date <= horizon)
                    .filter(|r| !Self::is_settled(r, notifications)),
            );
        }
        sort_reminders(&mut upcoming);
        Ok(upcoming)
    }

    pub fn stats(
        &self,
        arrangements: &[Arrangement],
        notifications: &[ReminderNotification],
        today: NaiveDate,
    ) -> Result<ReminderStats> {
        let pending = self.pending(arrangements, notifications, today)?;
        let week_start = start_of_week(today, self.config.week_starts_on);
        let week_end = end_of_week(today, self.config.week_starts_on);

        let overdue_payments = arrangements
            .iter()
            .filter(|a| a.status == ArrangementStatus::Scheduled && ledger::due_date(a) < today)
            .count();

        let due_this_week = arrangements
            .iter()
            .filter(|a| a.status.is_awaiting_payment())
            .filter(|a| {
                let due = ledger::due_date(a);
                due >= week_start && due <= week_end
            })
            .count();

        Ok(ReminderStats {
            total_pending: pending.len(),
            due_today: pending.iter().filter(|r| r.fire_date == today).count(),
            overdue_payments,
            due_this_week,
        })
    }
}

fn sort_reminders(reminders: &mut [PendingReminder]) {
    reminders.sort_by(|a, b| {
        a.fire_date
            .cmp(&b.fire_date)
            .then_with(|| a.arrangement_id.cmp(&b.arrangement_id))
            .then_with(|| a.offset_days.cmp(&b.offset_days))
    });
}
