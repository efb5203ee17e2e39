//! Arrangement status transitions and the three payment actions.
//!
//! Every operation here is pure: it takes the current arrangement and the
//! injected current time, and returns the next state together with the patch
//! for the persistence collaborator. The input is never mutated, so a failed
//! validation leaves the caller's arrangement exactly as it was.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arrangement::{Arrangement, ArrangementPatch};
use crate::calendar::parse_time_of_day;
use crate::decimal::Money;
use crate::errors::{ArrangementError, Result};
use crate::events::{Event, EventStore};
use crate::instalments::{ledger, Instalment};
use crate::types::{ArrangementStatus, OutcomeCode, OutcomeRecord};

/// status change requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Confirm,
    Cancel,
    MarkMissed,
    Reschedule,
    Complete,
}

impl StatusEvent {
    fn verb(&self) -> &'static str {
        match self {
            StatusEvent::Confirm => "confirm",
            StatusEvent::Cancel => "cancel",
            StatusEvent::MarkMissed => "mark missed",
            StatusEvent::Reschedule => "reschedule",
            StatusEvent::Complete => "complete",
        }
    }
}

/// next status for `event`, or `InvalidTransition`
pub fn transition(current: ArrangementStatus, event: StatusEvent) -> Result<ArrangementStatus> {
    use ArrangementStatus::*;

    match (current, event) {
        (Scheduled, StatusEvent::Confirm) => Ok(Confirmed),
        (Scheduled | Confirmed, StatusEvent::Complete) => Ok(Completed),
        (Scheduled | Confirmed, StatusEvent::MarkMissed) => Ok(Missed),
        (Scheduled | Confirmed | Missed, StatusEvent::Cancel) => Ok(Cancelled),
        (Scheduled | Confirmed | Missed, StatusEvent::Reschedule) => Ok(Scheduled),
        _ => Err(ArrangementError::InvalidTransition {
            from: current,
            action: event.verb().to_string(),
        }),
    }
}

/// payment event recorded by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentAction {
    /// one instalment paid; `amount` overrides the scheduled amount
    Continue { amount: Option<Money> },
    /// the whole remaining balance paid
    PaidInFull,
    /// the debtor did not pay; close without a payment record
    Defaulted,
}

impl PaymentAction {
    fn verb(&self) -> &'static str {
        match self {
            PaymentAction::Continue { .. } => "continue",
            PaymentAction::PaidInFull => "pay in full",
            PaymentAction::Defaulted => "default",
        }
    }
}

/// next state of an arrangement plus what the collaborators need to hear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub arrangement: Arrangement,
    pub outcome: OutcomeRecord,
    pub patch: ArrangementPatch,
}

/// next state after a change that reports nothing to accounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub arrangement: Arrangement,
    pub patch: ArrangementPatch,
}

impl StatusUpdate {
    pub(crate) fn between(before: &Arrangement, after: Arrangement) -> Self {
        let patch = ArrangementPatch::between(before, &after);
        Self {
            arrangement: after,
            patch,
        }
    }
}

/// apply one of the three payment actions
pub fn apply_action(
    arrangement: &Arrangement,
    action: PaymentAction,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<ActionResult> {
    if !arrangement.status.accepts_payment_actions() {
        return Err(ArrangementError::InvalidTransition {
            from: arrangement.status,
            action: action.verb().to_string(),
        });
    }

    let today = now.date_naive();
    let mut next = arrangement.clone();

    let (code, amount) = match action {
        PaymentAction::Continue { amount } => {
            let resolved = continue_payment(arrangement, &mut next, amount, today, events)?;
            (OutcomeCode::Arrangement, Some(resolved))
        }
        PaymentAction::PaidInFull => {
            let remaining = pay_in_full(arrangement, &mut next, today, events)?;
            (OutcomeCode::PaidInFull, Some(remaining))
        }
        PaymentAction::Defaulted => {
            set_status(&mut next, StatusEvent::Complete, "defaulted", events)?;
            (OutcomeCode::Done, None)
        }
    };

    next.touch(now);

    let outcome = OutcomeRecord {
        address_index: arrangement.address_index,
        code,
        amount,
        arrangement_id: Some(arrangement.id),
        case_reference: arrangement.case_reference.clone(),
    };

    events.emit(Event::OutcomeReported {
        arrangement_id: arrangement.id,
        code,
        amount,
    });

    info!(
        arrangement_id = %arrangement.id,
        code = %code,
        amount = ?amount.map(|a| a.to_string()),
        status = ?next.status,
        "payment action applied"
    );

    let patch = ArrangementPatch::between(arrangement, &next);
    Ok(ActionResult {
        arrangement: next,
        outcome,
        patch,
    })
}

/// record one instalment and advance the plan, returning the amount recorded
fn continue_payment(
    arrangement: &Arrangement,
    next: &mut Arrangement,
    amount: Option<Money>,
    today: NaiveDate,
    events: &mut EventStore,
) -> Result<Money> {
    let has_ledger = ledger::has_ledger(arrangement);
    let index = arrangement.current_instalment_index;

    if has_ledger {
        match ledger::current_instalment(arrangement) {
            None => {
                return Err(ArrangementError::inconsistent(format!(
                    "current instalment index {} is outside the plan",
                    index
                )))
            }
            Some(current) if current.is_paid() => {
                return Err(ArrangementError::inconsistent(format!(
                    "instalment {} is already paid",
                    index + 1
                )))
            }
            Some(_) => {}
        }
    }

    let resolved = match amount {
        Some(explicit) => {
            if !explicit.is_positive() {
                return Err(ArrangementError::InvalidAmount {
                    input: explicit.to_string(),
                });
            }
            let remaining = ledger::remaining_balance(arrangement);
            if explicit > remaining {
                return Err(ArrangementError::inconsistent(format!(
                    "payment {} exceeds the remaining balance {}",
                    explicit, remaining
                )));
            }
            explicit
        }
        None => ledger::current_amount(arrangement),
    };

    if let Some(entry) = next
        .payment_instalments
        .as_mut()
        .and_then(|entries| entries.get_mut(index))
    {
        entry.mark_paid(today, resolved);
        events.emit(Event::InstalmentPaid {
            arrangement_id: arrangement.id,
            index,
            amount: resolved,
            paid_date: today,
        });
    }

    next.payments_made += 1;

    match ledger::next_instalment(arrangement) {
        Some(upcoming) => {
            next.current_instalment_index = index + 1;
            next.scheduled_date = upcoming.scheduled_date;
            next.amount = upcoming.amount;

            events.emit(Event::PlanAdvanced {
                arrangement_id: arrangement.id,
                current_index: index + 1,
                next_due: upcoming.scheduled_date,
                next_amount: upcoming.amount,
            });
            debug!(
                arrangement_id = %arrangement.id,
                next_due = %upcoming.scheduled_date,
                "plan advanced to next instalment"
            );
        }
        None => set_status(next, StatusEvent::Complete, "final instalment paid", events)?,
    }

    Ok(resolved)
}

/// settle every pending instalment, returning the balance that was owed
fn pay_in_full(
    arrangement: &Arrangement,
    next: &mut Arrangement,
    today: NaiveDate,
    events: &mut EventStore,
) -> Result<Money> {
    let remaining = ledger::remaining_balance(arrangement);

    if let Some(entries) = next.payment_instalments.as_mut() {
        for (index, entry) in entries.iter_mut().enumerate().filter(|(_, e)| !e.is_paid()) {
            let amount = entry.amount;
            entry.mark_paid(today, amount);
            events.emit(Event::InstalmentPaid {
                arrangement_id: arrangement.id,
                index,
                amount,
                paid_date: today,
            });
        }
    }

    next.payments_made = ledger::total_instalments(arrangement);
    set_status(next, StatusEvent::Complete, "paid in full", events)?;

    Ok(remaining)
}

fn set_status(
    arrangement: &mut Arrangement,
    event: StatusEvent,
    reason: &str,
    events: &mut EventStore,
) -> Result<()> {
    let old_status = arrangement.status;
    let new_status = transition(old_status, event)?;
    arrangement.status = new_status;

    if old_status != new_status {
        events.emit(Event::StatusChanged {
            arrangement_id: arrangement.id,
            old_status,
            new_status,
            reason: reason.to_string(),
        });
    }

    Ok(())
}

/// confirm, cancel or mark missed
pub fn change_status(
    arrangement: &Arrangement,
    event: StatusEvent,
    reason: &str,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<StatusUpdate> {
    let mut next = arrangement.clone();
    set_status(&mut next, event, reason, events)?;
    next.touch(now);

    debug!(
        arrangement_id = %arrangement.id,
        from = ?arrangement.status,
        to = ?next.status,
        "status changed"
    );

    Ok(StatusUpdate::between(arrangement, next))
}

/// move the current obligation to a new date (and optionally time)
///
/// A missed arrangement becomes `Scheduled` again. When a plan exists only the
/// current instalment moves; later instalments keep their dates.
pub fn reschedule(
    arrangement: &Arrangement,
    date: NaiveDate,
    time: Option<&str>,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<StatusUpdate> {
    let scheduled_time = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => Some(parse_time_of_day(raw)?.format("%H:%M").to_string()),
        None => None,
    };

    let mut next = arrangement.clone();
    set_status(&mut next, StatusEvent::Reschedule, "rescheduled", events)?;

    let index = arrangement.current_instalment_index;
    if let Some(entry) = next
        .payment_instalments
        .as_mut()
        .and_then(|entries| entries.get_mut(index))
        .filter(|entry| !entry.is_paid())
    {
        entry.scheduled_date = date;
    }

    next.scheduled_date = date;
    next.scheduled_time = scheduled_time;
    next.touch(now);

    events.emit(Event::Rescheduled {
        arrangement_id: arrangement.id,
        old_date: arrangement.scheduled_date,
        new_date: date,
    });

    Ok(StatusUpdate::between(arrangement, next))
}

/// replace the plan when it is edited
///
/// Paid instalments must stay paid. The current index moves to the first
/// pending instalment and the arrangement mirrors its date and amount.
pub fn revise_plan(
    arrangement: &Arrangement,
    instalments: Vec<Instalment>,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<StatusUpdate> {
    if arrangement.status.is_terminal() {
        return Err(ArrangementError::InvalidTransition {
            from: arrangement.status,
            action: "revise the plan of".to_string(),
        });
    }

    if instalments.is_empty() {
        return Err(ArrangementError::validation("a plan needs at least one instalment"));
    }

    for (position, instalment) in instalments.iter().enumerate() {
        instalment.validate(position)?;
    }

    if let Some(existing) = arrangement.payment_instalments.as_ref() {
        for (position, old) in existing.iter().enumerate().filter(|(_, e)| e.is_paid()) {
            let still_paid = instalments.get(position).map(Instalment::is_paid).unwrap_or(false);
            if !still_paid {
                return Err(ArrangementError::inconsistent(format!(
                    "instalment {} was paid on {} and cannot be removed or reopened",
                    position + 1,
                    old.paid_date.map(|d| d.to_string()).unwrap_or_default()
                )));
            }
        }
    }

    let current_index = instalments
        .iter()
        .position(|i| !i.is_paid())
        .unwrap_or(instalments.len() - 1);
    let total = instalments
        .iter()
        .try_fold(Money::ZERO, |acc, i| acc.checked_add(i.amount))
        .ok_or_else(|| ArrangementError::InvalidAmount {
            input: "plan total is out of range".to_string(),
        })?;
    let count = instalments.len() as u32;

    let mut next = arrangement.clone();
    next.scheduled_date = instalments[current_index].scheduled_date;
    next.amount = instalments[current_index].amount;
    next.current_instalment_index = current_index;
    next.total_amount_owed = Some(total);
    next.total_payments = Some(count);
    next.payments_made = instalments.iter().filter(|i| i.is_paid()).count() as u32;
    next.payment_instalments = Some(instalments);
    next.touch(now);

    events.emit(Event::PlanRevised {
        arrangement_id: arrangement.id,
        instalments: count,
        current_index,
    });

    Ok(StatusUpdate::between(arrangement, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::tests::{plan_arrangement, single_arrangement};
    use crate::instalments::InstalmentStatus;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn cont() -> PaymentAction {
        PaymentAction::Continue { amount: None }
    }

    #[test]
    fn test_transition_table() {
        use ArrangementStatus::*;

        assert_eq!(transition(Scheduled, StatusEvent::Confirm).unwrap(), Confirmed);
        assert_eq!(transition(Confirmed, StatusEvent::Complete).unwrap(), Completed);
        assert_eq!(transition(Scheduled, StatusEvent::MarkMissed).unwrap(), Missed);
        assert_eq!(transition(Confirmed, StatusEvent::Cancel).unwrap(), Cancelled);
        assert_eq!(transition(Missed, StatusEvent::Reschedule).unwrap(), Scheduled);

        assert!(transition(Completed, StatusEvent::Cancel).is_err());
        assert!(transition(Completed, StatusEvent::MarkMissed).is_err());
        assert!(transition(Cancelled, StatusEvent::Reschedule).is_err());
        assert!(transition(Missed, StatusEvent::Complete).is_err());
        assert!(transition(Confirmed, StatusEvent::Confirm).is_err());
    }

    #[test]
    fn test_continue_single_payment_completes() {
        let arrangement = single_arrangement("50.00");
        let mut events = EventStore::new();

        let result = apply_action(&arrangement, cont(), at(2025, 1, 15), &mut events).unwrap();

        assert_eq!(result.arrangement.status, ArrangementStatus::Completed);
        assert_eq!(result.arrangement.payments_made, 1);
        assert_eq!(result.outcome.code, OutcomeCode::Arrangement);
        assert_eq!(result.outcome.amount.map(|a| a.to_string()).as_deref(), Some("50.00"));
        assert_eq!(result.outcome.address_index, 7);
        assert_eq!(result.outcome.arrangement_id, Some(arrangement.id));
        assert_eq!(result.outcome.case_reference, None);
        assert_eq!(result.patch.status, Some(ArrangementStatus::Completed));
        // the input is untouched
        assert_eq!(arrangement.status, ArrangementStatus::Scheduled);
    }

    #[test]
    fn test_continue_advances_plan() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let result = apply_action(&arrangement, cont(), at(2025, 1, 15), &mut events).unwrap();
        let next = &result.arrangement;
        let ledger_entries = next.payment_instalments.as_ref().unwrap();

        assert_eq!(next.status, ArrangementStatus::Scheduled);
        assert_eq!(next.current_instalment_index, 1);
        assert_eq!(next.payments_made, 1);
        assert_eq!(next.scheduled_date, ledger_entries[1].scheduled_date);
        assert_eq!(next.amount, Money::from_major(30));
        assert_eq!(ledger_entries[0].status, InstalmentStatus::Paid);
        assert_eq!(ledger_entries[0].paid_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(ledger_entries[0].paid_amount, Some(Money::from_major(30)));
        assert_eq!(ledger::remaining_balance(next), Money::from_major(60));

        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, Event::PlanAdvanced { current_index: 1, .. })));
    }

    #[test]
    fn test_continue_through_whole_plan() {
        let mut arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();
        let mut paid_counts = vec![ledger::paid_instalments(&arrangement)];

        for _ in 0..3 {
            arrangement = apply_action(&arrangement, cont(), at(2025, 2, 1), &mut events)
                .unwrap()
                .arrangement;
            paid_counts.push(ledger::paid_instalments(&arrangement));
            assert!(ledger::remaining_balance(&arrangement) >= Money::ZERO);
        }

        assert_eq!(paid_counts, vec![0, 1, 2, 3]);
        assert_eq!(arrangement.status, ArrangementStatus::Completed);
        assert_eq!(arrangement.payments_made, 3);
        assert_eq!(ledger::remaining_balance(&arrangement), Money::ZERO);

        let err = apply_action(&arrangement, cont(), at(2025, 2, 1), &mut events).unwrap_err();
        assert!(matches!(err, ArrangementError::InvalidTransition { .. }));
    }

    #[test]
    fn test_continue_with_adjusted_amount() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let action = PaymentAction::Continue { amount: Some(Money::from_major(25)) };
        let result = apply_action(&arrangement, action, at(2025, 1, 15), &mut events).unwrap();

        let first = &result.arrangement.payment_instalments.as_ref().unwrap()[0];
        assert_eq!(first.amount, Money::from_major(30));
        assert_eq!(first.paid_amount, Some(Money::from_major(25)));
        assert_eq!(result.outcome.amount, Some(Money::from_major(25)));
        assert_eq!(ledger::remaining_balance(&result.arrangement), Money::from_major(65));
    }

    #[test]
    fn test_continue_rejects_overpayment_before_mutation() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let action = PaymentAction::Continue { amount: Some(Money::from_major(120)) };
        let err = apply_action(&arrangement, action, at(2025, 1, 15), &mut events).unwrap_err();

        assert!(matches!(err, ArrangementError::InconsistentState { .. }));
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_paid_in_full_after_one_instalment() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let after_one = apply_action(&arrangement, cont(), at(2025, 1, 15), &mut events)
            .unwrap()
            .arrangement;
        let result =
            apply_action(&after_one, PaymentAction::PaidInFull, at(2025, 1, 20), &mut events).unwrap();

        assert_eq!(result.outcome.code, OutcomeCode::PaidInFull);
        assert_eq!(result.outcome.amount.map(|a| a.to_string()).as_deref(), Some("60.00"));

        let entries = result.arrangement.payment_instalments.as_ref().unwrap();
        assert!(entries.iter().all(Instalment::is_paid));
        assert_eq!(entries[1].paid_date, NaiveDate::from_ymd_opt(2025, 1, 20));
        assert_eq!(entries[2].paid_amount, Some(Money::from_major(30)));
        assert_eq!(entries[0].paid_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(result.arrangement.status, ArrangementStatus::Completed);
        assert_eq!(result.arrangement.payments_made, 3);
        assert_eq!(ledger::remaining_balance(&result.arrangement), Money::ZERO);
    }

    #[test]
    fn test_paid_in_full_twice_is_rejected_without_change() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let settled =
            apply_action(&arrangement, PaymentAction::PaidInFull, at(2025, 1, 15), &mut events)
                .unwrap()
                .arrangement;
        assert_eq!(ledger::remaining_balance(&settled), Money::ZERO);

        let err = apply_action(&settled, PaymentAction::PaidInFull, at(2025, 1, 16), &mut events)
            .unwrap_err();
        assert!(matches!(
            err,
            ArrangementError::InvalidTransition { from: ArrangementStatus::Completed, .. }
        ));
        assert_eq!(ledger::remaining_balance(&settled), Money::ZERO);
        assert_eq!(settled.status, ArrangementStatus::Completed);
    }

    #[test]
    fn test_defaulted_closes_without_payment() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let result =
            apply_action(&arrangement, PaymentAction::Defaulted, at(2025, 1, 16), &mut events).unwrap();

        assert_eq!(result.outcome.code, OutcomeCode::Done);
        assert_eq!(result.outcome.amount, None);
        assert_eq!(result.arrangement.status, ArrangementStatus::Completed);
        assert_eq!(result.arrangement.payment_instalments, arrangement.payment_instalments);
        assert_eq!(result.arrangement.payments_made, 0);
    }

    #[test]
    fn test_actions_rejected_for_ineligible_status() {
        let mut events = EventStore::new();
        for status in [
            ArrangementStatus::Completed,
            ArrangementStatus::Cancelled,
            ArrangementStatus::Missed,
        ] {
            let mut arrangement = single_arrangement("50");
            arrangement.status = status;
            for action in [cont(), PaymentAction::PaidInFull, PaymentAction::Defaulted] {
                let err = apply_action(&arrangement, action, at(2025, 1, 15), &mut events).unwrap_err();
                assert!(matches!(err, ArrangementError::InvalidTransition { .. }));
            }
        }
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_confirmed_accepts_actions() {
        let arrangement = single_arrangement("50");
        let mut events = EventStore::new();

        let confirmed = change_status(&arrangement, StatusEvent::Confirm, "debtor confirmed", at(2025, 1, 10), &mut events)
            .unwrap()
            .arrangement;
        assert_eq!(confirmed.status, ArrangementStatus::Confirmed);

        let result = apply_action(&confirmed, cont(), at(2025, 1, 15), &mut events).unwrap();
        assert_eq!(result.arrangement.status, ArrangementStatus::Completed);
    }

    #[test]
    fn test_reschedule_missed_plan() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();

        let missed = change_status(&arrangement, StatusEvent::MarkMissed, "no answer", at(2025, 1, 16), &mut events)
            .unwrap()
            .arrangement;
        let new_date = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();
        let update = reschedule(&missed, new_date, Some("14:30"), at(2025, 1, 16), &mut events).unwrap();

        let next = update.arrangement;
        assert_eq!(next.status, ArrangementStatus::Scheduled);
        assert_eq!(next.scheduled_date, new_date);
        assert_eq!(next.scheduled_time.as_deref(), Some("14:30"));
        assert_eq!(next.payment_instalments.as_ref().unwrap()[0].scheduled_date, new_date);
        assert_eq!(ledger::due_date(&next), new_date);
        assert_eq!(update.patch.status, Some(ArrangementStatus::Scheduled));
    }

    #[test]
    fn test_revise_plan_keeps_paid_entries() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();
        let after_one = apply_action(&arrangement, cont(), at(2025, 1, 15), &mut events)
            .unwrap()
            .arrangement;

        let mut revised = after_one.payment_instalments.clone().unwrap();
        revised.truncate(1);
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        revised.push(Instalment::pending(Money::from_major(20), d));
        revised.push(Instalment::pending(Money::from_major(20), d + chrono::Duration::days(7)));
        revised.push(Instalment::pending(Money::from_major(20), d + chrono::Duration::days(14)));

        let update = revise_plan(&after_one, revised, at(2025, 1, 20), &mut events).unwrap();
        let next = update.arrangement;
        assert_eq!(next.current_instalment_index, 1);
        assert_eq!(next.scheduled_date, d);
        assert_eq!(next.amount, Money::from_major(20));
        assert_eq!(next.total_payments, Some(4));
        assert_eq!(next.payments_made, 1);
        assert_eq!(ledger::remaining_balance(&next), Money::from_major(60));

        let reopened = vec![Instalment::pending(Money::from_major(90), d)];
        let err = revise_plan(&after_one, reopened, at(2025, 1, 20), &mut events).unwrap_err();
        assert!(matches!(err, ArrangementError::InconsistentState { .. }));

        assert!(revise_plan(&after_one, vec![], at(2025, 1, 20), &mut events).is_err());
    }

    #[test]
    fn test_revise_plan_rejects_out_of_range_amounts() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let mut events = EventStore::new();
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let huge: Money = serde_json::from_str("\"50000000000000000000000000000\"").unwrap();

        let plan = vec![Instalment::pending(huge, d), Instalment::pending(huge, d)];
        let err = revise_plan(&arrangement, plan, at(2025, 1, 20), &mut events).unwrap_err();
        assert!(matches!(err, ArrangementError::InvalidAmount { .. }));

        let at_limit = vec![
            Instalment::pending(Money::MAX_AMOUNT, d),
            Instalment::pending(Money::MAX_AMOUNT, d),
        ];
        let update = revise_plan(&arrangement, at_limit, at(2025, 1, 20), &mut events).unwrap();
        assert_eq!(
            update.arrangement.total_amount_owed,
            Some(Money::MAX_AMOUNT + Money::MAX_AMOUNT)
        );
    }
}
