use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::parse_time_of_day;
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{ArrangementError, Result};
use crate::instalments::{generate_instalments, Instalment, RecurrencePlan};
use crate::types::{ArrangementId, ArrangementStatus, RecurrenceType};

/// one debt repayment agreement
///
/// Contact details are a snapshot taken at creation and are never re-resolved.
/// Progress is tracked by `payment_instalments` when present, otherwise by the
/// flat counters; read it through [`crate::instalments::ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrangement {
    // identification
    pub id: ArrangementId,
    pub address_index: usize,
    pub address: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub case_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,

    // current obligation
    pub status: ArrangementStatus,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub total_amount_owed: Option<Money>,

    // plan
    #[serde(default)]
    pub payment_instalments: Option<Vec<Instalment>>,
    #[serde(default)]
    pub current_instalment_index: usize,
    #[serde(default)]
    pub payments_made: u32,
    #[serde(default)]
    pub total_payments: Option<u32>,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub recurrence_interval: Option<u32>,

    // reminder bookkeeping
    #[serde(default)]
    pub last_reminder_sent: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// validated input for a new arrangement, as captured by the form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArrangement {
    pub address: String,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub case_reference: Option<String>,
    pub notes: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    /// total balance owed, as typed
    pub amount: String,
    /// anything already paid before the arrangement was made, as typed
    pub previous_payment: Option<String>,
    pub plan: Option<RecurrencePlan>,
}

impl Arrangement {
    /// build a new `Scheduled` arrangement from form input
    ///
    /// Every field is validated before anything is built. A plan of two or
    /// more instalments gets a generated ledger; anything else is a single
    /// payment of the outstanding balance.
    pub fn create(
        input: &NewArrangement,
        address_index: usize,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let address = input.address.trim();
        if address.is_empty() {
            return Err(ArrangementError::MissingAddress);
        }

        let scheduled_date = input
            .scheduled_date
            .ok_or_else(|| ArrangementError::validation("a payment date is required"))?;

        let scheduled_time = match non_blank(&input.scheduled_time) {
            Some(time) => Some(parse_time_of_day(&time)?.format("%H:%M").to_string()),
            None => None,
        };

        let total = Money::parse_positive(&input.amount)?;
        let previous = match non_blank(&input.previous_payment) {
            Some(raw) => {
                let paid = Money::parse(&raw)?;
                if paid.is_negative() {
                    return Err(ArrangementError::InvalidAmount { input: raw });
                }
                paid
            }
            None => Money::ZERO,
        };

        if previous >= total {
            return Err(ArrangementError::inconsistent(format!(
                "previous payment {} leaves nothing of {} to arrange",
                previous, total
            )));
        }
        let outstanding = total - previous;

        let now_date = now.date_naive();
        let mut arrangement = Self {
            id: Uuid::new_v4(),
            address_index,
            address: address.to_string(),
            customer_name: non_blank(&input.customer_name),
            phone_number: non_blank(&input.phone_number),
            case_reference: non_blank(&input.case_reference),
            notes: non_blank(&input.notes),
            status: ArrangementStatus::Scheduled,
            scheduled_date,
            scheduled_time,
            amount: outstanding,
            total_amount_owed: None,
            payment_instalments: None,
            current_instalment_index: 0,
            payments_made: 0,
            total_payments: None,
            recurrence_type: RecurrenceType::None,
            recurrence_interval: None,
            last_reminder_sent: None,
            reminder_count: 0,
            created_at: now,
            updated_at: now,
        };

        if scheduled_date < now_date {
            warn!(
                arrangement_id = %arrangement.id,
                %scheduled_date,
                "arrangement created with a payment date in the past"
            );
        }

        if let Some(plan) = input.plan.filter(RecurrencePlan::is_split) {
            let instalments = generate_instalments(
                scheduled_date,
                plan.recurrence_type,
                plan.interval,
                plan.count,
                outstanding,
                config.split_rounding,
            )?;

            arrangement.amount = instalments[0].amount;
            arrangement.total_amount_owed = Some(outstanding);
            arrangement.total_payments = Some(plan.count);
            arrangement.recurrence_type = plan.recurrence_type;
            arrangement.recurrence_interval = match plan.recurrence_type {
                RecurrenceType::Biweekly => None,
                _ => Some(plan.interval),
            };
            arrangement.payment_instalments = Some(instalments);
        }

        Ok(arrangement)
    }

    /// stamp the modification time
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// changed fields of an arrangement, handed to the persistence collaborator
///
/// An absent field is unchanged. For optional fields an explicit `null` clears
/// the stored value, so those are held as `Option<Option<T>>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ArrangementStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "cleared_or_set")]
    pub scheduled_time: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "cleared_or_set")]
    pub total_amount_owed: Option<Option<Money>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "cleared_or_set")]
    pub payment_instalments: Option<Option<Vec<Instalment>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_instalment_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments_made: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "cleared_or_set")]
    pub total_payments: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "cleared_or_set")]
    pub last_reminder_sent: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// a present field (even `null`) is a change; absent fields fall back to `default`
fn cleared_or_set<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ArrangementPatch {
    /// fields that differ between two versions of the same arrangement
    pub fn between(before: &Arrangement, after: &Arrangement) -> Self {
        fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
            (a != b).then(|| b.clone())
        }

        Self {
            status: changed(&before.status, &after.status),
            scheduled_date: changed(&before.scheduled_date, &after.scheduled_date),
            scheduled_time: changed(&before.scheduled_time, &after.scheduled_time),
            amount: changed(&before.amount, &after.amount),
            total_amount_owed: changed(&before.total_amount_owed, &after.total_amount_owed),
            payment_instalments: changed(&before.payment_instalments, &after.payment_instalments),
            current_instalment_index: changed(
                &before.current_instalment_index,
                &after.current_instalment_index,
            ),
            payments_made: changed(&before.payments_made, &after.payments_made),
            total_payments: changed(&before.total_payments, &after.total_payments),
            last_reminder_sent: changed(&before.last_reminder_sent, &after.last_reminder_sent),
            reminder_count: changed(&before.reminder_count, &after.reminder_count),
            updated_at: changed(&before.updated_at, &after.updated_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ArrangementPatch::default()
    }

    /// write the changed fields onto a stored copy
    pub fn apply_to(&self, arrangement: &mut Arrangement) {
        if let Some(status) = self.status {
            arrangement.status = status;
        }
        if let Some(date) = self.scheduled_date {
            arrangement.scheduled_date = date;
        }
        if let Some(time) = &self.scheduled_time {
            arrangement.scheduled_time = time.clone();
        }
        if let Some(amount) = self.amount {
            arrangement.amount = amount;
        }
        if let Some(owed) = self.total_amount_owed {
            arrangement.total_amount_owed = owed;
        }
        if let Some(instalments) = &self.payment_instalments {
            arrangement.payment_instalments = instalments.clone();
        }
        if let Some(index) = self.current_instalment_index {
            arrangement.current_instalment_index = index;
        }
        if let Some(made) = self.payments_made {
            arrangement.payments_made = made;
        }
        if let Some(total) = self.total_payments {
            arrangement.total_payments = total;
        }
        if let Some(sent) = self.last_reminder_sent {
            arrangement.last_reminder_sent = sent;
        }
        if let Some(count) = self.reminder_count {
            arrangement.reminder_count = count;
        }
        if let Some(updated) = self.updated_at {
            arrangement.updated_at = updated;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    pub(crate) fn form(amount: &str) -> NewArrangement {
        NewArrangement {
            address: "12 High Street".to_string(),
            customer_name: Some("Mr John Smith".to_string()),
            phone_number: Some("07700900123".to_string()),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            amount: amount.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn single_arrangement(amount: &str) -> Arrangement {
        Arrangement::create(&form(amount), 7, &EngineConfig::default(), created_at()).unwrap()
    }

    pub(crate) fn plan_arrangement(total: Decimal, count: u32) -> Arrangement {
        let mut input = form(&total.to_string());
        input.plan = Some(RecurrencePlan::monthly(1, count));
        Arrangement::create(&input, 7, &EngineConfig::default(), created_at()).unwrap()
    }

    #[test]
    fn test_create_single_payment() {
        let arrangement = single_arrangement("50");

        assert_eq!(arrangement.status, ArrangementStatus::Scheduled);
        assert_eq!(arrangement.amount.to_string(), "50.00");
        assert_eq!(arrangement.address_index, 7);
        assert!(arrangement.payment_instalments.is_none());
        assert_eq!(arrangement.total_amount_owed, None);
        assert_eq!(arrangement.current_instalment_index, 0);
    }

    #[test]
    fn test_create_plan_populates_ledger() {
        let arrangement = plan_arrangement(dec!(90), 3);

        let ledger = arrangement.payment_instalments.as_ref().unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(arrangement.amount, Money::from_major(30));
        assert_eq!(arrangement.total_amount_owed, Some(Money::from_major(90)));
        assert_eq!(arrangement.total_payments, Some(3));
        assert_eq!(arrangement.recurrence_type, RecurrenceType::Monthly);
        assert_eq!(arrangement.scheduled_date, ledger[0].scheduled_date);
    }

    #[test]
    fn test_single_count_plan_is_single_payment() {
        let mut input = form("40");
        input.plan = Some(RecurrencePlan::weekly(1, 1));
        let arrangement =
            Arrangement::create(&input, 1, &EngineConfig::default(), created_at()).unwrap();

        assert!(arrangement.payment_instalments.is_none());
        assert_eq!(arrangement.recurrence_type, RecurrenceType::None);
    }

    #[test]
    fn test_previous_payment_reduces_outstanding() {
        let mut input = form("100");
        input.previous_payment = Some("40".to_string());
        input.plan = Some(RecurrencePlan::weekly(1, 2));
        let arrangement =
            Arrangement::create(&input, 1, &EngineConfig::default(), created_at()).unwrap();

        assert_eq!(arrangement.total_amount_owed, Some(Money::from_major(60)));
        assert_eq!(arrangement.amount, Money::from_major(30));
    }

    #[test]
    fn test_create_validation_errors() {
        let config = EngineConfig::default();

        let mut input = form("50");
        input.address = "   ".to_string();
        assert!(matches!(
            Arrangement::create(&input, 0, &config, created_at()),
            Err(ArrangementError::MissingAddress)
        ));

        for bad in ["", "abc", "0", "-5"] {
            let input = form(bad);
            assert!(matches!(
                Arrangement::create(&input, 0, &config, created_at()),
                Err(ArrangementError::InvalidAmount { .. })
            ));
        }

        let mut input = form("50");
        input.previous_payment = Some("75".to_string());
        assert!(matches!(
            Arrangement::create(&input, 0, &config, created_at()),
            Err(ArrangementError::InconsistentState { .. })
        ));

        let mut input = form("50");
        input.scheduled_time = Some("quarter past".to_string());
        assert!(matches!(
            Arrangement::create(&input, 0, &config, created_at()),
            Err(ArrangementError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_time_is_normalised() {
        let mut input = form("50");
        input.scheduled_time = Some(" 9:05 ".to_string());
        let arrangement =
            Arrangement::create(&input, 0, &EngineConfig::default(), created_at()).unwrap();
        assert_eq!(arrangement.scheduled_time.as_deref(), Some("09:05"));
    }

    #[test]
    fn test_patch_contains_only_changes() {
        let before = plan_arrangement(dec!(90), 3);
        let mut after = before.clone();
        after.current_instalment_index = 1;
        after.payments_made = 1;

        let patch = ArrangementPatch::between(&before, &after);
        assert_eq!(patch.current_instalment_index, Some(1));
        assert_eq!(patch.payments_made, Some(1));
        assert!(patch.status.is_none());
        assert!(patch.amount.is_none());

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
        assert!(ArrangementPatch::between(&before, &before).is_empty());

        let mut stored = before.clone();
        patch.apply_to(&mut stored);
        assert_eq!(stored, after);
    }

    #[test]
    fn test_patch_json_keeps_cleared_fields() {
        let mut before = single_arrangement("50");
        before.scheduled_time = Some("10:00".to_string());
        before.total_payments = Some(2);
        let mut after = before.clone();
        after.scheduled_time = None;
        after.total_payments = None;

        let patch = ArrangementPatch::between(&before, &after);
        assert_eq!(patch.scheduled_time, Some(None));
        assert_eq!(patch.total_payments, Some(None));

        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"scheduledTime":null,"totalPayments":null}"#);

        let back: ArrangementPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
        assert!(!back.is_empty());

        let mut stored = before.clone();
        back.apply_to(&mut stored);
        assert_eq!(stored, after);

        let untouched: ArrangementPatch = serde_json::from_str("{}").unwrap();
        assert!(untouched.is_empty());
    }

    #[test]
    fn test_round_trips_persisted_shape() {
        let arrangement = plan_arrangement(dec!(90), 3);
        let json = serde_json::to_value(&arrangement).unwrap();

        assert_eq!(json["status"], "Scheduled");
        assert_eq!(json["amount"], "30.00");
        assert_eq!(json["totalAmountOwed"], "90.00");
        assert_eq!(json["recurrenceType"], "monthly");
        assert_eq!(json["paymentInstalments"].as_array().unwrap().len(), 3);

        let back: Arrangement = serde_json::from_value(json).unwrap();
        assert_eq!(back, arrangement);
    }
}
