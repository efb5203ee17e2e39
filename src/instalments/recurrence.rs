use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{add_months, add_weeks};
use crate::decimal::Money;
use crate::errors::{ArrangementError, Result};
use crate::instalments::Instalment;
use crate::types::RecurrenceType;

/// how the rounding remainder of an even split is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SplitRounding {
    /// every instalment gets `total / count` rounded to 2 dp; the sum may
    /// drift from the total by at most `count * 0.005`
    #[default]
    Uniform,
    /// the final instalment absorbs the remainder so the plan sums exactly
    FinalAbsorbsRemainder,
}

/// cadence and size of a split-balance plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePlan {
    pub recurrence_type: RecurrenceType,
    /// multiplier for weekly and monthly cadences, ignored for biweekly
    pub interval: u32,
    pub count: u32,
}

impl RecurrencePlan {
    pub fn weekly(interval: u32, count: u32) -> Self {
        Self { recurrence_type: RecurrenceType::Weekly, interval, count }
    }

    pub fn biweekly(count: u32) -> Self {
        Self { recurrence_type: RecurrenceType::Biweekly, interval: 2, count }
    }

    pub fn monthly(interval: u32, count: u32) -> Self {
        Self { recurrence_type: RecurrenceType::Monthly, interval, count }
    }

    /// plans of fewer than two payments are single payments
    pub fn is_split(&self) -> bool {
        self.count >= 2 && self.recurrence_type != RecurrenceType::None
    }

    /// due date of the instalment at `index` (0-based)
    pub fn due_date(&self, start: NaiveDate, index: u32) -> Result<NaiveDate> {
        match self.recurrence_type {
            RecurrenceType::Weekly => add_weeks(start, index * self.interval),
            RecurrenceType::Biweekly => add_weeks(start, index * 2),
            RecurrenceType::Monthly => add_months(start, index * self.interval),
            RecurrenceType::None => Err(ArrangementError::InvalidRecurrence {
                message: "no cadence given".to_string(),
            }),
        }
    }
}

/// generate the instalments of a split balance
///
/// The first instalment falls on `start`. Callers treat a `count` below two
/// as a single payment and never call this.
pub fn generate_instalments(
    start: NaiveDate,
    recurrence_type: RecurrenceType,
    interval: u32,
    count: u32,
    total: Money,
    rounding: SplitRounding,
) -> Result<Vec<Instalment>> {
    if count < 2 {
        return Err(ArrangementError::InvalidRecurrence {
            message: format!("a plan needs at least 2 instalments, got {}", count),
        });
    }

    if recurrence_type == RecurrenceType::None {
        return Err(ArrangementError::InvalidRecurrence {
            message: "a plan needs a weekly, biweekly or monthly cadence".to_string(),
        });
    }

    if interval == 0 && recurrence_type != RecurrenceType::Biweekly {
        return Err(ArrangementError::InvalidRecurrence {
            message: "interval must be at least 1".to_string(),
        });
    }

    if !total.is_positive() {
        return Err(ArrangementError::InvalidAmount {
            input: total.to_string(),
        });
    }

    let plan = RecurrencePlan { recurrence_type, interval, count };
    let share = total.split(count);

    let mut instalments = Vec::with_capacity(count as usize);
    for i in 0..count {
        let due = plan.due_date(start, i)?;
        instalments.push(Instalment::pending(share, due));
    }

    if rounding == SplitRounding::FinalAbsorbsRemainder {
        let others: Money = instalments[..instalments.len() - 1].iter().map(|i| i.amount).sum();
        if let Some(last) = instalments.last_mut() {
            last.amount = total - others;
        }
    }

    debug!(
        count,
        ?recurrence_type,
        interval,
        share = %share,
        "generated instalment plan"
    );

    Ok(instalments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_plan_is_deterministic() {
        let start = date(2025, 1, 15);
        let plan = generate_instalments(
            start,
            RecurrenceType::Monthly,
            1,
            3,
            Money::from_major(300),
            SplitRounding::Uniform,
        )
        .unwrap();

        let dates: Vec<_> = plan.iter().map(|i| i.scheduled_date).collect();
        let amounts: Vec<_> = plan.iter().map(|i| i.amount.to_string()).collect();
        assert_eq!(dates, vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15)]);
        assert_eq!(amounts, vec!["100.00", "100.00", "100.00"]);
        assert!(plan.iter().all(|i| !i.is_paid()));
    }

    #[test]
    fn test_weekly_applies_interval() {
        let plan = generate_instalments(
            date(2025, 1, 1),
            RecurrenceType::Weekly,
            2,
            3,
            Money::from_major(60),
            SplitRounding::Uniform,
        )
        .unwrap();

        let dates: Vec<_> = plan.iter().map(|i| i.scheduled_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 15), date(2025, 1, 29)]);
    }

    #[test]
    fn test_biweekly_ignores_interval() {
        let plan = generate_instalments(
            date(2025, 1, 1),
            RecurrenceType::Biweekly,
            5,
            3,
            Money::from_major(60),
            SplitRounding::Uniform,
        )
        .unwrap();

        let dates: Vec<_> = plan.iter().map(|i| i.scheduled_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 15), date(2025, 1, 29)]);
    }

    #[test]
    fn test_monthly_interval_clamps_month_end() {
        let plan = generate_instalments(
            date(2025, 1, 31),
            RecurrenceType::Monthly,
            1,
            3,
            Money::from_major(90),
            SplitRounding::Uniform,
        )
        .unwrap();

        assert_eq!(plan[1].scheduled_date, date(2025, 2, 28));
        assert_eq!(plan[2].scheduled_date, date(2025, 3, 31));
    }

    #[test]
    fn test_uniform_split_drift_is_bounded() {
        let total = Money::from_major(100);
        let plan = generate_instalments(
            date(2025, 1, 1),
            RecurrenceType::Weekly,
            1,
            3,
            total,
            SplitRounding::Uniform,
        )
        .unwrap();

        let sum: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(sum, Money::from_decimal(dec!(99.99)));
        let drift = (total - sum).as_decimal().abs();
        assert!(drift <= dec!(0.005) * rust_decimal::Decimal::from(3));
    }

    #[test]
    fn test_final_instalment_absorbs_remainder() {
        let plan = generate_instalments(
            date(2025, 1, 1),
            RecurrenceType::Weekly,
            1,
            3,
            Money::from_major(100),
            SplitRounding::FinalAbsorbsRemainder,
        )
        .unwrap();

        assert_eq!(plan[0].amount, Money::from_decimal(dec!(33.33)));
        assert_eq!(plan[2].amount, Money::from_decimal(dec!(33.34)));
        let sum: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(sum, Money::from_major(100));
    }

    #[test]
    fn test_rejects_invalid_plans() {
        let start = date(2025, 1, 1);
        let total = Money::from_major(100);

        assert!(generate_instalments(start, RecurrenceType::Monthly, 1, 1, total, SplitRounding::Uniform).is_err());
        assert!(generate_instalments(start, RecurrenceType::None, 1, 3, total, SplitRounding::Uniform).is_err());
        assert!(generate_instalments(start, RecurrenceType::Weekly, 0, 3, total, SplitRounding::Uniform).is_err());
        assert!(generate_instalments(start, RecurrenceType::Weekly, 1, 3, Money::ZERO, SplitRounding::Uniform).is_err());
    }

    #[test]
    fn test_plan_helpers() {
        assert!(RecurrencePlan::monthly(1, 3).is_split());
        assert!(!RecurrencePlan::monthly(1, 1).is_split());
        assert_eq!(RecurrencePlan::biweekly(4).interval, 2);
    }
}
