use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{ArrangementError, Result};

/// number of decimal places every amount is held at
pub const CURRENCY_DP: u32 = 2;

/// Money type held at 2 decimal places (pounds and pence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// largest amount accepted from user input or a plan
    pub const MAX_AMOUNT: Money = Money(dec!(1000000000000.00));

    /// create from decimal, rounding half away from zero
    pub fn from_decimal(d: Decimal) -> Self {
        let mut rounded = d.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(CURRENCY_DP);
        Money(rounded)
    }

    /// parse a user-entered decimal string
    ///
    /// Surrounding whitespace is ignored. Anything that is not a plain decimal
    /// number is rejected here so it never reaches downstream arithmetic.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || ArrangementError::InvalidAmount {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.contains('_') {
            return Err(invalid());
        }

        let money = Decimal::from_str(trimmed)
            .map(Money::from_decimal)
            .map_err(|_| invalid())?;
        if !money.is_within_limit() {
            return Err(invalid());
        }
        Ok(money)
    }

    /// magnitude no larger than `MAX_AMOUNT`
    pub fn is_within_limit(&self) -> bool {
        self.0.abs() <= Money::MAX_AMOUNT.0
    }

    /// parse and require a strictly positive amount
    pub fn parse_positive(input: &str) -> Result<Self> {
        let money = Money::parse(input)?;
        if !money.is_positive() {
            return Err(ArrangementError::InvalidAmount {
                input: input.to_string(),
            });
        }
        Ok(money)
    }

    /// create from integer amount (pounds, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money::from_decimal(Decimal::from(amount))
    }

    /// create from minor amount (pence, cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, CURRENCY_DP))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money::from_decimal)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money::from_decimal)
    }

    /// add, clamping at the decimal range instead of overflowing
    pub fn saturating_add(self, other: Self) -> Self {
        match self.checked_add(other) {
            Some(sum) => sum,
            None if other.is_negative() => Money(Decimal::MIN),
            None => Money(Decimal::MAX),
        }
    }

    /// subtract, flooring the result at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        match self.checked_sub(other) {
            Some(difference) => difference.max(Money::ZERO),
            // only a large negative `other` overflows here
            None => Money(Decimal::MAX),
        }
    }

    /// split evenly into `parts`, each share rounded to 2 dp
    pub fn split(&self, parts: u32) -> Self {
        if parts == 0 {
            return *self;
        }
        Money::from_decimal(self.0 / Decimal::from(parts))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = ArrangementError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::from_decimal(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_decimal(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        *self = *self - other;
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money::from_decimal(self.0 * other)
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money::from_decimal(self.0 / other)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats_two_places() {
        assert_eq!(Money::parse("125").unwrap().to_string(), "125.00");
        assert_eq!(Money::parse(" 50.5 ").unwrap().to_string(), "50.50");
        assert_eq!(Money::parse("0.005").unwrap().to_string(), "0.01");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("abc"),
            Err(ArrangementError::InvalidAmount { .. })
        ));
        assert!(Money::parse("").is_err());
        assert!(Money::parse("12.3.4").is_err());
        assert!(Money::parse("1_000").is_err());
    }

    #[test]
    fn test_parse_caps_amounts() {
        assert_eq!(Money::parse("1000000000000").unwrap(), Money::MAX_AMOUNT);
        assert!(Money::parse("1000000000000.01").is_err());
        assert!(Money::parse("50000000000000000000000000000").is_err());
        assert!(Money::parse("-1000000000001").is_err());
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        let huge: Money = serde_json::from_str("\"50000000000000000000000000000\"").unwrap();
        assert!(huge.checked_add(huge).is_none());

        let total: Money = [huge, huge].into_iter().sum();
        assert_eq!(total.as_decimal(), Decimal::MAX);
        assert_eq!(Money::from_major(10).saturating_sub(total), Money::ZERO);
        assert_eq!(Money::from_major(5).saturating_add(Money::from_major(7)), Money::from_major(12));
    }

    #[test]
    fn test_parse_positive() {
        assert!(Money::parse_positive("0").is_err());
        assert!(Money::parse_positive("-10.00").is_err());
        assert_eq!(Money::parse_positive("10").unwrap(), Money::from_major(10));
    }

    #[test]
    fn test_split_rounds_each_share() {
        let total = Money::from_major(100);
        assert_eq!(total.split(3), Money::from_decimal(dec!(33.33)));
        assert_eq!(Money::from_major(300).split(3), Money::from_major(100));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let owed = Money::from_major(50);
        assert_eq!(owed.saturating_sub(Money::from_major(80)), Money::ZERO);
        assert_eq!(owed.saturating_sub(Money::from_minor(2550)), Money::from_minor(2450));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_major(30)).unwrap();
        assert_eq!(json, "\"30.00\"");
    }
}
