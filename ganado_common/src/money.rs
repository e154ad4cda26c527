use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "MXN";
pub const DEFAULT_CURRENCY_CODE_LOWER: &str = "mxn";

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in minor units (centavos). The currency code travels separately on the record that
/// carries the amount.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor currency units: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
    }
}

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Builds an amount from whole currency units (pesos).
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// Renders the amount the way it appears on receipts and invoices, with the currency code trailing:
    /// `$60,000.00 MXN`.
    pub fn format_with(&self, code: &str) -> String {
        format!("{self} {code}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn money_arithmetic() {
        let a = Money::from(1_500);
        let b = Money::from(2_500);
        assert_eq!(a + b, Money::from(4_000));
        assert_eq!(b - a, Money::from(1_000));
        assert_eq!(-a, Money::from(-1_500));
        assert_eq!(a * 4, Money::from(6_000));
        let mut c = b;
        c -= a;
        assert_eq!(c, Money::from(1_000));
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_major(12).to_string(), "$12.00");
        assert_eq!(Money::from(12_345).to_string(), "$123.45");
        assert_eq!(Money::from(-5).to_string(), "-$0.05");
        assert_eq!(Money::from_major(1_500).to_string(), "$1,500.00");
        assert_eq!(Money::from_major(2_750_000).to_string(), "$2,750,000.00");
        assert_eq!(Money::from_major(-60_000).to_string(), "-$60,000.00");
    }

    #[test]
    fn money_formats_with_currency_code() {
        assert_eq!(Money::from_major(60_000).format_with("MXN"), "$60,000.00 MXN");
        assert_eq!(Money::from(150).format_with("USD"), "$1.50 USD");
    }
}
