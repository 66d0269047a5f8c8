use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::{helpers::split_decimal, op};

pub const VND_CURRENCY_CODE: &str = "VND";

//--------------------------------------        Vnd          ---------------------------------------------------------
/// An amount of Vietnamese đồng. The đồng has no sub-unit in circulation, so whole đồng are the smallest value.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Vnd(i64);

op!(binary Vnd, Add, add);
op!(binary Vnd, Sub, sub);
op!(inplace Vnd, AddAssign, add_assign);
op!(inplace Vnd, SubAssign, sub_assign);
op!(unary Vnd, Neg, neg);

impl Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in VND: {0}")]
pub struct VndConversionError(String);

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Vnd {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Vnd {}

impl TryFrom<u64> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(VndConversionError(format!("Value {value} is too large to convert to VND")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            let value = value as i64;
            Ok(Self(value))
        }
    }
}

/// Parses marketplace price strings such as `"129000"` or `"129000.50"`. Fractions are rounded to the nearest đồng.
impl FromStr for Vnd {
    type Err = VndConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, _, round_up) =
            split_decimal(s, 0).ok_or_else(|| VndConversionError(format!("'{s}' is not a valid amount")))?;
        whole
            .checked_add(i64::from(round_up))
            .map(Self)
            .ok_or_else(|| VndConversionError(format!("'{s}' is too large to represent in VND")))
    }
}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{grouped}₫")
    }
}

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a quantity. `None` on overflow.
    pub fn checked_mul(&self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(&self, rhs: Vnd) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Vnd::from(7000).to_string(), "7.000₫");
        assert_eq!(Vnd::from(950).to_string(), "950₫");
        assert_eq!(Vnd::from(1_234_567).to_string(), "1.234.567₫");
        assert_eq!(Vnd::from(-50_000).to_string(), "-50.000₫");
    }

    #[test]
    fn parse() {
        assert_eq!("100000".parse::<Vnd>().unwrap(), Vnd::from(100_000));
        assert_eq!("129000.50".parse::<Vnd>().unwrap(), Vnd::from(129_001));
        assert_eq!("129000.49".parse::<Vnd>().unwrap(), Vnd::from(129_000));
        assert!("₫12".parse::<Vnd>().is_err());
    }

    #[test]
    fn parse_out_of_range() {
        assert_eq!("9223372036854775807".parse::<Vnd>().unwrap(), Vnd::from(i64::MAX));
        assert_eq!("9223372036854775807.4".parse::<Vnd>().unwrap(), Vnd::from(i64::MAX));
        assert!("9223372036854775807.9".parse::<Vnd>().is_err());
        assert!("9223372036854775808".parse::<Vnd>().is_err());
        assert!("99999999999999999999999".parse::<Vnd>().is_err());
    }

    #[test]
    fn arithmetic() {
        let mut v = Vnd::from(100);
        v += Vnd::from(50);
        v -= Vnd::from(30);
        assert_eq!(v, Vnd::from(120));
        assert_eq!(-v, Vnd::from(-120));
        assert_eq!(v.checked_mul(3), Some(Vnd::from(360)));
        assert_eq!(Vnd::from(i64::MAX).checked_mul(2), None);
        assert_eq!(Vnd::from(i64::MAX).checked_add(Vnd::from(1)), None);
        let total: Vnd = vec![Vnd::from(1), Vnd::from(2), Vnd::from(3)].into_iter().sum();
        assert_eq!(total, Vnd::from(6));
    }
}
