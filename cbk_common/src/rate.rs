use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::{helpers::split_decimal, Vnd};

/// The number of basis points in a rate of 1.0 (100%).
pub const BASIS_POINTS_PER_UNIT: i64 = 10_000;

//--------------------------------------        Rate         ---------------------------------------------------------
/// A proportion, stored in basis points. `Rate::from_bps(1000)` is 10%, `Rate::from_bps(7000)` is 0.7.
///
/// Rates are applied with integer arithmetic so that ledger amounts never pick up floating point noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rate(i64);

#[derive(Debug, Clone, Error)]
#[error("Invalid rate: {0}")]
pub struct RateConversionError(String);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    /// 100%
    pub const ONE: Rate = Rate(BASIS_POINTS_PER_UNIT);

    pub const fn from_bps(bps: i64) -> Self {
        Self(bps)
    }

    pub fn bps(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a percentage string, as the marketplaces report commission rates (`"10"` → 10%, `"12.5"` → 12.5%).
    pub fn from_percent_str(s: &str) -> Result<Self, RateConversionError> {
        let (whole, hundredths, round_up) =
            split_decimal(s, 2).ok_or_else(|| RateConversionError(format!("'{s}' is not a valid percentage")))?;
        whole
            .checked_mul(100)
            .and_then(|bps| bps.checked_add(hundredths))
            .and_then(|bps| bps.checked_add(i64::from(round_up)))
            .map(Self)
            .ok_or_else(|| RateConversionError(format!("'{s}' is out of range")))
    }

    /// Parses a fraction string such as `"0.7"` (70%) or `"0.035"` (3.5%).
    pub fn from_fraction_str(s: &str) -> Result<Self, RateConversionError> {
        let (whole, bps, round_up) =
            split_decimal(s, 4).ok_or_else(|| RateConversionError(format!("'{s}' is not a valid fraction")))?;
        whole
            .checked_mul(BASIS_POINTS_PER_UNIT)
            .and_then(|v| v.checked_add(bps))
            .and_then(|v| v.checked_add(i64::from(round_up)))
            .map(Self)
            .ok_or_else(|| RateConversionError(format!("'{s}' is out of range")))
    }

    /// True for rates between 0% and 100% inclusive.
    pub fn is_proportion(&self) -> bool {
        (0..=BASIS_POINTS_PER_UNIT).contains(&self.0)
    }

    /// Applies the rate to an amount, truncating toward zero. Results beyond the range of `Vnd` saturate.
    pub fn apply(&self, amount: Vnd) -> Vnd {
        let result = i128::from(amount.value()) * i128::from(self.0) / i128::from(BASIS_POINTS_PER_UNIT);
        let result = i64::try_from(result).unwrap_or(if result < 0 { i64::MIN } else { i64::MAX });
        Vnd::from(result)
    }

    /// Combines two rates, e.g. a commission rate with the user's share of that commission. `None` if the result
    /// does not fit.
    pub fn checked_compound(&self, other: Rate) -> Option<Rate> {
        let bps = i128::from(self.0) * i128::from(other.0) / i128::from(BASIS_POINTS_PER_UNIT);
        i64::try_from(bps).ok().map(Rate)
    }
}

impl FromStr for Rate {
    type Err = RateConversionError;

    /// Accepts either a fraction (`0.7`) or a percentage with a trailing `%` (`70%`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().strip_suffix('%') {
            Some(pct) => Self::from_percent_str(pct),
            None => Self::from_fraction_str(s),
        }
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
