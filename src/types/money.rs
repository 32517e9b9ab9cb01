//! Monetary amounts for the ledger engine
//!
//! Amounts are held as signed integer minor units (cents) so that balances
//! never accumulate rounding drift. Decimal text is only accepted and
//! produced at the presentation boundary, through `rust_decimal`.

use super::error::BankError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by [`Money`]
pub const MINOR_UNIT_SCALE: u32 = 2;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// An amount of money in minor units
///
/// `Money` is a plain `i64` newtype. All arithmetic on it is checked; callers
/// turn a `None` into [`BankError::ArithmeticOverflow`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build an amount from minor units (cents)
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Build an amount from whole major units
    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(MINOR_UNITS_PER_MAJOR).map(Money)
    }

    /// The raw minor-unit value
    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Exact decimal representation with two fractional digits
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Convert a decimal amount into minor units
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` when the value carries sub-cent precision or
    /// does not fit in an `i64` of minor units.
    pub fn from_decimal(value: Decimal) -> Result<Self, BankError> {
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(BankError::invalid_amount(
                value,
                "at most 2 decimal places are allowed",
            ));
        }

        normalized
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .and_then(|minor| minor.to_i64())
            .map(Money)
            .ok_or_else(|| BankError::invalid_amount(value, "amount is out of range"))
    }
}

impl FromStr for Money {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|_| BankError::invalid_amount(trimmed, "not a number"))?;
        Money::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_decimal(), f)
    }
}
