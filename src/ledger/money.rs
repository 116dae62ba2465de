use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::errors::ExpenseError;

/// A monetary amount in minor units (cents) of the ledger currency.
///
/// Sums and deltas stay in integer arithmetic so long mutation sequences
/// never accumulate binary floating-point error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_units(major: i64, minor: i64) -> Self {
        Self(major * 100 + minor)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Parses `"9.99"`, `"-9.99"` or `"12"` (major units) into an amount.
    pub fn parse(input: &str) -> Result<Self, ExpenseError> {
        let raw = input.trim();
        let (negative, raw) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let cents = match raw.split_once('.') {
            Some((major, minor)) => {
                let major: i64 = major
                    .parse()
                    .map_err(|_| invalid_amount(input))?;
                let minor = match minor.len() {
                    1 => minor.parse::<i64>().map_err(|_| invalid_amount(input))? * 10,
                    2 => minor.parse::<i64>().map_err(|_| invalid_amount(input))?,
                    _ => return Err(invalid_amount(input)),
                };
                major * 100 + minor
            }
            None => raw.parse::<i64>().map_err(|_| invalid_amount(input))? * 100,
        };
        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Renders the amount with an explicit currency symbol. The symbol always
    /// comes from configuration passed by the caller, never ambient state.
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        format!(
            "{}{}{}.{:02}",
            if self.is_negative() { "-" } else { "" },
            symbol,
            (self.0 / 100).abs(),
            (self.0 % 100).abs()
        )
    }
}

fn invalid_amount(input: &str) -> ExpenseError {
    ExpenseError::Validation(format!("invalid amount `{}`", input))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{:02}",
            if self.is_negative() { "-" } else { "" },
            (self.0 / 100).abs(),
            (self.0 % 100).abs()
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, value| acc + value)
    }
}
