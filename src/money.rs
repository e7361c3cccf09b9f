//! Fixed-point money at scale 2, with banker's rounding for every scale
//! reduction. Division (used only by the expense resolver's common-fraction
//! step) goes through an intermediate scale of 3 before being rounded back
//! down to 2, which keeps per-cent shares stable regardless of participant
//! order.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const SCALE: u32 = 2;
const WORKING_SCALE: u32 = 3;
const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

/// An exact decimal amount of money, always held at scale 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Rounds `value` to scale 2 using banker's rounding.
    pub fn new(value: Decimal) -> Money {
        Money(value.round_dp_with_strategy(SCALE, ROUNDING))
    }

    /// Parses a decimal literal (as produced by the expense grammar's
    /// `AMOUNT`/`PlusMod`/`StarMod` productions) into money at scale 2.
    pub fn parse(s: &str) -> Result<Money, rust_decimal::Error> {
        Ok(Money::new(Decimal::from_str(s)?))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == dec!(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.is_zero()
    }

    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    /// The absolute value expressed as an integer number of cents. Safe
    /// because every `Money` is already held at scale 2.
    pub fn cents(&self) -> i64 {
        (self.0.abs() * dec!(100))
            .round_dp_with_strategy(0, ROUNDING)
            .to_string()
            .parse()
            .expect("scale-2 money converts exactly to an integer cent count")
    }

    pub fn from_cents(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2))
    }

    /// Divides `self` by `divisor` at the working scale of 3, rounding
    /// half-to-even, without collapsing back to scale 2 — used for
    /// `commonFraction` in the expense resolver, which is itself multiplied
    /// by a starMod before the final scale-2 rounding happens.
    pub fn div_at_working_scale(&self, divisor: Decimal) -> Decimal {
        (self.0 / divisor).round_dp_with_strategy(WORKING_SCALE, ROUNDING)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Money {
        Money::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Money {
        Money::new(value)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
