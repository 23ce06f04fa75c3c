//! Monetary amounts with exactly 2 decimal places.
//!
//! Uses `rust_decimal` internally. Every constructor rounds *up* (away from
//! zero) to the hundredths digit, which is the rule the gateway uses when it
//! checks the transaction amount.

use crate::error::PaynowError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An amount of money in the reference currency, always at scale 2.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use paynow_client::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
///
/// let tiny = Money::from_str("0.001").unwrap();
/// assert_eq!(tiny.to_string(), "0.01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Smallest amount the gateway accepts by default.
    pub const DEFAULT_MINIMUM: Self = Money(Decimal::from_parts(100, 0, 0, false, 2));

    /// Rounds `value` up to 2 decimal places.
    ///
    /// Any remainder beyond the hundredths digit bumps the hundredths digit
    /// away from zero, so `1.001` becomes `1.01` and never `1.00`.
    pub fn round_up(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::AwayFromZero);
        rounded.rescale(Self::SCALE);
        Money(rounded)
    }

    /// Returns the underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money::round_up)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Ok(Money::round_up(decimal))
    }
}

impl TryFrom<f64> for Money {
    type Error = PaynowError;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        decimal_from_f64(value).map(Money::round_up)
    }
}

/// Converts a float to a decimal, rejecting NaN and infinities.
pub(crate) fn decimal_from_f64(value: f64) -> std::result::Result<Decimal, PaynowError> {
    if !value.is_finite() {
        return Err(PaynowError::invalid(
            "amount",
            format!("{} is not a finite number", value),
        ));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        PaynowError::invalid("amount", format!("{} cannot be represented", value))
    })
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
