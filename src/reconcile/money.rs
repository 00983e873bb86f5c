use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-point units per currency unit (four fractional digits).
pub const SCALE: i64 = 10_000;

const FRACTION_DIGITS: usize = 4;

/// A currency amount held as an integer count of 1/10000 units.
///
/// Rendered prices and backend JSON numbers both normalize into this type,
/// so tolerance checks compare integers and the boundary is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("no amount present")]
    Empty,

    #[error("'{0}' is not a number after stripping currency formatting")]
    Invalid(String),

    #[error("'{0}' is out of range")]
    Overflow(String),
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents * (SCALE / 100))
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    /// Convert a backend decimal, rounding to the nearest fixed-point unit.
    pub fn from_f64(value: f64) -> Result<Self, MoneyParseError> {
        if !value.is_finite() {
            return Err(MoneyParseError::Invalid(value.to_string()));
        }
        let scaled = (value * SCALE as f64).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(MoneyParseError::Overflow(value.to_string()));
        }
        Ok(Money(scaled as i64))
    }

    /// Parse rendered currency text such as `"$1,234.50"`.
    ///
    /// Strips `$`, `,` and surrounding whitespace; accepts a leading `-`.
    /// Anything else left over is rejected rather than read as zero.
    pub fn parse_rendered(raw: &str) -> Result<Self, MoneyParseError> {
        let stripped: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
        let cleaned = stripped.trim();
        if cleaned.is_empty() {
            return Err(MoneyParseError::Empty);
        }

        let invalid = || MoneyParseError::Invalid(raw.trim().to_string());
        let overflow = || MoneyParseError::Overflow(raw.trim().to_string());

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, cleaned),
        };

        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let mut whole: i64 = 0;
        for d in int_part.bytes().map(|b| i64::from(b - b'0')) {
            whole = whole
                .checked_mul(10)
                .and_then(|w| w.checked_add(d))
                .ok_or_else(overflow)?;
        }

        let mut fraction: i64 = 0;
        let mut round_up = false;
        for (i, d) in frac_part.bytes().map(|b| i64::from(b - b'0')).enumerate() {
            if i < FRACTION_DIGITS {
                fraction = fraction * 10 + d;
            } else {
                round_up = i == FRACTION_DIGITS && d >= 5;
                break;
            }
        }
        for _ in frac_part.len().min(FRACTION_DIGITS)..FRACTION_DIGITS {
            fraction *= 10;
        }

        let units = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(fraction + i64::from(round_up)))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -units } else { units }))
    }

    pub fn checked_mul_quantity(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn abs_diff(self, other: Money) -> Money {
        Money(self.0.abs_diff(other.0).min(i64::MAX as u64) as i64)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let mut fraction = format!("{:04}", abs % SCALE as u64);
        while fraction.len() > 2 && fraction.ends_with('0') {
            fraction.pop();
        }
        write!(f, "{}{}.{}", sign, whole, fraction)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> f64 {
        money.0 as f64 / SCALE as f64
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::from_f64(value)
    }
}
