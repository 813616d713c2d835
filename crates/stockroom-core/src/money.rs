//! # Money Module
//!
//! Fixed-point prices stored as integer cents.
//!
//! ## Precision Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price column: NUMERIC(10, 2)                                           │
//! │                                                                         │
//! │  "9.99"        → 999 cents           ✓                                  │
//! │  9.99 (JSON)   → 999 cents           ✓  (shortest float repr)           │
//! │  "12"          → 1200 cents          ✓                                  │
//! │  "1.999"       → error               ✗  (more than 2 decimals)          │
//! │  "123456789"   → error               ✗  (more than 8 integer digits)    │
//! │                                                                         │
//! │  Serialized back out as a two-decimal string: "9.99"                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Integer digits allowed before the decimal point.
const MAX_INTEGER_DIGITS: usize = 8;

/// Decimal places allowed after the decimal point.
const MAX_DECIMAL_PLACES: usize = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A price in the smallest currency unit (cents).
///
/// Never built from arithmetic on floats: JSON numbers are read through
/// their shortest decimal representation and parsed as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a stock quantity.
    ///
    /// Saturates at the i64 bounds.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit = Money::from_cents(299);
    /// assert_eq!(unit.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, quantity: i64) -> Money {
        Money(self.0.saturating_mul(quantity))
    }

    /// Applies an exchange rate, rounding half away from zero to the cent.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let cad = Money::from_cents(1000);
    /// assert_eq!(cad.convert(0.75).unwrap().cents(), 750);
    /// ```
    pub fn convert(&self, rate: f64) -> CoreResult<Money> {
        let converted = (self.0 as f64 * rate).round();
        if !converted.is_finite() || converted.abs() >= i64::MAX as f64 {
            return Err(CoreError::ConversionOverflow);
        }
        Ok(Money(converted as i64))
    }

    /// Parses a fixed-point decimal string.
    ///
    /// Accepts an optional leading `-`, at most eight integer digits and at
    /// most two decimal places.
    pub fn parse(input: &str) -> CoreResult<Money> {
        let invalid = |reason: &str| CoreError::InvalidPrice {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (integer, fraction) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };

        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid("empty value"));
        }
        if !integer.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }
        if fraction.len() > MAX_DECIMAL_PLACES {
            return Err(invalid("more than 2 decimal places"));
        }

        let significant = integer.trim_start_matches('0');
        if significant.len() > MAX_INTEGER_DIGITS {
            return Err(invalid("more than 8 integer digits"));
        }

        let major: i64 = if significant.is_empty() {
            0
        } else {
            significant
                .parse()
                .map_err(|_| invalid("not a decimal number"))?
        };
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("not a decimal number"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("not a decimal number"))?,
        };

        let cents = major * 100 + minor;
        Ok(Money(if negative { -cents } else { cents }))
    }

    fn from_f64(value: f64) -> CoreResult<Money> {
        if !value.is_finite() {
            return Err(CoreError::InvalidPrice {
                input: value.to_string(),
                reason: "not a finite number".to_string(),
            });
        }
        // `{}` on f64 prints the shortest representation that round-trips,
        // so 9.99 becomes "9.99" and never "9.9900000000000002".
        Money::parse(&format!("{}", value))
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal price with at most 2 decimal places")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Money::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed_point() {
        assert_eq!(Money::parse("9.99").unwrap().cents(), 999);
        assert_eq!(Money::parse("9.9").unwrap().cents(), 990);
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse("0.05").unwrap().cents(), 5);
        assert_eq!(Money::parse(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse(" 3.10 ").unwrap().cents(), 310);
        assert_eq!(Money::parse("-5.50").unwrap().cents(), -550);
        assert_eq!(Money::parse("99999999.99").unwrap().cents(), 9_999_999_999);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.999").is_err());
        assert!(Money::parse("123456789").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("1e5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(999).to_string(), "9.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(1_000).to_string(), "10.00");
    }

    #[test]
    fn test_json_accepts_numbers_and_strings() {
        let from_float: Money = serde_json::from_str("9.99").unwrap();
        let from_int: Money = serde_json::from_str("12").unwrap();
        let from_str: Money = serde_json::from_str("\"9.99\"").unwrap();
        assert_eq!(from_float.cents(), 999);
        assert_eq!(from_int.cents(), 1200);
        assert_eq!(from_str, from_float);

        assert!(serde_json::from_str::<Money>("0.30000000000000004").is_err());
        assert_eq!(serde_json::to_string(&from_float).unwrap(), "\"9.99\"");
    }

    #[test]
    fn test_convert_and_sum() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 350);
        assert_eq!(total.convert(1.0).unwrap(), total);
        assert_eq!(Money::from_cents(999).convert(0.5).unwrap().cents(), 500);
        assert!(Money::from_cents(1).convert(f64::INFINITY).is_err());
    }
}
