use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const BRL_CURRENCY_CODE: &str = "BRL";
pub const BRL_SYMBOL: &str = "R$";

//--------------------------------------        Cents        ---------------------------------------------------------
/// A monetary amount in Brazilian centavos (1/100 of a real).
///
/// Amounts are always held as integer minor units, so that sums over line items are exact. On the wire, amounts are
/// written as decimal numbers in reais (`1050` centavos is `10.5`), which is what both the storefront and the payment
/// gateway expect.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as an amount in centavos: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_reais(reais: i64) -> Self {
        Self(reais * 100)
    }

    /// Converts a floating point amount in reais, as reported by the payment gateway, to the nearest centavo.
    pub fn from_reais_f64(reais: f64) -> Result<Self, CentsConversionError> {
        if !reais.is_finite() {
            return Err(CentsConversionError(format!("{reais} is not a finite amount")));
        }
        let cents = (reais * 100.0).round();
        if cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return Err(CentsConversionError(format!("{reais} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }

    /// The amount in reais, for serialization to JSON APIs that expect a decimal number.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_reais(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{BRL_SYMBOL} {},{:02}", abs / 100, abs % 100)
    }
}

/// Parses a price as it arrives from the storefront.
///
/// Accepted forms include plain decimals (`"10.50"`, `"10"`), Brazilian-formatted values (`"10,50"`, `"1.234,56"`)
/// and currency-formatted strings (`"R$ 10,50"`). When a comma is present it is the decimal separator and dots are
/// thousands separators; otherwise a dot is the decimal separator. At most two fractional digits are allowed.
impl FromStr for Cents {
    type Err = CentsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CentsConversionError(format!("'{s}' is not a valid price"));
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix(BRL_SYMBOL).unwrap_or(trimmed).trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let normalized =
            if unsigned.contains(',') { unsigned.replace('.', "").replacen(',', ".", 1) } else { unsigned.to_string() };
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };
        let is_digits = |v: &str| v.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) || fraction.len() > 2 {
            return Err(err());
        }
        if normalized.contains('.') && fraction.is_empty() {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let fraction = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| err())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| err())?,
        };
        let value = whole.checked_mul(100).and_then(|v| v.checked_add(fraction)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_reais())
    }
}

struct CentsVisitor;

impl<'de> Visitor<'de> for CentsVisitor {
    type Value = Cents;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an amount in reais, as a number or a formatted string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100).map(Cents).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Cents::from_reais_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CentsVisitor)
    }
}
