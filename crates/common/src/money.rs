//! Monetary amounts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Money amount held in minor units (hundredths) to avoid floating point drift.
///
/// On the wire it is a plain JSON number in major units with two decimal
/// places (`150.00`), matching the `DECIMAL(12,2)` columns the services have
/// always exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g. `7500` = `75.00`).
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates an amount from whole major units.
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    /// Converts a decimal major-unit value, rounding to the nearest minor unit.
    pub fn from_decimal(value: f64) -> Self {
        Self {
            minor: (value * 100.0).round() as i64,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the amount as a decimal major-unit value.
    pub fn as_decimal(&self) -> f64 {
        self.minor as f64 / 100.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            minor: self.minor * i64::from(quantity),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("amount must be a finite number"));
        }
        Ok(Money::from_decimal(value))
    }
}
