use std::fmt;

use thiserror::Error;

/// Fixed-point monetary value in minor units (cents), stored as a scaled integer.
///
/// Signed: deposits and remainders are positive, withdrawals negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(i64);

/// Rejected major-unit input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("amount must be a finite number (got {0})")]
    NotFinite(f64),
    #[error("amount must be positive (got {0})")]
    NotPositive(f64),
}

impl Amount {
    const SCALE: i64 = 100;

    /// Parse a major-unit value (e.g. `100.50`) into minor units,
    /// rounding half away from zero. Rejects non-finite values and
    /// anything that is not strictly positive after scaling.
    pub fn from_major(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(value));
        }
        let minor = (value * Self::SCALE as f64).round() as i64;
        if minor <= 0 {
            return Err(ValidationError::NotPositive(value));
        }
        Ok(Amount(minor))
    }

    pub fn from_minor(value: i64) -> Self {
        Amount(value)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}
