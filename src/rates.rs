//! Exchange-rate feed adapter.
//!
//! Conversion convention, used everywhere in the engine: a table fetched
//! with base `B` maps currency `X` to a multiplier `m` such that
//! `amount_in_B * m = amount_in_X`. Converting *out of* the base multiplies,
//! converting *into* the base divides. The base itself converts at identity.
//! A missing rate is an error; the engine never falls back to a multiplier
//! of 1.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::Currency;

/// Rate lookup failure.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("exchange-rate feed unavailable for base {0}")]
    Unavailable(Currency),
    #[error("no exchange rate for {0}")]
    MissingRate(Currency),
}

/// Multipliers for one base currency, as returned by the feed.
#[derive(Debug, Clone)]
pub struct RateTable {
    base: Currency,
    rates: HashMap<Currency, f64>,
}

impl RateTable {
    pub fn new(base: Currency, rates: HashMap<Currency, f64>) -> Self {
        RateTable { base, rates }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    fn rate(&self, currency: Currency) -> Result<f64, RateError> {
        if currency == self.base {
            return Ok(1.0);
        }
        self.rates
            .get(&currency)
            .copied()
            .ok_or(RateError::MissingRate(currency))
    }

    /// Convert minor units of the base currency into minor units of `to`,
    /// rounding half away from zero.
    pub fn from_base(&self, minor: i64, to: Currency) -> Result<i64, RateError> {
        let rate = self.rate(to)?;
        Ok((minor as f64 * rate).round() as i64)
    }

    /// Convert minor units of `from` into minor units of the base currency,
    /// rounding half away from zero.
    pub fn to_base(&self, minor: i64, from: Currency) -> Result<i64, RateError> {
        let rate = self.rate(from)?;
        Ok((minor as f64 / rate).round() as i64)
    }
}

/// External exchange-rate feed. Fetched fresh once per engine operation.
pub trait RateProvider {
    fn fetch_rates(&self, base: Currency) -> Result<RateTable, RateError>;
}

/// Static provider with rates pinned against an anchor currency; cross
/// rates for any requested base are derived from the anchor values.
#[derive(Debug, Clone)]
pub struct FixedRates {
    /// Units of each currency per one anchor unit.
    anchor: HashMap<Currency, f64>,
}

impl FixedRates {
    pub fn new(pairs: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        FixedRates {
            anchor: pairs.into_iter().collect(),
        }
    }
}

impl RateProvider for FixedRates {
    fn fetch_rates(&self, base: Currency) -> Result<RateTable, RateError> {
        let per_base = self
            .anchor
            .get(&base)
            .copied()
            .ok_or(RateError::Unavailable(base))?;
        let rates = self
            .anchor
            .iter()
            .map(|(&currency, &per_anchor)| (currency, per_anchor / per_base))
            .collect();
        Ok(RateTable::new(base, rates))
    }
}
