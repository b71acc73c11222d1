//! Fare calculation
//!
//! A pure rate-table lookup: currency-per-kilometre keyed by bus category,
//! with a fixed default when a category has no configured rate. Amounts
//! truncate to whole currency units, matching the granularity of the source
//! fare sheets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::BusCategory;

/// Default rate applied when a category has no entry, in currency units/km
pub const DEFAULT_RATE_PER_KM: f64 = 2.0;

/// Per-kilometre fare rates keyed by bus category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareTable {
    rates: HashMap<String, f64>,
    default_rate: f64,
}

impl FareTable {
    /// Create an empty table with the standard default rate
    #[must_use]
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
            default_rate: DEFAULT_RATE_PER_KM,
        }
    }

    /// Build a table from (category, rate) pairs
    #[must_use]
    pub fn from_rates<I, S>(rates: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (category, rate) in rates {
            table.set_rate(BusCategory::from(category.into()), rate);
        }
        table
    }

    /// Set the rate for a category
    pub fn set_rate(&mut self, category: BusCategory, rate_per_km: f64) {
        self.rates.insert(category.normalized(), rate_per_km);
    }

    /// Rate for a category, falling back to the default
    #[must_use]
    pub fn rate_for(&self, category: &BusCategory) -> f64 {
        self.rates
            .get(&category.normalized())
            .copied()
            .unwrap_or(self.default_rate)
    }

    /// Fare for a distance, truncated to whole currency units
    #[must_use]
    pub fn fare(&self, category: &BusCategory, distance_km: u32) -> u32 {
        let amount = self.rate_for(category) * f64::from(distance_km);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            amount.max(0.0).trunc() as u32
        }
    }

    /// Number of configured category rates
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether no category rates are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for FareTable {
    fn default() -> Self {
        Self::new()
    }
}
