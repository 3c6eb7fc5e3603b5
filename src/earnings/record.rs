//! Year-indexed earnings record

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{BenefitError, Result};

/// Reported or projected wages keyed by calendar year
///
/// Serialized as a plain year-to-wage map. Deserializing goes through the
/// same checks as [`EarningsRecord::insert`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, f64>", into = "BTreeMap<u32, f64>")]
pub struct EarningsRecord {
    wages: BTreeMap<u32, f64>,
}

impl EarningsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record holding a single reported year
    pub fn single(year: u32, wage: f64) -> Result<Self> {
        let mut record = Self::new();
        record.insert(year, wage)?;
        Ok(record)
    }

    /// Build from (year, wage) pairs; a repeated year is rejected
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut record = Self::new();
        for (year, wage) in pairs {
            if record.wages.contains_key(&year) {
                return Err(BenefitError::InvalidInput(format!(
                    "earnings for {} reported twice",
                    year
                )));
            }
            record.insert(year, wage)?;
        }
        Ok(record)
    }

    /// The same wage in every year of `years`
    pub fn level(years: RangeInclusive<u32>, wage: f64) -> Result<Self> {
        Self::from_pairs(years.map(|year| (year, wage)))
    }

    /// Set the wage for a year, replacing any previous value
    pub fn insert(&mut self, year: u32, wage: f64) -> Result<()> {
        if !wage.is_finite() || wage < 0.0 {
            return Err(BenefitError::InvalidInput(format!(
                "earnings for {} must be a non-negative amount, got {}",
                year, wage
            )));
        }
        self.wages.insert(year, wage);
        Ok(())
    }

    pub fn wage(&self, year: u32) -> Option<f64> {
        self.wages.get(&year).copied()
    }

    pub fn earliest_year(&self) -> Option<u32> {
        self.wages.keys().next().copied()
    }

    pub fn latest_year(&self) -> Option<u32> {
        self.wages.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.wages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wages.is_empty()
    }

    /// Years in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.wages.iter().map(|(year, wage)| (*year, *wage))
    }

    /// Copy of the entries whose year lies in `years`
    pub fn restricted_to(&self, years: RangeInclusive<u32>) -> Self {
        Self {
            wages: self
                .wages
                .range(years)
                .map(|(year, wage)| (*year, *wage))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<u32, f64>> for EarningsRecord {
    type Error = BenefitError;

    fn try_from(wages: BTreeMap<u32, f64>) -> Result<Self> {
        Self::from_pairs(wages)
    }
}

impl From<EarningsRecord> for BTreeMap<u32, f64> {
    fn from(record: EarningsRecord) -> Self {
        record.wages
    }
}
