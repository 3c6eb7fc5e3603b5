//! Reference data: national wage index, taxable maximums, full retirement ages, COLAs
//! and the benefit-rule constants applied on top of them.

mod rules;
pub mod loader;

pub use rules::{BenefitRules, EarningsTestTier};
pub use loader::{load_default_reference_table, load_reference_table, load_reference_table_from_reader};

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{BenefitError, Result};

/// Parameters published for a single calendar year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearParams {
    /// National average wage index
    pub awi: f64,

    /// Maximum taxable earnings
    pub max_earn: f64,

    /// Full retirement age in months, for people *born* in this year
    pub full_ret_age: u32,

    /// Cost-of-living adjustment in percent, effective December of this year
    pub cola: f64,
}

impl YearParams {
    fn validate(&self, year: u32) -> Result<()> {
        if !self.awi.is_finite() || self.awi <= 0.0 {
            return Err(BenefitError::DataIntegrity(format!(
                "AWI for {} must be strictly positive, got {}",
                year, self.awi
            )));
        }
        if !self.max_earn.is_finite() || self.max_earn <= 0.0 {
            return Err(BenefitError::DataIntegrity(format!(
                "MaxEarn for {} must be strictly positive, got {}",
                year, self.max_earn
            )));
        }
        if self.full_ret_age == 0 {
            return Err(BenefitError::DataIntegrity(format!(
                "FullRetAge for {} must be a positive number of months",
                year
            )));
        }
        if !self.cola.is_finite() {
            return Err(BenefitError::DataIntegrity(format!(
                "COLA for {} is not a finite percentage",
                year
            )));
        }
        Ok(())
    }
}

/// Year-indexed reference table, immutable once built
///
/// Every accessor returns `OutOfRange` for a year without a row, so a
/// calculation never silently treats missing data as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    rows: BTreeMap<u32, YearParams>,
}

impl ReferenceTable {
    /// Build a table from (year, params) rows, rejecting duplicates and invalid values
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, YearParams)>,
    {
        let mut table = BTreeMap::new();
        for (year, params) in rows {
            params.validate(year)?;
            if table.insert(year, params).is_some() {
                return Err(BenefitError::DataIntegrity(format!(
                    "duplicate reference row for year {}",
                    year
                )));
            }
        }

        if table.is_empty() {
            return Err(BenefitError::DataIntegrity(
                "reference table has no rows".to_string(),
            ));
        }

        Ok(Self { rows: table })
    }

    pub fn first_year(&self) -> u32 {
        self.rows.keys().next().copied().unwrap_or_default()
    }

    pub fn last_year(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or_default()
    }

    /// Inclusive span of years covered by the table
    pub fn span(&self) -> RangeInclusive<u32> {
        self.first_year()..=self.last_year()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row, naming the field that needed it in the error
    pub fn row(&self, year: u32, field: &'static str) -> Result<&YearParams> {
        self.rows.get(&year).ok_or(BenefitError::OutOfRange {
            year,
            first: self.first_year(),
            last: self.last_year(),
            field,
        })
    }

    pub fn awi(&self, year: u32) -> Result<f64> {
        Ok(self.row(year, "AWI")?.awi)
    }

    pub fn max_earn(&self, year: u32) -> Result<f64> {
        Ok(self.row(year, "MaxEarn")?.max_earn)
    }

    /// Full retirement age in months for someone born in `birth_year`
    pub fn full_ret_age(&self, birth_year: u32) -> Result<u32> {
        Ok(self.row(birth_year, "FullRetAge")?.full_ret_age)
    }

    pub fn cola(&self, year: u32) -> Result<f64> {
        Ok(self.row(year, "COLA")?.cola)
    }

    /// AWI[numerator_year] / AWI[denominator_year]
    pub fn awi_ratio(&self, numerator_year: u32, denominator_year: u32) -> Result<f64> {
        let numerator = self.awi(numerator_year)?;
        let denominator = self.awi(denominator_year)?;
        if denominator == 0.0 {
            return Err(BenefitError::DivisionByZero(format!(
                "AWI for {} is zero",
                denominator_year
            )));
        }
        Ok(numerator / denominator)
    }

    /// Compound COLA factor for every year in `first..=last`
    ///
    /// An empty window (`first > last`) yields 1.0.
    pub fn cola_factor(&self, first: u32, last: u32) -> Result<f64> {
        let mut factor = 1.0;
        for year in first..=last {
            factor *= 1.0 + self.cola(year)? / 100.0;
        }
        Ok(factor)
    }
}
