//! Backward wage projection from the most recent reported earnings

use crate::earnings::EarningsRecord;
use crate::error::{BenefitError, Result};
use crate::reference::ReferenceTable;

/// Completes an earnings history back to the first working year
///
/// Years before the earliest reported year are derived from the following
/// year's wage, assuming the individual's wage tracks national AWI growth
/// scaled by `1 + growth_rate`:
///
/// `wage[y] = wage[y+1] / ((1 + growth_rate) * AWI[y+1] / AWI[y])`
///
/// Reported years are used as given; gaps between them are not filled.
#[derive(Debug, Clone, Copy)]
pub struct WageProjector<'a> {
    table: &'a ReferenceTable,
    start_work_age: u32,
}

impl<'a> WageProjector<'a> {
    pub fn new(table: &'a ReferenceTable, start_work_age: u32) -> Self {
        Self { table, start_work_age }
    }

    /// Calendar year in which someone aged `age` in `benefit_year` started work
    pub fn start_year(&self, benefit_year: u32, age: u32) -> Result<u32> {
        if age < self.start_work_age {
            return Err(BenefitError::InvalidInput(format!(
                "age {} is below the working-start age {}",
                age, self.start_work_age
            )));
        }
        (benefit_year + self.start_work_age)
            .checked_sub(age)
            .ok_or_else(|| {
                BenefitError::InvalidInput(format!(
                    "age {} in {} places the first working year before year 0",
                    age, benefit_year
                ))
            })
    }

    /// Produce the completed series for `start_year(benefit_year, age)..=benefit_year`
    ///
    /// `age` is the age in `benefit_year`, not in the last reported year. The
    /// projection chains back from the earliest reported year in the window,
    /// so a history whose latest report predates `benefit_year` is fine.
    /// Reported years after `benefit_year` or before the first working year
    /// are left out of the result. The caller's record is not modified.
    pub fn project(
        &self,
        benefit_year: u32,
        age: u32,
        known: &EarningsRecord,
        growth_rate: f64,
    ) -> Result<EarningsRecord> {
        if !growth_rate.is_finite() {
            return Err(BenefitError::InvalidInput(format!(
                "growth rate must be finite, got {}",
                growth_rate
            )));
        }

        self.table.row(benefit_year, "benefit year")?;
        let start = self.start_year(benefit_year, age)?;
        self.table.row(start, "first working year")?;
        for (year, _) in known.iter() {
            self.table.row(year, "reported earnings")?;
        }

        let mut series = known.restricted_to(start..=benefit_year);
        if series.len() < known.len() {
            log::warn!(
                "ignoring {} reported year(s) outside the working window {}-{}",
                known.len() - series.len(),
                start,
                benefit_year
            );
        }

        let earliest = series.earliest_year().ok_or_else(|| {
            BenefitError::InvalidInput(format!(
                "no reported earnings between {} and {}",
                start, benefit_year
            ))
        })?;
        let mut next_wage = series.wage(earliest).unwrap_or(0.0);

        let growth_factor = 1.0 + growth_rate;
        if growth_factor == 0.0 {
            return Err(BenefitError::DivisionByZero(format!(
                "growth rate {} zeroes the year-over-year wage ratio",
                growth_rate
            )));
        }
        if growth_factor < 0.0 {
            return Err(BenefitError::InvalidInput(format!(
                "growth rate {} would produce negative wages",
                growth_rate
            )));
        }

        for year in (start..earliest).rev() {
            let awi_next = self.table.awi(year + 1)?;
            let awi_this = self.table.awi(year)?;
            if awi_this == 0.0 {
                return Err(BenefitError::DivisionByZero(format!("AWI for {} is zero", year)));
            }

            let divisor = growth_factor * (awi_next / awi_this);
            if divisor == 0.0 {
                return Err(BenefitError::DivisionByZero(format!(
                    "wage ratio between {} and {} is zero",
                    year,
                    year + 1
                )));
            }

            let wage = next_wage / divisor;
            log::trace!("projected {} wage {:.2}", year, wage);
            series.insert(year, wage)?;
            next_wage = wage;
        }

        Ok(series)
    }
}
