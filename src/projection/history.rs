//! Working history: projected earnings joined with the reference table

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::earnings::EarningsRecord;
use crate::error::{BenefitError, Result};
use crate::reference::ReferenceTable;

/// One working year of the history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub year: u32,
    pub age: u32,

    /// Reported or projected wage (0 when neither)
    pub wage: f64,
    pub max_earn: f64,

    /// AWI[index_year] / AWI[year] before the index year, 1.0 from it on
    pub index: f64,

    /// Wage capped at the year's taxable maximum
    pub actual_earn: f64,
    pub indexed_earning: f64,
}

/// Contiguous, per-calculation view of every working year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHistory {
    /// Calendar year the individual turns the indexing age
    pub index_year: u32,

    /// Rows in ascending year order
    pub rows: Vec<HistoryRow>,
}

impl WorkingHistory {
    /// Join `earnings` with the table over `years`, deriving index and capped columns
    ///
    /// `first_age` is the age in the first year of the range.
    pub fn build(
        earnings: &EarningsRecord,
        years: RangeInclusive<u32>,
        first_age: u32,
        index_year: u32,
        table: &ReferenceTable,
    ) -> Result<Self> {
        let first_year = *years.start();
        let index_awi = if first_year < index_year {
            Some(table.awi(index_year)?)
        } else {
            None
        };

        let rows = years
            .map(|year| {
                let wage = earnings.wage(year).unwrap_or(0.0);
                let max_earn = table.max_earn(year)?;

                let index = match index_awi {
                    Some(base) if year < index_year => {
                        let awi = table.awi(year)?;
                        if awi == 0.0 {
                            return Err(BenefitError::DivisionByZero(format!(
                                "AWI for {} is zero",
                                year
                            )));
                        }
                        base / awi
                    }
                    _ => 1.0,
                };

                let actual_earn = wage.min(max_earn);
                Ok(HistoryRow {
                    year,
                    age: first_age + (year - first_year),
                    wage,
                    max_earn,
                    index,
                    actual_earn,
                    indexed_earning: actual_earn * index,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { index_year, rows })
    }

    pub fn first_year(&self) -> Option<u32> {
        self.rows.first().map(|r| r.year)
    }

    pub fn last_year(&self) -> Option<u32> {
        self.rows.last().map(|r| r.year)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, year: u32) -> Option<&HistoryRow> {
        let first = self.first_year()?;
        year.checked_sub(first)
            .and_then(|offset| self.rows.get(offset as usize))
    }

    /// The `n` highest indexed years, largest first
    ///
    /// Ties keep ascending year order, so the earliest year wins. Fewer than
    /// `n` rows are returned when the history is shorter; the missing years
    /// count as zero in any total.
    pub fn top_years(&self, n: usize) -> Vec<&HistoryRow> {
        let mut ranked: Vec<&HistoryRow> = self.rows.iter().collect();
        ranked.sort_by(|a, b| b.indexed_earning.total_cmp(&a.indexed_earning));
        ranked.truncate(n);
        ranked
    }

    /// Sum of the `n` highest indexed earnings
    pub fn top_indexed_total(&self, n: usize) -> f64 {
        self.top_years(n).iter().map(|r| r.indexed_earning).sum()
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            years: self.rows.len() as u32,
            years_with_earnings: self.rows.iter().filter(|r| r.wage > 0.0).count() as u32,
            total_wages: self.rows.iter().map(|r| r.wage).sum(),
            total_capped: self.rows.iter().map(|r| r.actual_earn).sum(),
            total_indexed: self.rows.iter().map(|r| r.indexed_earning).sum(),
        }
    }
}

/// Summary statistics for a working history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub years: u32,
    pub years_with_earnings: u32,
    pub total_wages: f64,
    pub total_capped: f64,
    pub total_indexed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{load_default_reference_table, YearParams};
    use approx::assert_relative_eq;

    #[test]
    fn test_index_freezes_at_index_year() {
        let table = load_default_reference_table().unwrap();
        let earnings = EarningsRecord::level(1970..=2018, 50_000.0).unwrap();

        let history = WorkingHistory::build(&earnings, 1970..=2018, 18, 2012, &table).unwrap();
        assert_eq!(history.len(), 49);
        assert_eq!(history.first_year(), Some(1970));
        assert_eq!(history.last_year(), Some(2018));

        for row in &history.rows {
            if row.year >= 2012 {
                assert_eq!(row.index, 1.0);
            } else {
                let expected = table.awi(2012).unwrap() / table.awi(row.year).unwrap();
                assert_relative_eq!(row.index, expected, max_relative = 1e-12);
            }
        }

        let row_1970 = history.row(1970).unwrap();
        assert_eq!(row_1970.age, 18);
        // 1970 taxable maximum was 7,800
        assert_eq!(row_1970.actual_earn, 7_800.0);
        assert_eq!(history.row(2018).unwrap().age, 66);
        assert!(history.row(2019).is_none());
    }

    #[test]
    fn test_missing_years_are_zero_rows() {
        let table = load_default_reference_table().unwrap();
        let earnings = EarningsRecord::from_pairs(vec![(2000, 10_000.0), (2005, 12_000.0)]).unwrap();

        let history = WorkingHistory::build(&earnings, 1998..=2006, 40, 2010, &table).unwrap();
        assert_eq!(history.len(), 9);
        assert_eq!(history.row(2003).unwrap().wage, 0.0);
        assert_eq!(history.row(2003).unwrap().indexed_earning, 0.0);

        let summary = history.summary();
        assert_eq!(summary.years, 9);
        assert_eq!(summary.years_with_earnings, 2);
        assert_eq!(summary.total_wages, 22_000.0);
    }

    #[test]
    fn test_top_years_ties_favor_earliest() {
        let table = ReferenceTable::from_rows((2000..=2005).map(|y| {
            (
                y,
                YearParams {
                    awi: 1.0,
                    max_earn: 1e9,
                    full_ret_age: 792,
                    cola: 0.0,
                },
            )
        }))
        .unwrap();
        let earnings = EarningsRecord::from_pairs(vec![
            (2000, 10.0),
            (2001, 30.0),
            (2002, 20.0),
            (2003, 30.0),
            (2004, 20.0),
            (2005, 5.0),
        ])
        .unwrap();

        let history = WorkingHistory::build(&earnings, 2000..=2005, 60, 2000, &table).unwrap();
        let years: Vec<u32> = history.top_years(4).iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2001, 2003, 2002, 2004]);
        assert_eq!(history.top_indexed_total(4), 100.0);

        // Shorter than n: everything participates, nothing invented
        assert_eq!(history.top_years(35).len(), 6);
        assert_eq!(history.top_indexed_total(35), 115.0);
    }

    #[test]
    fn test_missing_max_earn_is_out_of_range() {
        let table = load_default_reference_table().unwrap();
        let earnings = EarningsRecord::single(2023, 10_000.0).unwrap();

        let err = WorkingHistory::build(&earnings, 2020..=2024, 60, 2020, &table).unwrap_err();
        assert!(matches!(err, BenefitError::OutOfRange { year: 2024, field: "MaxEarn", .. }));
    }
}
