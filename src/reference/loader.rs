//! CSV-based reference table loader
//!
//! Loads the per-year SSA parameters from data/calculation_params.csv

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{ReferenceTable, YearParams};
use crate::error::{BenefitError, Result};

/// Default path to the reference parameter file
pub const DEFAULT_REFERENCE_PATH: &str = "data/calculation_params.csv";

/// Raw CSV row; every column is optional so a blank cell becomes a data-integrity fault
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Year")]
    year: u32,
    #[serde(rename = "AWI")]
    awi: Option<f64>,
    #[serde(rename = "MaxEarn")]
    max_earn: Option<f64>,
    #[serde(rename = "FullRetAge")]
    full_ret_age: Option<u32>,
    #[serde(rename = "COLA")]
    cola: Option<f64>,
}

impl CsvRow {
    fn into_params(self) -> Result<(u32, YearParams)> {
        let year = self.year;
        let missing = |field: &str| {
            BenefitError::DataIntegrity(format!("year {} is missing {}", year, field))
        };

        Ok((
            year,
            YearParams {
                awi: self.awi.ok_or_else(|| missing("AWI"))?,
                max_earn: self.max_earn.ok_or_else(|| missing("MaxEarn"))?,
                full_ret_age: self.full_ret_age.ok_or_else(|| missing("FullRetAge"))?,
                cola: self.cola.ok_or_else(|| missing("COLA"))?,
            },
        ))
    }
}

/// Load the reference table from a CSV file
pub fn load_reference_table<P: AsRef<Path>>(path: P) -> Result<ReferenceTable> {
    let file = File::open(path.as_ref())?;
    let table = load_reference_table_from_reader(file)?;
    log::debug!(
        "loaded {} reference years ({}-{}) from {}",
        table.len(),
        table.first_year(),
        table.last_year(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Load the reference table from any reader (e.g., string buffer, request body)
pub fn load_reference_table_from_reader<R: Read>(reader: R) -> Result<ReferenceTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        rows.push(row.into_params()?);
    }

    ReferenceTable::from_rows(rows)
}

/// Load the reference table from the default location
pub fn load_default_reference_table() -> Result<ReferenceTable> {
    load_reference_table(DEFAULT_REFERENCE_PATH)
}
