//! Load an earnings history from a Year,Wage CSV

use csv::Reader;
use std::io::Read;
use std::path::Path;

use super::EarningsRecord;
use crate::error::Result;

/// Raw CSV row matching the earnings history columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Year")]
    year: u32,
    #[serde(rename = "Wage")]
    wage: f64,
}

/// Load an earnings history from a CSV file
pub fn load_earnings<P: AsRef<Path>>(path: P) -> Result<EarningsRecord> {
    let file = std::fs::File::open(path)?;
    load_earnings_from_reader(file)
}

/// Load an earnings history from any reader
pub fn load_earnings_from_reader<R: Read>(reader: R) -> Result<EarningsRecord> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut pairs = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        pairs.push((row.year, row.wage));
    }

    EarningsRecord::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenefitError;

    #[test]
    fn test_load_from_reader() {
        let data = "Year,Wage\n2015,30000\n2016,31500.5\n2018,36000\n";
        let record = load_earnings_from_reader(data.as_bytes()).unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.wage(2016), Some(31_500.5));
        assert_eq!(record.wage(2017), None);
    }

    #[test]
    fn test_negative_wage_in_file() {
        let data = "Year,Wage\n2015,-3\n";
        let err = load_earnings_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, BenefitError::InvalidInput(_)));
    }

    #[test]
    fn test_load_sample_history() {
        let record = load_earnings("data/earnings_sample.csv").expect("Failed to load sample earnings");
        assert_eq!(record.earliest_year(), Some(2010));
        assert_eq!(record.latest_year(), Some(2018));
    }
}
