//! Error types shared by the reference loader, the projector and the benefit formula

use thiserror::Error;

/// Errors raised while loading reference data or computing a benefit
#[derive(Debug, Error)]
pub enum BenefitError {
    /// A requested or derived year has no row in the reference table
    #[error("{field} for year {year} is outside the reference table span {first}-{last}")]
    OutOfRange {
        year: u32,
        first: u32,
        last: u32,
        field: &'static str,
    },

    /// Reference data is malformed (duplicate year, missing field, non-positive AWI, ...)
    #[error("Reference data integrity fault: {0}")]
    DataIntegrity(String),

    /// A divisor along the wage or index chain was zero
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// The growth-rate solver could not reproduce the target benefit
    #[error("No growth rate in [{lower}, {upper}] reproduces a monthly benefit of {target:.2}: {reason}")]
    NoSolution {
        target: f64,
        lower: f64,
        upper: f64,
        reason: String,
    },

    /// Caller supplied arguments that can never describe a valid claim
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BenefitError {
    /// True when the request itself is at fault rather than the reference data
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            BenefitError::InvalidInput(_) | BenefitError::OutOfRange { .. } | BenefitError::NoSolution { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BenefitError>;
