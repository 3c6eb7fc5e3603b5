//! SSA Benefit - Social Security retirement benefit estimator
//!
//! This library provides:
//! - Reference data (national average wage index, taxable maximum, full
//!   retirement age schedule, COLAs) and benefit-rule constants
//! - Backward wage projection from the most recent reported earnings
//! - The benefit formula: indexing, AIME, bend points, PIA, early/delayed
//!   claiming adjustment, COLA and the retirement earnings test
//! - A growth-rate solver and a parallel scenario runner

pub mod error;
pub mod reference;
pub mod earnings;
pub mod projection;
pub mod benefit;
pub mod scenario;

// Re-export commonly used types
pub use error::{BenefitError, Result};
pub use reference::{BenefitRules, ReferenceTable, YearParams};
pub use earnings::EarningsRecord;
pub use projection::{WageProjector, WorkingHistory};
pub use benefit::{compute_benefit, BenefitBreakdown, BenefitCalculator, CalculatorConfig, Claim};
pub use scenario::ScenarioRunner;
