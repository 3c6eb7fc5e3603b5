//! Earnings histories supplied by the caller

mod record;
mod loader;

pub use record::EarningsRecord;
pub use loader::{load_earnings, load_earnings_from_reader};
