//! Wage projection and the working-history join

mod projector;
mod history;

pub use projector::WageProjector;
pub use history::{HistoryRow, HistorySummary, WorkingHistory};
