//! Benefit formula, calculator and growth-rate solver

mod calculator;
pub mod formula;
mod solver;

pub use calculator::{compute_benefit, BenefitBreakdown, BenefitCalculator, CalculatorConfig, Claim};
pub use formula::{BendPoints, ClaimingAdjustment, EarningsTestOutcome};
pub use solver::{minimize_bounded, solve_growth_rate, GrowthSolution, GrowthSolveConfig, Minimum};
