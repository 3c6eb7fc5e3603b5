//! Individual steps of the benefit formula
//!
//! Each step is a pure function of its inputs so the calculator can log and
//! report every intermediate value.

use serde::{Deserialize, Serialize};

use crate::error::{BenefitError, Result};
use crate::projection::WorkingHistory;
use crate::reference::{BenefitRules, ReferenceTable};

/// AIME thresholds where the replacement rate changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendPoints {
    pub first: f64,
    pub second: f64,
}

/// Bend points for an index year, scaled from the base-year values by AWI growth
///
/// Rounded half-up to whole dollars.
pub fn bend_points(table: &ReferenceTable, index_year: u32, rules: &BenefitRules) -> Result<BendPoints> {
    let ratio = table.awi_ratio(index_year, rules.bend_point_base_year)?;
    Ok(BendPoints {
        first: round_half_up(rules.first_bend_base * ratio),
        second: round_half_up(rules.second_bend_base * ratio),
    })
}

/// Average indexed monthly earnings over the top `computation_years`, floored to whole dollars
pub fn average_indexed_monthly_earnings(history: &WorkingHistory, computation_years: usize) -> f64 {
    if computation_years == 0 {
        return 0.0;
    }
    let total = history.top_indexed_total(computation_years);
    (total / (computation_years as f64 * 12.0)).floor()
}

/// Three-tier PIA: rates[0] below the first bend, rates[1] between bends, rates[2] above
pub fn primary_insurance_amount(aime: f64, bends: &BendPoints, rates: &[f64; 3]) -> f64 {
    let below_first = aime.min(bends.first) * rates[0];
    let between = (aime.min(bends.second) - bends.first).max(0.0) * rates[1];
    let above_second = (aime - bends.second).max(0.0) * rates[2];
    below_first + between + above_second
}

/// Early-claim reduction or delayed-claim credit relative to full retirement age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaimingAdjustment {
    pub full_retirement_age_months: u32,
    pub claim_age_months: u32,
    pub months_early: u32,
    /// Months past full retirement age, counted up to the credit cap age
    pub months_late: u32,
    pub reduction_pct: f64,
    pub credit_pct: f64,
}

impl ClaimingAdjustment {
    pub fn new(age: u32, full_retirement_age_months: u32, rules: &BenefitRules) -> Self {
        let claim_age_months = age * 12;
        let months_early = full_retirement_age_months.saturating_sub(claim_age_months);
        let months_late = (age.min(rules.max_credit_age) * 12).saturating_sub(full_retirement_age_months);

        let first_block = months_early.min(rules.early_reduction_first_months);
        let beyond_block = months_early.saturating_sub(rules.early_reduction_first_months);
        let reduction_pct = first_block as f64 * rules.early_reduction_first_rate
            + beyond_block as f64 * rules.early_reduction_extra_rate;
        let credit_pct = months_late as f64 * rules.delayed_credit_per_year / 12.0;

        Self {
            full_retirement_age_months,
            claim_age_months,
            months_early,
            months_late,
            reduction_pct,
            credit_pct,
        }
    }

    pub fn is_early(&self) -> bool {
        self.months_early > 0
    }

    /// Multiplier applied to the PIA
    pub fn factor(&self) -> f64 {
        1.0 + (self.credit_pct - self.reduction_pct) / 100.0
    }
}

/// Withholding for an early claimant who keeps working
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsTestOutcome {
    pub current_year: u32,
    pub earnings: f64,
    pub exempt_amount: f64,
    pub withholding_divisor: f64,
    pub annual_withholding: f64,
    pub monthly_withholding: f64,
}

/// Apply the earnings test to `earnings` in `current_year`
///
/// The exempt amount is the tier's base amount scaled by
/// AWI[current_year - 2] / AWI[tier base year], rounded to the nearest
/// multiple of `rules.exempt_rounding`.
pub fn earnings_test(
    current_year: u32,
    earnings: f64,
    months_early: u32,
    table: &ReferenceTable,
    rules: &BenefitRules,
) -> Result<EarningsTestOutcome> {
    let tier = rules.earnings_test_tier(months_early);
    if tier.withholding_divisor <= 0.0 {
        return Err(BenefitError::DataIntegrity(format!(
            "earnings-test withholding divisor must be positive, got {}",
            tier.withholding_divisor
        )));
    }

    let wage_level_year = current_year.saturating_sub(2);
    let scaled = tier.base_amount * table.awi_ratio(wage_level_year, tier.awi_base_year)?;
    let exempt_amount = round_to_multiple(scaled, rules.exempt_rounding);

    let annual_withholding = (earnings - exempt_amount).max(0.0) / tier.withholding_divisor;
    Ok(EarningsTestOutcome {
        current_year,
        earnings,
        exempt_amount,
        withholding_divisor: tier.withholding_divisor,
        annual_withholding,
        monthly_withholding: annual_withholding / 12.0,
    })
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_to_multiple(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        value
    } else {
        (value / step).round() * step
    }
}
