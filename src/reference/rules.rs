//! Benefit-rule constants: bend-point bases, claiming adjustments, earnings-test tiers
//!
//! Defaults are the published SSA values. A JSON file may override any subset of them.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One earnings-test tier: exempt amount scaled by AWI growth, plus withholding rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsTestTier {
    /// Exempt amount at the base year's wage level
    pub base_amount: f64,
    /// AWI year the base amount is indexed from
    pub awi_base_year: u32,
    /// $1 withheld for every `withholding_divisor` dollars above the exempt amount
    pub withholding_divisor: f64,
}

/// Constants of the benefit formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenefitRules {
    /// Age at which the earnings history starts
    pub start_work_age: u32,
    /// Age whose calendar year freezes wage indexing
    pub index_age: u32,
    /// Earliest claiming age
    pub eligibility_age: u32,
    /// Delayed credits stop accruing at this age
    pub max_credit_age: u32,
    /// Number of highest indexed years averaged into AIME
    pub computation_years: usize,

    pub bend_point_base_year: u32,
    pub first_bend_base: f64,
    pub second_bend_base: f64,
    /// Replacement rates below the first bend, between bends, above the second bend
    pub replacement_rates: [f64; 3],

    /// Months charged at `early_reduction_first_rate`
    pub early_reduction_first_months: u32,
    /// Percent reduction per early month within the first block
    pub early_reduction_first_rate: f64,
    /// Percent reduction per early month beyond the first block
    pub early_reduction_extra_rate: f64,
    /// Percent credit per year claimed after full retirement age
    pub delayed_credit_per_year: f64,

    /// Applies in the last 12 months before full retirement age
    pub final_year_test: EarningsTestTier,
    /// Applies earlier than 12 months before full retirement age
    pub early_years_test: EarningsTestTier,
    /// Exempt amounts are rounded to the nearest multiple of this
    pub exempt_rounding: f64,
}

impl Default for BenefitRules {
    fn default() -> Self {
        Self {
            start_work_age: 18,
            index_age: 60,
            eligibility_age: 62,
            max_credit_age: 70,
            computation_years: 35,
            bend_point_base_year: 1977,
            first_bend_base: 180.0,
            second_bend_base: 1085.0,
            replacement_rates: [0.90, 0.32, 0.15],
            early_reduction_first_months: 36,
            early_reduction_first_rate: 5.0 / 9.0,
            early_reduction_extra_rate: 5.0 / 12.0,
            delayed_credit_per_year: 8.0,
            final_year_test: EarningsTestTier {
                base_amount: 8_040.0,
                awi_base_year: 1992,
                withholding_divisor: 2.0,
            },
            early_years_test: EarningsTestTier {
                base_amount: 30_000.0,
                awi_base_year: 2000,
                withholding_divisor: 3.0,
            },
            exempt_rounding: 120.0,
        }
    }
}

impl BenefitRules {
    /// Load rules from a JSON file; absent keys keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Parse rules from a JSON string; absent keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Earnings-test tier for a claimant `months_early` months before full retirement age
    pub fn earnings_test_tier(&self, months_early: u32) -> &EarningsTestTier {
        if months_early <= 12 {
            &self.final_year_test
        } else {
            &self.early_years_test
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let rules = BenefitRules::from_json_str(r#"{ "computation_years": 40, "delayed_credit_per_year": 7.5 }"#)
            .unwrap();
        assert_eq!(rules.computation_years, 40);
        assert_eq!(rules.delayed_credit_per_year, 7.5);
        assert_eq!(rules.bend_point_base_year, 1977);
        assert_eq!(rules.first_bend_base, 180.0);
        assert_eq!(rules.final_year_test.awi_base_year, 1992);
    }

    #[test]
    fn test_shipped_rules_file_matches_defaults() {
        let rules = BenefitRules::from_json_path("data/benefit_rules.json").unwrap();
        assert_eq!(rules, BenefitRules::default());
    }

    #[test]
    fn test_earnings_test_tier_selection() {
        let rules = BenefitRules::default();
        assert_eq!(rules.earnings_test_tier(1).withholding_divisor, 2.0);
        assert_eq!(rules.earnings_test_tier(12).withholding_divisor, 2.0);
        assert_eq!(rules.earnings_test_tier(13).withholding_divisor, 3.0);
        assert_eq!(rules.earnings_test_tier(60).awi_base_year, 2000);
    }
}
