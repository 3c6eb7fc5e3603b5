//! Benefit calculation engine
//!
//! Runs one claim through the full formula: wage projection, indexing,
//! top-year selection, bend-point tiers, claiming adjustment, COLA and the
//! optional earnings test.

use log::debug;
use serde::{Deserialize, Serialize};

use super::formula::{
    average_indexed_monthly_earnings, bend_points, earnings_test, primary_insurance_amount, BendPoints,
    ClaimingAdjustment, EarningsTestOutcome,
};
use crate::earnings::EarningsRecord;
use crate::error::{BenefitError, Result};
use crate::projection::{WageProjector, WorkingHistory};
use crate::reference::{BenefitRules, ReferenceTable};

/// A single benefit estimate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Year the benefit is claimed; also the anchor for the earnings history
    pub benefit_year: u32,
    /// Year used for payment timing and the earnings test
    pub current_year: u32,
    /// Age in `benefit_year`
    pub age: u32,
    pub earnings: EarningsRecord,
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub earnings_test: bool,
}

impl Claim {
    /// Claim paid in its own benefit year, zero growth, no earnings test
    pub fn new(benefit_year: u32, age: u32, earnings: EarningsRecord) -> Self {
        Self {
            benefit_year,
            current_year: benefit_year,
            age,
            earnings,
            growth_rate: 0.0,
            earnings_test: false,
        }
    }

    pub fn with_current_year(mut self, current_year: u32) -> Self {
        self.current_year = current_year;
        self
    }

    pub fn with_growth_rate(mut self, growth_rate: f64) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    pub fn with_earnings_test(mut self, enabled: bool) -> Self {
        self.earnings_test = enabled;
        self
    }

    pub fn birth_year(&self) -> Result<u32> {
        self.benefit_year.checked_sub(self.age).ok_or_else(|| {
            BenefitError::InvalidInput(format!(
                "age {} in {} implies a birth year before year 0",
                self.age, self.benefit_year
            ))
        })
    }
}

/// Calculator configuration
#[derive(Debug, Clone, Default)]
pub struct CalculatorConfig {
    pub rules: BenefitRules,
    /// Attach the full working history to each breakdown
    pub detailed_output: bool,
}

/// Every intermediate value of a benefit calculation
#[derive(Debug, Clone, Serialize)]
pub struct BenefitBreakdown {
    pub benefit_year: u32,
    pub current_year: u32,
    pub age: u32,
    pub birth_year: u32,
    /// Year the individual turns the indexing age
    pub index_year: u32,
    /// Year of first eligibility; COLAs accrue from here
    pub eligibility_year: u32,
    pub payment_year: u32,
    pub growth_rate: f64,

    pub aime: f64,
    pub bend_points: BendPoints,
    pub pia: f64,
    pub adjustment: ClaimingAdjustment,
    pub cola_factor: f64,
    /// Adjusted PIA with COLA, before any earnings-test withholding
    pub benefit_before_test: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings_test: Option<EarningsTestOutcome>,
    pub monthly_benefit: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<WorkingHistory>,
}

/// Benefit calculator bound to a loaded reference table
#[derive(Debug, Clone)]
pub struct BenefitCalculator<'a> {
    table: &'a ReferenceTable,
    config: CalculatorConfig,
}

impl<'a> BenefitCalculator<'a> {
    pub fn new(table: &'a ReferenceTable, config: CalculatorConfig) -> Self {
        Self { table, config }
    }

    /// Calculator with the published rules and no history output
    pub fn with_defaults(table: &'a ReferenceTable) -> Self {
        Self::new(table, CalculatorConfig::default())
    }

    /// Monthly benefit for a claim
    pub fn monthly_benefit(&self, claim: &Claim) -> Result<f64> {
        self.calculate(claim).map(|b| b.monthly_benefit)
    }

    /// Run the full calculation for a claim
    pub fn calculate(&self, claim: &Claim) -> Result<BenefitBreakdown> {
        let rules = &self.config.rules;
        let table = self.table;

        if claim.age < rules.eligibility_age {
            return Err(BenefitError::InvalidInput(format!(
                "claiming age {} is below the earliest eligibility age {}",
                claim.age, rules.eligibility_age
            )));
        }
        let birth_year = claim.birth_year()?;
        let index_year = birth_year + rules.index_age;
        let eligibility_year = birth_year + rules.eligibility_age;

        // Step 1: complete the earnings series
        let projector = WageProjector::new(table, rules.start_work_age);
        let series = projector.project(claim.benefit_year, claim.age, &claim.earnings, claim.growth_rate)?;
        let start_year = projector.start_year(claim.benefit_year, claim.age)?;

        // Step 2: index and cap
        let history = WorkingHistory::build(
            &series,
            start_year..=claim.benefit_year,
            rules.start_work_age,
            index_year,
            table,
        )?;
        debug!(
            "claim {}/age {}: history {}-{}, index year {}",
            claim.benefit_year, claim.age, start_year, claim.benefit_year, index_year
        );

        // Step 3: AIME and PIA
        let aime = average_indexed_monthly_earnings(&history, rules.computation_years);
        let bends = bend_points(table, index_year, rules)?;
        let pia = primary_insurance_amount(aime, &bends, &rules.replacement_rates);
        debug!(
            "AIME {:.0}, bend points {:.0}/{:.0}, PIA {:.2}",
            aime, bends.first, bends.second, pia
        );

        // Step 4: early reduction or delayed credit
        let fra = table.full_ret_age(birth_year)?;
        let adjustment = ClaimingAdjustment::new(claim.age, fra, rules);
        let adjusted = pia * adjustment.factor();
        debug!(
            "FRA {} months, {} early / {} late, reduction {:.4}% credit {:.4}%",
            fra, adjustment.months_early, adjustment.months_late, adjustment.reduction_pct, adjustment.credit_pct
        );

        // Step 5: COLAs from eligibility up to the payment year
        let payment_year = claim.benefit_year.max(claim.current_year);
        let cola_factor = if payment_year > eligibility_year {
            table.cola_factor(eligibility_year, payment_year - 1)?
        } else {
            1.0
        };
        let benefit_before_test = adjusted * cola_factor;
        debug!("payment year {}, COLA factor {:.6}", payment_year, cola_factor);

        // Step 6: earnings test for early claimants still working
        let (earnings_test, monthly_benefit) = if claim.earnings_test && adjustment.is_early() {
            let earnings = claim.earnings.wage(claim.current_year).unwrap_or(0.0);
            let outcome = earnings_test(claim.current_year, earnings, adjustment.months_early, table, rules)?;
            debug!(
                "earnings test: earnings {:.2}, exempt {:.0}, annual withholding {:.2}",
                outcome.earnings, outcome.exempt_amount, outcome.annual_withholding
            );
            let net = (benefit_before_test - outcome.monthly_withholding).max(0.0);
            (Some(outcome), net)
        } else {
            (None, benefit_before_test)
        };

        Ok(BenefitBreakdown {
            benefit_year: claim.benefit_year,
            current_year: claim.current_year,
            age: claim.age,
            birth_year,
            index_year,
            eligibility_year,
            payment_year,
            growth_rate: claim.growth_rate,
            aime,
            bend_points: bends,
            pia,
            adjustment,
            cola_factor,
            benefit_before_test,
            earnings_test,
            monthly_benefit,
            history: self.config.detailed_output.then_some(history),
        })
    }
}

/// Monthly benefit for one scenario under the published rules
pub fn compute_benefit(
    benefit_year: u32,
    current_year: u32,
    age: u32,
    earnings: &EarningsRecord,
    growth_rate: f64,
    table: &ReferenceTable,
    earnings_test_enabled: bool,
) -> Result<f64> {
    let claim = Claim {
        benefit_year,
        current_year,
        age,
        earnings: earnings.clone(),
        growth_rate,
        earnings_test: earnings_test_enabled,
    };
    BenefitCalculator::with_defaults(table).monthly_benefit(&claim)
}

#[cfg(test)]
mod tests {
    use std::ops::RangeInclusive;

    use super::*;
    use crate::reference::load_default_reference_table;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::{prop_assert, proptest};

    fn table() -> ReferenceTable {
        load_default_reference_table().expect("Failed to load reference table")
    }

    fn detailed(table: &ReferenceTable) -> BenefitCalculator<'_> {
        BenefitCalculator::new(
            table,
            CalculatorConfig {
                rules: BenefitRules::default(),
                detailed_output: true,
            },
        )
    }

    #[test]
    fn test_flat_history_at_full_retirement_age() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);
        let claim = Claim::new(2018, 66, EarningsRecord::level(1970..=2018, 50_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        assert_eq!(b.birth_year, 1952);
        assert_eq!(b.index_year, 2012);
        assert_eq!(b.aime, 7_002.0);
        assert_eq!(b.bend_points, BendPoints { first: 816.0, second: 4917.0 });
        assert_abs_diff_eq!(b.pia, 2_359.47, epsilon = 1e-6);
        assert_eq!(b.adjustment.months_early, 0);
        assert_eq!(b.adjustment.months_late, 0);
        assert_abs_diff_eq!(b.cola_factor, 1.04045202, epsilon = 1e-9);
        assert_abs_diff_eq!(b.monthly_benefit, 2_454.915327629399, epsilon = 1e-6);
        assert!(b.earnings_test.is_none());
        assert!(b.history.is_none());
    }

    #[test]
    fn test_single_anchor_with_growth() {
        let table = table();
        let earnings = EarningsRecord::single(2018, 40_000.0).unwrap();

        let paid_2018 = compute_benefit(2018, 2018, 66, &earnings, 0.02, &table, false).unwrap();
        assert_abs_diff_eq!(paid_2018, 1_193.9395019903998, epsilon = 1e-6);

        // Two more COLAs when paid in 2020
        let paid_2020 = compute_benefit(2018, 2020, 66, &earnings, 0.02, &table, false).unwrap();
        assert_abs_diff_eq!(paid_2020, 1_247.0077249748692, epsilon = 1e-6);
    }

    #[test]
    fn test_claim_at_62_is_reduced() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);
        let claim = Claim::new(2018, 62, EarningsRecord::level(1974..=2018, 50_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        assert_eq!(b.aime, 7_659.0);
        assert_eq!(b.bend_points, BendPoints { first: 895.0, second: 5397.0 });
        assert_abs_diff_eq!(b.pia, 2_585.44, epsilon = 1e-6);
        assert_eq!(b.adjustment.full_retirement_age_months, 796);
        assert_eq!(b.adjustment.months_early, 52);
        assert_eq!(b.cola_factor, 1.0);
        assert!(b.monthly_benefit < b.pia);
        assert_abs_diff_eq!(b.monthly_benefit, 1_895.989333333334, epsilon = 1e-6);
    }

    #[test]
    fn test_claim_at_70_earns_credits() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);
        let claim = Claim::new(2022, 70, EarningsRecord::level(1970..=2022, 50_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        assert_eq!(b.aime, 7_002.0);
        assert_eq!(b.adjustment.months_late, 48);
        assert_abs_diff_eq!(b.adjustment.credit_pct, 32.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.cola_factor, 1.165773787034749, epsilon = 1e-9);
        assert_abs_diff_eq!(b.monthly_benefit, 3_630.8029260292406, epsilon = 1e-6);
    }

    #[test]
    fn test_delayed_credit_for_1955_cohort() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);
        // Born 1955, full retirement age 66 and 2 months
        let claim = Claim::new(2023, 68, EarningsRecord::level(1973..=2023, 50_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        assert_eq!(b.adjustment.full_retirement_age_months, 794);
        assert_eq!(b.adjustment.months_late, 22);
        assert_abs_diff_eq!(b.adjustment.credit_pct, 22.0 * 8.0 / 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.monthly_benefit, 3_646.435699297418, epsilon = 1e-6);
    }

    fn taxable_maximum(table: &ReferenceTable, years: RangeInclusive<u32>) -> EarningsRecord {
        EarningsRecord::from_pairs(years.map(|y| (y, table.max_earn(y).unwrap()))).unwrap()
    }

    #[test]
    fn test_taxable_maximum_earner_near_published_2018_maximum() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);

        // Published 2018 maximum at full retirement age is $2,788. The gap
        // comes from PIA and benefit dime rounding, which is not modelled.
        let at_fra = calc
            .calculate(&Claim::new(2018, 66, taxable_maximum(&table, 1970..=2018)))
            .unwrap();
        assert_abs_diff_eq!(at_fra.monthly_benefit, 2_798.576629835399, epsilon = 1e-6);
        assert_abs_diff_eq!(at_fra.monthly_benefit, 2_788.0, epsilon = 15.0);

        // Published 2018 maximum at 62 is $2,158
        let at_62 = calc
            .calculate(&Claim::new(2018, 62, taxable_maximum(&table, 1974..=2018)))
            .unwrap();
        assert_abs_diff_eq!(at_62.monthly_benefit, 2_150.4193333333337, epsilon = 1e-6);
        assert_abs_diff_eq!(at_62.monthly_benefit, 2_158.0, epsilon = 15.0);
    }

    #[test]
    fn test_claim_json_rejects_negative_wages() {
        let json = r#"{
            "benefit_year": 2018,
            "current_year": 2018,
            "age": 66,
            "earnings": {"2000": -1.0, "2018": 50000.0}
        }"#;
        assert!(serde_json::from_str::<Claim>(json).is_err());

        let valid = json.replace("-1.0", "30000.0");
        let claim: Claim = serde_json::from_str(&valid).unwrap();
        assert_eq!(claim.earnings.wage(2000), Some(30_000.0));
    }

    #[test]
    fn test_few_months_early() {
        let table = table();
        let earnings = EarningsRecord::level(1974..=2022, 50_000.0).unwrap();

        let benefit = compute_benefit(2022, 2022, 66, &earnings, 0.0, &table, false).unwrap();
        assert_abs_diff_eq!(benefit, 2_832.4800154936383, epsilon = 1e-6);
    }

    #[test]
    fn test_earnings_test_more_than_a_year_early() {
        let table = table();
        let calc = BenefitCalculator::with_defaults(&table);
        let claim = Claim::new(2018, 62, EarningsRecord::level(1974..=2018, 50_000.0).unwrap())
            .with_earnings_test(true);

        let b = calc.calculate(&claim).unwrap();
        let outcome = b.earnings_test.unwrap();
        assert_eq!(outcome.earnings, 50_000.0);
        assert_eq!(outcome.exempt_amount, 45_360.0);
        assert_abs_diff_eq!(outcome.annual_withholding, 1_546.6666666666667, epsilon = 1e-9);
        assert_abs_diff_eq!(b.monthly_benefit, 1_767.100444444445, epsilon = 1e-6);
        assert!(b.monthly_benefit <= b.benefit_before_test);
    }

    #[test]
    fn test_earnings_test_final_year_before_fra() {
        let table = table();
        let earnings = EarningsRecord::level(1971..=2018, 50_000.0).unwrap();

        let benefit = compute_benefit(2018, 2018, 65, &earnings, 0.0, &table, true).unwrap();
        assert_abs_diff_eq!(benefit, 908.1327531466661, epsilon = 1e-6);
    }

    #[test]
    fn test_high_current_earnings() {
        let table = table();
        let mut earnings = EarningsRecord::level(1974..=2017, 50_000.0).unwrap();
        earnings.insert(2018, 100_000.0).unwrap();

        let tested = compute_benefit(2018, 2018, 62, &earnings, 0.0, &table, true).unwrap();
        assert_abs_diff_eq!(tested, 388.771555555556, epsilon = 1e-6);

        let untested = compute_benefit(2018, 2018, 62, &earnings, 0.0, &table, false).unwrap();
        assert_abs_diff_eq!(untested, 1_906.5493333333336, epsilon = 1e-6);
    }

    #[test]
    fn test_withholding_floors_at_zero() {
        let table = table();
        let mut earnings = EarningsRecord::level(1974..=2017, 50_000.0).unwrap();
        earnings.insert(2018, 1_000_000.0).unwrap();

        let benefit = compute_benefit(2018, 2018, 62, &earnings, 0.0, &table, true).unwrap();
        assert_eq!(benefit, 0.0);
    }

    #[test]
    fn test_earnings_test_ignored_at_or_after_fra() {
        let table = table();
        let earnings = EarningsRecord::level(1970..=2018, 50_000.0).unwrap();

        let with_test = compute_benefit(2018, 2018, 66, &earnings, 0.0, &table, true).unwrap();
        let without = compute_benefit(2018, 2018, 66, &earnings, 0.0, &table, false).unwrap();
        assert_eq!(with_test, without);
    }

    #[test]
    fn test_current_year_earnings_do_not_matter_without_test() {
        let table = table();
        let base = EarningsRecord::level(1974..=2018, 50_000.0).unwrap();
        let mut extra = base.clone();
        extra.insert(2020, 250_000.0).unwrap();

        let a = compute_benefit(2018, 2020, 62, &base, 0.0, &table, false).unwrap();
        let b = compute_benefit(2018, 2020, 62, &extra, 0.0, &table, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_history_pads_with_zero_years() {
        let table = table();
        let calc = detailed(&table);
        let claim = Claim::new(2018, 62, EarningsRecord::level(1974..=1983, 50_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        let history = b.history.unwrap();
        assert_eq!(history.len(), 45);
        assert_eq!(history.summary().years_with_earnings, 10);

        let indexed_total: f64 = history.rows.iter().map(|r| r.indexed_earning).sum();
        assert_eq!(b.aime, (indexed_total / 420.0).floor());
    }

    #[test]
    fn test_below_eligibility_age() {
        let table = table();
        let earnings = EarningsRecord::single(2018, 50_000.0).unwrap();

        let err = compute_benefit(2018, 2018, 61, &earnings, 0.0, &table, false).unwrap_err();
        assert!(matches!(err, BenefitError::InvalidInput(_)));
    }

    #[test]
    fn test_birth_year_before_table_is_out_of_range() {
        let table = table();
        let earnings = EarningsRecord::level(1960..=2016, 50_000.0).unwrap();

        // Born 1950; the full-retirement-age schedule starts at 1951
        let err = compute_benefit(2016, 2016, 66, &earnings, 0.0, &table, false).unwrap_err();
        assert!(matches!(err, BenefitError::OutOfRange { year: 1950, .. }), "got {:?}", err);
    }

    #[test]
    fn test_payment_year_after_table_is_out_of_range() {
        let table = table();
        let earnings = EarningsRecord::single(2018, 50_000.0).unwrap();

        let err = compute_benefit(2018, 2030, 66, &earnings, 0.0, &table, false).unwrap_err();
        assert!(matches!(err, BenefitError::OutOfRange { .. }));
    }

    #[test]
    fn test_breakdown_serializes() {
        let table = table();
        let calc = detailed(&table);
        let claim = Claim::new(2018, 66, EarningsRecord::single(2018, 60_000.0).unwrap());

        let b = calc.calculate(&claim).unwrap();
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["aime"], serde_json::json!(b.aime));
        assert_eq!(json["history"]["rows"].as_array().unwrap().len(), 49);
        assert!(json.get("earnings_test").is_none());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_more_earnings_never_lowers_benefit(
            year in 1974u32..=2018,
            bump in 1.0f64..200_000.0,
            wage in 5_000.0f64..150_000.0,
        ) {
            let table = table();
            let base = EarningsRecord::level(1974..=2018, wage).unwrap();
            let mut raised = base.clone();
            raised.insert(year, wage + bump).unwrap();

            let before = compute_benefit(2018, 2018, 62, &base, 0.0, &table, false).unwrap();
            let after = compute_benefit(2018, 2018, 62, &raised, 0.0, &table, false).unwrap();
            prop_assert!(after >= before);
        }
    }
}
