//! Scenario runner for batch benefit estimates
//!
//! Loads the reference table and rules once, then evaluates any number of
//! claims against them without re-reading files.

use std::io::Read;
use std::path::Path;

use csv::Reader;
use rayon::prelude::*;
use serde::Deserialize;

use crate::benefit::{
    solve_growth_rate, BenefitBreakdown, BenefitCalculator, CalculatorConfig, Claim, GrowthSolution,
    GrowthSolveConfig,
};
use crate::earnings::EarningsRecord;
use crate::error::Result;
use crate::reference::{load_default_reference_table, load_reference_table, BenefitRules, ReferenceTable};

/// One row of a scenario file
///
/// The earnings history is the single anchor wage in the benefit year,
/// completed backwards at the row's growth rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioRow {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "BenefitYear")]
    pub benefit_year: u32,
    #[serde(rename = "CurrentYear")]
    pub current_year: u32,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "AnchorWage")]
    pub anchor_wage: f64,
    #[serde(rename = "GrowthRate", default)]
    pub growth_rate: f64,
    #[serde(rename = "EarningsTest", default)]
    pub earnings_test: bool,
    /// Golden value to validate against, when known
    #[serde(rename = "ExpectedBenefit", default)]
    pub expected_benefit: Option<f64>,
}

impl ScenarioRow {
    pub fn to_claim(&self) -> Result<Claim> {
        let earnings = EarningsRecord::single(self.benefit_year, self.anchor_wage)?;
        Ok(Claim::new(self.benefit_year, self.age, earnings)
            .with_current_year(self.current_year)
            .with_growth_rate(self.growth_rate)
            .with_earnings_test(self.earnings_test))
    }
}

/// Load scenario rows from a CSV file
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<ScenarioRow>> {
    let file = std::fs::File::open(path)?;
    load_scenarios_from_reader(file)
}

pub fn load_scenarios_from_reader<R: Read>(reader: R) -> Result<Vec<ScenarioRow>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut scenarios = Vec::new();
    for result in csv_reader.deserialize() {
        scenarios.push(result?);
    }
    Ok(scenarios)
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// for rate in [0.0, 0.01, 0.02] {
///     let claim = Claim::new(2018, 66, earnings.clone()).with_growth_rate(rate);
///     let breakdown = runner.run(&claim)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    table: ReferenceTable,
    config: CalculatorConfig,
}

impl ScenarioRunner {
    /// Runner over an already built table with the published rules
    pub fn new(table: ReferenceTable) -> Self {
        Self {
            table,
            config: CalculatorConfig::default(),
        }
    }

    /// Runner over the bundled reference table
    pub fn from_csv() -> Result<Self> {
        Ok(Self::new(load_default_reference_table()?))
    }

    /// Runner over a reference table at `path`
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(load_reference_table(path)?))
    }

    pub fn with_rules(mut self, rules: BenefitRules) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn with_detailed_output(mut self, detailed: bool) -> Self {
        self.config.detailed_output = detailed;
        self
    }

    pub fn calculator(&self) -> BenefitCalculator<'_> {
        BenefitCalculator::new(&self.table, self.config.clone())
    }

    pub fn run(&self, claim: &Claim) -> Result<BenefitBreakdown> {
        self.calculator().calculate(claim)
    }

    /// Evaluate claims in parallel; results keep the input order
    pub fn run_batch(&self, claims: &[Claim]) -> Vec<Result<BenefitBreakdown>> {
        let calculator = self.calculator();
        claims.par_iter().map(|claim| calculator.calculate(claim)).collect()
    }

    /// Same claim under several growth rates
    pub fn run_growth_rates(&self, claim: &Claim, growth_rates: &[f64]) -> Vec<Result<BenefitBreakdown>> {
        let calculator = self.calculator();
        growth_rates
            .par_iter()
            .map(|&rate| calculator.calculate(&claim.clone().with_growth_rate(rate)))
            .collect()
    }

    pub fn solve_growth_rate(
        &self,
        claim: &Claim,
        target: f64,
        config: &GrowthSolveConfig,
    ) -> Result<GrowthSolution> {
        solve_growth_rate(&self.calculator(), claim, target, config)
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn rules(&self) -> &BenefitRules {
        &self.config.rules
    }
}
