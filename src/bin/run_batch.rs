//! Run every scenario in a CSV file and write the benefits to an output CSV
//!
//! Rows carrying an ExpectedBenefit are compared against the computed value,
//! so the same driver doubles as a golden-value check:
//!
//! ```text
//! run_batch --scenarios data/validation_cases.csv --output validation_output.csv
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;

use ssa_benefit::reference::loader::DEFAULT_REFERENCE_PATH;
use ssa_benefit::scenario::load_scenarios;
use ssa_benefit::{BenefitRules, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(about = "Compute monthly benefits for a file of scenarios")]
struct Cli {
    /// Scenario CSV (Id,BenefitYear,CurrentYear,Age,AnchorWage,GrowthRate,EarningsTest[,ExpectedBenefit])
    #[arg(long, default_value = "data/scenarios.csv")]
    scenarios: PathBuf,

    #[arg(long, default_value = "batch_output.csv")]
    output: PathBuf,

    #[arg(long, default_value = DEFAULT_REFERENCE_PATH)]
    params: PathBuf,

    #[arg(long)]
    rules: Option<PathBuf>,

    /// Largest accepted |computed - expected| in dollars
    #[arg(long, default_value_t = 0.01)]
    tolerance: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();
    let rules = match &cli.rules {
        Some(path) => BenefitRules::from_json_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => BenefitRules::default(),
    };
    let runner = ScenarioRunner::from_csv_path(&cli.params)
        .with_context(|| format!("Failed to load reference table from {}", cli.params.display()))?
        .with_rules(rules);

    let scenarios = load_scenarios(&cli.scenarios)
        .with_context(|| format!("Failed to load scenarios from {}", cli.scenarios.display()))?;
    println!("Loaded {} scenarios in {:?}", scenarios.len(), start.elapsed());

    let calc_start = Instant::now();
    let calculator = runner.calculator();
    let results: Vec<_> = scenarios
        .par_iter()
        .map(|row| row.to_claim().and_then(|claim| calculator.calculate(&claim)))
        .collect();
    println!("Calculations complete in {:?}", calc_start.elapsed());

    let mut file = BufWriter::new(
        File::create(&cli.output).with_context(|| format!("Failed to create {}", cli.output.display()))?,
    );
    writeln!(
        file,
        "Id,BenefitYear,CurrentYear,Age,AnchorWage,GrowthRate,EarningsTest,AIME,PIA,MonthsEarly,MonthsLate,ColaFactor,AnnualWithholding,MonthlyBenefit,ExpectedBenefit,Difference,Error"
    )?;

    let mut failed = 0;
    let mut mismatched = 0;
    let mut compared = 0;
    for (row, result) in scenarios.iter().zip(&results) {
        let expected = row.expected_benefit.map(|v| format!("{:.6}", v)).unwrap_or_default();
        let prefix = format!(
            "{},{},{},{},{:.2},{},{}",
            row.id, row.benefit_year, row.current_year, row.age, row.anchor_wage, row.growth_rate, row.earnings_test
        );

        match result {
            Ok(b) => {
                let difference = row.expected_benefit.map(|e| b.monthly_benefit - e);
                if let Some(diff) = difference {
                    compared += 1;
                    if diff.abs() > cli.tolerance {
                        mismatched += 1;
                        log::warn!(
                            "scenario {}: computed {:.6}, expected {:.6}",
                            row.id,
                            b.monthly_benefit,
                            b.monthly_benefit - diff
                        );
                    }
                }
                writeln!(
                    file,
                    "{},{:.0},{:.2},{},{},{:.8},{:.2},{:.6},{},{},",
                    prefix,
                    b.aime,
                    b.pia,
                    b.adjustment.months_early,
                    b.adjustment.months_late,
                    b.cola_factor,
                    b.earnings_test.map(|t| t.annual_withholding).unwrap_or(0.0),
                    b.monthly_benefit,
                    expected,
                    difference.map(|d| format!("{:.6}", d)).unwrap_or_default(),
                )?;
            }
            Err(e) => {
                failed += 1;
                log::error!("scenario {} failed: {}", row.id, e);
                writeln!(file, "{},,,,,,,,{},,\"{}\"", prefix, expected, e.to_string().replace('"', "'"))?;
            }
        }
    }
    file.flush()?;

    println!("Output written to {}", cli.output.display());
    println!("\nBatch Summary:");
    println!("  Scenarios: {}", scenarios.len());
    println!("  Failed:    {}", failed);
    if compared > 0 {
        println!("  Compared:  {} ({} outside ${:.2})", compared, mismatched, cli.tolerance);
    }
    println!("\nTotal time: {:?}", start.elapsed());

    if failed > 0 || mismatched > 0 {
        anyhow::bail!("{} failed and {} mismatched scenarios", failed, mismatched);
    }
    Ok(())
}
