//! SSA Benefit CLI
//!
//! Command-line interface for single benefit estimates and growth-rate solves

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};

use ssa_benefit::benefit::{BenefitBreakdown, GrowthSolveConfig};
use ssa_benefit::earnings::load_earnings;
use ssa_benefit::reference::loader::DEFAULT_REFERENCE_PATH;
use ssa_benefit::{BenefitRules, Claim, EarningsRecord, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "ssa_benefit")]
#[command(about = "Estimate a Social Security retirement benefit from an earnings history")]
struct Cli {
    /// Reference table CSV (Year,AWI,MaxEarn,FullRetAge,COLA)
    #[arg(long, global = true, default_value = DEFAULT_REFERENCE_PATH)]
    params: PathBuf,

    /// JSON file overriding benefit-rule constants
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the monthly benefit for one claim
    Benefit {
        #[command(flatten)]
        claim: ClaimArgs,

        /// Include the year-by-year working history
        #[arg(long)]
        detail: bool,
    },
    /// Find the wage growth rate that reproduces a target monthly benefit
    Solve {
        #[command(flatten)]
        claim: ClaimArgs,

        /// Monthly benefit to reproduce
        #[arg(long)]
        target: f64,

        #[arg(long, default_value_t = -0.10, allow_hyphen_values = true)]
        lower: f64,

        #[arg(long, default_value_t = 0.10)]
        upper: f64,
    },
}

#[derive(Args, Debug)]
struct ClaimArgs {
    /// Year the benefit is claimed
    #[arg(long)]
    benefit_year: u32,

    /// Age in the benefit year
    #[arg(long)]
    age: u32,

    /// Year of payment and of the earnings test (default: this year, capped at the table's last year)
    #[arg(long)]
    current_year: Option<u32>,

    /// Earnings history CSV (Year,Wage)
    #[arg(long)]
    earnings: Option<PathBuf>,

    /// Wage in the benefit year; overrides that year in --earnings
    #[arg(long)]
    anchor_wage: Option<f64>,

    /// Annual wage growth above national AWI growth, e.g. 0.01
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    growth_rate: f64,

    /// Apply the retirement earnings test
    #[arg(long)]
    earnings_test: bool,
}

impl ClaimArgs {
    fn into_claim(self, runner: &ScenarioRunner) -> anyhow::Result<Claim> {
        let mut earnings = match &self.earnings {
            Some(path) => load_earnings(path)
                .with_context(|| format!("Failed to load earnings from {}", path.display()))?,
            None => EarningsRecord::new(),
        };
        if let Some(wage) = self.anchor_wage {
            earnings.insert(self.benefit_year, wage)?;
        }
        if earnings.is_empty() {
            bail!("no earnings given: pass --earnings, --anchor-wage, or both");
        }

        let current_year = match self.current_year {
            Some(year) => year,
            None => default_current_year(runner.table().last_year())?,
        };

        Ok(Claim::new(self.benefit_year, self.age, earnings)
            .with_current_year(current_year)
            .with_growth_rate(self.growth_rate)
            .with_earnings_test(self.earnings_test))
    }
}

fn default_current_year(last_table_year: u32) -> anyhow::Result<u32> {
    let clock_year = u32::try_from(chrono::Local::now().year()).context("System clock year is negative")?;
    if clock_year > last_table_year {
        log::warn!(
            "current year {} is past the reference table; using {}",
            clock_year,
            last_table_year
        );
        return Ok(last_table_year);
    }
    Ok(clock_year)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let rules = match &cli.rules {
        Some(path) => BenefitRules::from_json_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => BenefitRules::default(),
    };
    let runner = ScenarioRunner::from_csv_path(&cli.params)
        .with_context(|| format!("Failed to load reference table from {}", cli.params.display()))?
        .with_rules(rules);

    match cli.command {
        Command::Benefit { claim, detail } => {
            let runner = runner.with_detailed_output(detail);
            let claim = claim.into_claim(&runner)?;
            let breakdown = runner.run(&claim)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                print_breakdown(&breakdown);
            }
        }
        Command::Solve {
            claim,
            target,
            lower,
            upper,
        } => {
            let claim = claim.into_claim(&runner)?;
            let config = GrowthSolveConfig {
                lower,
                upper,
                ..GrowthSolveConfig::default()
            };
            let solution = runner.solve_growth_rate(&claim, target, &config)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&solution)?);
            } else {
                println!("Target benefit:  ${:.2}", solution.target);
                println!("Growth rate:     {:.6}", solution.growth_rate);
                println!("Monthly benefit: ${:.2}", solution.monthly_benefit);
                println!("Residual:        ${:.4} ({} iterations)", solution.residual, solution.iterations);
            }
        }
    }

    Ok(())
}

fn print_breakdown(b: &BenefitBreakdown) {
    println!("Benefit year {} (age {}, born {}), paid in {}", b.benefit_year, b.age, b.birth_year, b.payment_year);
    println!("  Index year:       {}", b.index_year);
    println!("  AIME:             ${:.0}", b.aime);
    println!("  Bend points:      ${:.0} / ${:.0}", b.bend_points.first, b.bend_points.second);
    println!("  PIA:              ${:.2}", b.pia);
    println!(
        "  FRA:              {} years {} months",
        b.adjustment.full_retirement_age_months / 12,
        b.adjustment.full_retirement_age_months % 12
    );
    if b.adjustment.months_early > 0 {
        println!(
            "  Early claim:      {} months, -{:.4}%",
            b.adjustment.months_early, b.adjustment.reduction_pct
        );
    }
    if b.adjustment.months_late > 0 {
        println!(
            "  Delayed claim:    {} months, +{:.4}%",
            b.adjustment.months_late, b.adjustment.credit_pct
        );
    }
    println!("  COLA factor:      {:.6}", b.cola_factor);
    if let Some(test) = &b.earnings_test {
        println!(
            "  Earnings test:    ${:.2} earned, ${:.0} exempt, ${:.2}/yr withheld",
            test.earnings, test.exempt_amount, test.annual_withholding
        );
    }
    println!("  Monthly benefit:  ${:.2}", b.monthly_benefit);

    if let Some(history) = &b.history {
        println!();
        println!("{:>5} {:>4} {:>12} {:>10} {:>10} {:>12} {:>12}",
            "Year", "Age", "Wage", "MaxEarn", "Index", "ActualEarn", "Indexed");
        println!("{}", "-".repeat(71));
        for row in &history.rows {
            println!("{:>5} {:>4} {:>12.2} {:>10.0} {:>10.6} {:>12.2} {:>12.2}",
                row.year, row.age, row.wage, row.max_earn, row.index, row.actual_earn, row.indexed_earning);
        }
    }
}
