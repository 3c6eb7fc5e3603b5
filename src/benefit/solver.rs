//! Growth-rate solver
//!
//! Back-solves the wage growth rate that reproduces a target monthly benefit.
//! The benefit is treated as a black box: a golden-section search minimises
//! |benefit(g) - target| over a bounded interval, so no derivative is needed
//! and the floors inside the formula do not upset it.

use serde::Serialize;

use super::calculator::{BenefitCalculator, Claim};
use crate::error::{BenefitError, Result};

/// 1/phi
const INV_GOLDEN: f64 = 0.618_033_988_749_894_8;

/// Search settings for [`solve_growth_rate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthSolveConfig {
    pub lower: f64,
    pub upper: f64,
    /// Stop once the bracket is narrower than this
    pub tolerance: f64,
    /// Largest acceptable |benefit - target| in dollars
    pub benefit_tolerance: f64,
    pub max_iterations: u32,
}

impl Default for GrowthSolveConfig {
    fn default() -> Self {
        Self {
            lower: -0.10,
            upper: 0.10,
            tolerance: 1e-7,
            benefit_tolerance: 1.0,
            max_iterations: 200,
        }
    }
}

/// Result of a bounded minimisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub value: f64,
    pub iterations: u32,
    /// False when the iteration cap stopped the search
    pub converged: bool,
}

/// Golden-section search for the minimum of `objective` on `[lower, upper]`
///
/// Errors returned by the objective abort the search.
pub fn minimize_bounded<F>(
    mut objective: F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: u32,
) -> Result<Minimum>
where
    F: FnMut(f64) -> Result<f64>,
{
    if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
        return Err(BenefitError::InvalidInput(format!(
            "search interval [{}, {}] is empty or unbounded",
            lower, upper
        )));
    }
    if tolerance.is_nan() || tolerance <= 0.0 {
        return Err(BenefitError::InvalidInput(format!(
            "search tolerance must be positive, got {}",
            tolerance
        )));
    }

    let (mut a, mut b) = (lower, upper);
    let mut c = b - INV_GOLDEN * (b - a);
    let mut d = a + INV_GOLDEN * (b - a);
    let mut fc = objective(c)?;
    let mut fd = objective(d)?;

    let mut iterations = 0;
    let mut converged = true;
    while b - a > tolerance {
        if iterations >= max_iterations {
            converged = false;
            break;
        }
        iterations += 1;

        if fc <= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_GOLDEN * (b - a);
            fc = objective(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_GOLDEN * (b - a);
            fd = objective(d)?;
        }
    }

    let (x, value) = if fc <= fd { (c, fc) } else { (d, fd) };
    Ok(Minimum {
        x,
        value,
        iterations,
        converged,
    })
}

/// A growth rate that reproduces the target benefit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthSolution {
    pub growth_rate: f64,
    pub monthly_benefit: f64,
    pub target: f64,
    /// |monthly_benefit - target|
    pub residual: f64,
    pub iterations: u32,
}

/// Find the growth rate for which `claim` yields `target` per month
///
/// The claim's own growth rate is ignored.
pub fn solve_growth_rate(
    calculator: &BenefitCalculator<'_>,
    claim: &Claim,
    target: f64,
    config: &GrowthSolveConfig,
) -> Result<GrowthSolution> {
    if !target.is_finite() || target < 0.0 {
        return Err(BenefitError::InvalidInput(format!(
            "target benefit must be a non-negative amount, got {}",
            target
        )));
    }

    let mut trial = claim.clone();
    let minimum = minimize_bounded(
        |growth_rate| {
            trial.growth_rate = growth_rate;
            Ok((calculator.monthly_benefit(&trial)? - target).abs())
        },
        config.lower,
        config.upper,
        config.tolerance,
        config.max_iterations,
    )?;
    log::debug!(
        "growth search for {:.2}: g={:.7}, residual {:.4} after {} iterations",
        target,
        minimum.x,
        minimum.value,
        minimum.iterations
    );

    let no_solution = |reason: String| BenefitError::NoSolution {
        target,
        lower: config.lower,
        upper: config.upper,
        reason,
    };

    if !minimum.converged {
        return Err(no_solution(format!(
            "iteration cap of {} reached",
            config.max_iterations
        )));
    }
    if minimum.value > config.benefit_tolerance {
        let margin = 2.0 * config.tolerance;
        let at_bound = minimum.x - config.lower <= margin || config.upper - minimum.x <= margin;
        let reason = if at_bound {
            format!("search ended at a bound with residual {:.2}", minimum.value)
        } else {
            format!("closest benefit is {:.2} away", minimum.value)
        };
        return Err(no_solution(reason));
    }

    let mut solved = claim.clone();
    solved.growth_rate = minimum.x;
    Ok(GrowthSolution {
        growth_rate: minimum.x,
        monthly_benefit: calculator.monthly_benefit(&solved)?,
        target,
        residual: minimum.value,
        iterations: minimum.iterations,
    })
}
