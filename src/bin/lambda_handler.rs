//! AWS Lambda handler for benefit estimates
//!
//! Accepts a claim as JSON and returns the full benefit breakdown. When a
//! target benefit is supplied, the wage growth rate reproducing it is solved
//! first and the breakdown is computed at that rate.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use std::collections::BTreeMap;
use std::sync::Arc;

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};

use ssa_benefit::benefit::{BenefitBreakdown, GrowthSolution, GrowthSolveConfig};
use ssa_benefit::{
    BenefitCalculator, BenefitError, BenefitRules, CalculatorConfig, Claim, EarningsRecord, ScenarioRunner,
};

/// Input for one estimate
#[derive(Debug, Deserialize)]
pub struct BenefitRequest {
    pub benefit_year: u32,

    /// Payment / earnings-test year (default: benefit_year)
    #[serde(default)]
    pub current_year: Option<u32>,

    pub age: u32,

    /// Reported wages keyed by year, e.g. {"2018": 52000}
    pub earnings: BTreeMap<u32, f64>,

    #[serde(default)]
    pub growth_rate: f64,

    #[serde(default)]
    pub earnings_test: bool,

    /// Solve for the growth rate that yields this monthly benefit
    #[serde(default)]
    pub target_benefit: Option<f64>,

    #[serde(default)]
    pub include_history: bool,
}

#[derive(Debug, Serialize)]
pub struct BenefitResponse {
    pub breakdown: BenefitBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_solution: Option<GrowthSolution>,
    pub execution_time_ms: u64,
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body.to_string()))?)
}

fn json_response(body: &BenefitResponse) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

/// Client mistakes map to 4xx, reference-data faults to 500
fn status_for(err: &BenefitError) -> u16 {
    if err.is_caller_error() {
        422
    } else {
        500
    }
}

fn estimate(runner: &ScenarioRunner, request: BenefitRequest) -> ssa_benefit::Result<BenefitResponse> {
    let start = std::time::Instant::now();

    // At or below -100% the backward wage chain divides by zero or flips sign
    if request.growth_rate.is_nan() || request.growth_rate <= -1.0 {
        return Err(BenefitError::InvalidInput(format!(
            "growth rate must be greater than -1, got {}",
            request.growth_rate
        )));
    }

    let earnings = EarningsRecord::from_pairs(request.earnings)?;
    let claim = Claim::new(request.benefit_year, request.age, earnings)
        .with_current_year(request.current_year.unwrap_or(request.benefit_year))
        .with_growth_rate(request.growth_rate)
        .with_earnings_test(request.earnings_test);

    let (claim, growth_solution) = match request.target_benefit {
        Some(target) => {
            let solution = runner.solve_growth_rate(&claim, target, &GrowthSolveConfig::default())?;
            (claim.with_growth_rate(solution.growth_rate), Some(solution))
        }
        None => (claim, None),
    };

    let calculator = BenefitCalculator::new(
        runner.table(),
        CalculatorConfig {
            rules: runner.rules().clone(),
            detailed_output: request.include_history,
        },
    );
    let breakdown = calculator.calculate(&claim)?;

    Ok(BenefitResponse {
        breakdown,
        growth_solution,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Lambda handler function
async fn handler(runner: Arc<ScenarioRunner>, event: Request) -> Result<Response<Body>, Error> {
    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    };

    let request: BenefitRequest = match serde_json::from_str(&body_str) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };
    log::info!(
        "estimate: benefit year {}, age {}, {} earnings years",
        request.benefit_year,
        request.age,
        request.earnings.len()
    );

    match estimate(&runner, request) {
        Ok(response) => json_response(&response),
        Err(e) => {
            log::warn!("estimate failed: {}", e);
            error_response(status_for(&e), &e.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let params_path = std::env::var("SSA_PARAMS_PATH").ok();
    let runner = match &params_path {
        Some(path) => ScenarioRunner::from_csv_path(path)?,
        None => ScenarioRunner::from_csv()?,
    };
    let rules = match std::env::var("SSA_RULES_PATH") {
        Ok(path) => BenefitRules::from_json_path(path)?,
        Err(_) => BenefitRules::default(),
    };
    let runner = Arc::new(runner.with_rules(rules));

    run(service_fn(move |event: Request| {
        let runner = Arc::clone(&runner);
        async move { handler(runner, event).await }
    }))
    .await
}
