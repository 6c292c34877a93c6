use std::sync::Arc;

use clap::Args;
use serde_json::json;

use sentinel_agent::{EstimationError, HttpLlmClient, PriceEstimator};
use sentinel_core::domain::estimate::EstimateRequest;

use crate::commands::{current_thread_runtime, load_config, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    #[arg(long, help = "Departure city or airport")]
    pub origin: String,
    #[arg(long, help = "Arrival city or airport")]
    pub destination: String,
    #[arg(long, help = "Travel dates as free text, e.g. \"October 2024\"")]
    pub dates: String,
    #[arg(long, help = "Highest fare the traveller considers standard")]
    pub standard_price: f64,
}

impl From<EstimateArgs> for EstimateRequest {
    fn from(args: EstimateArgs) -> Self {
        EstimateRequest::new(args.origin, args.destination, args.dates, args.standard_price)
    }
}

pub fn run(args: EstimateArgs) -> CommandResult {
    let request = EstimateRequest::from(args);
    if let Err(error) = request.validate() {
        return CommandResult::failure("estimate", "validation", error.to_string(), 6);
    }

    let config = match load_config("estimate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let client = match HttpLlmClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("estimate", "llm_setup", error.to_string(), 4),
    };
    let runtime = match current_thread_runtime("estimate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let estimator = PriceEstimator::new(Arc::new(client));
    match runtime.block_on(estimator.estimate(&request)) {
        Ok(estimate) => CommandResult::success_with_data(
            "estimate",
            format!(
                "{} to {} ({}): estimated {:.2}",
                request.origin, request.destination, request.dates, estimate.estimated_price
            ),
            Some(json!(estimate)),
        ),
        Err(error) => failure(&error),
    }
}

fn failure(error: &EstimationError) -> CommandResult {
    let exit_code = match error {
        EstimationError::Validation(_) => 6,
        EstimationError::Provider(_) => 7,
        EstimationError::MalformedResponse { .. } => 8,
    };
    CommandResult::failure("estimate", error.kind(), error.to_string(), exit_code)
}
