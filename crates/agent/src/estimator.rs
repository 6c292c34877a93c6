use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use sentinel_core::domain::estimate::{EstimateRequest, EstimateResponse};
use sentinel_core::errors::{ApplicationError, DomainError};

use crate::llm::{CompletionRequest, LlmClient, LlmError};

pub const ESTIMATE_SCHEMA_NAME: &str = "route_price_estimate";

#[derive(Debug, Error, PartialEq)]
pub enum EstimationError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("price estimation provider failed: {0}")]
    Provider(#[from] LlmError),
    #[error("price estimation response was malformed: {reason}")]
    MalformedResponse { reason: String },
}

impl EstimationError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse { reason: reason.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Provider(_) => "provider",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

impl From<EstimationError> for ApplicationError {
    fn from(error: EstimationError) -> Self {
        match error {
            EstimationError::Validation(domain) => ApplicationError::Domain(domain),
            other => ApplicationError::Integration(other.to_string()),
        }
    }
}

/// Stateless standard-price estimator over an [`LlmClient`]. Every call is
/// a single attempt.
#[derive(Clone)]
pub struct PriceEstimator {
    client: Arc<dyn LlmClient>,
}

impl PriceEstimator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn estimate(
        &self,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, EstimationError> {
        request.validate()?;

        info!(
            event_name = "estimate.requested",
            origin = %request.origin,
            destination = %request.destination,
            "requesting route price estimate"
        );

        let completion = CompletionRequest {
            prompt: render_prompt(request),
            schema_name: ESTIMATE_SCHEMA_NAME.to_string(),
            schema: estimate_schema(),
        };

        let result = match self.client.complete(&completion).await {
            Ok(raw) => parse_estimate(&raw),
            Err(error) => Err(EstimationError::Provider(error)),
        };

        match &result {
            Ok(estimate) => info!(
                event_name = "estimate.completed",
                origin = %request.origin,
                destination = %request.destination,
                estimated_price = estimate.estimated_price,
                "route price estimate completed"
            ),
            Err(error) => warn!(
                event_name = "estimate.failed",
                origin = %request.origin,
                destination = %request.destination,
                error_kind = error.kind(),
                error = %error,
                "route price estimate failed"
            ),
        }

        result
    }
}

pub fn render_prompt(request: &EstimateRequest) -> String {
    format!(
        "You are an expert travel agent specializing in estimating flight prices.\n\
         \n\
         You will be provided with the origin and destination airport codes, the approximate \
         travel dates, and the maximum standard price for this route.\n\
         \n\
         Based on this information, estimate the standard price for the flight route and provide \
         a brief reasoning for your estimate.\n\
         \n\
         Origin: {origin}\n\
         Destination: {destination}\n\
         Dates: {dates}\n\
         Maximum Standard Price: {standard_price}\n\
         \n\
         Consider various factors such as seasonality, demand, and current market trends to \
         provide the most accurate estimate.\n",
        origin = request.origin,
        destination = request.destination,
        dates = request.dates,
        standard_price = request.standard_price,
    )
}

pub fn estimate_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "estimatedPrice": {
                "type": "number",
                "description": "The estimated standard price for the flight route."
            },
            "reasoning": {
                "type": "string",
                "description": "The reasoning behind the estimated price."
            }
        },
        "required": ["estimatedPrice", "reasoning"],
        "additionalProperties": false
    })
}

/// Validates raw model output against the estimate shape.
pub fn parse_estimate(raw: &str) -> Result<EstimateResponse, EstimationError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| EstimationError::malformed(format!("not valid JSON: {e}")))?;
    let object =
        value.as_object().ok_or_else(|| EstimationError::malformed("expected a JSON object"))?;

    let estimated_price = match object.get("estimatedPrice") {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| EstimationError::malformed("`estimatedPrice` is not representable"))?,
        Some(_) => return Err(EstimationError::malformed("`estimatedPrice` must be a number")),
        None => return Err(EstimationError::malformed("missing `estimatedPrice`")),
    };
    if !estimated_price.is_finite() {
        return Err(EstimationError::malformed("`estimatedPrice` must be finite"));
    }
    if estimated_price < 0.0 {
        return Err(EstimationError::malformed("`estimatedPrice` must not be negative"));
    }

    let reasoning = match object.get("reasoning") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Some(Value::String(_)) => {
            return Err(EstimationError::malformed("`reasoning` must not be empty"))
        }
        Some(_) => return Err(EstimationError::malformed("`reasoning` must be a string")),
        None => return Err(EstimationError::malformed("missing `reasoning`")),
    };

    Ok(EstimateResponse { estimated_price, reasoning })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
