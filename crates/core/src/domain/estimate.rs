use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Trip parameters for a standard-price estimate. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub origin: String,
    pub destination: String,
    pub dates: String,
    pub standard_price: f64,
}

impl EstimateRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        dates: impl Into<String>,
        standard_price: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            dates: dates.into(),
            standard_price,
        }
    }

    /// Local shape checks; runs before any model call.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.origin.trim().is_empty() {
            return Err(DomainError::validation("origin", "origin is required"));
        }
        if self.destination.trim().is_empty() {
            return Err(DomainError::validation("destination", "destination is required"));
        }
        if self.dates.trim().is_empty() {
            return Err(DomainError::validation("dates", "dates are required"));
        }
        if !self.standard_price.is_finite() || self.standard_price <= 0.0 {
            return Err(DomainError::validation(
                "standardPrice",
                "standard price must be a positive number",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub estimated_price: f64,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::{EstimateRequest, EstimateResponse};
    use crate::errors::DomainError;

    #[test]
    fn valid_request_passes() {
        assert!(EstimateRequest::new("SFO", "JFK", "October 2024", 1000.0).validate().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected_by_name() {
        let cases = [
            (EstimateRequest::new("", "JFK", "Oct", 10.0), "origin"),
            (EstimateRequest::new("SFO", " ", "Oct", 10.0), "destination"),
            (EstimateRequest::new("SFO", "JFK", "", 10.0), "dates"),
        ];
        for (request, expected_field) in cases {
            let error = request.validate().expect_err("blank field");
            assert!(
                matches!(error, DomainError::Validation { field, .. } if field == expected_field)
            );
        }
    }

    #[test]
    fn non_positive_or_non_finite_price_is_rejected() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let error = EstimateRequest::new("SFO", "JFK", "Oct", price)
                .validate()
                .expect_err("invalid price");
            assert!(matches!(error, DomainError::Validation { field: "standardPrice", .. }));
        }
    }

    #[test]
    fn wire_names_are_camel_case() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{"origin":"SFO","destination":"JFK","dates":"October 2024","standardPrice":1000}"#,
        )
        .expect("deserialize request");
        assert_eq!(request.standard_price, 1000.0);

        let response = EstimateResponse { estimated_price: 420.5, reasoning: "shoulder".into() };
        let json = serde_json::to_value(&response).expect("serialize response");
        assert_eq!(json["estimatedPrice"], serde_json::json!(420.5));
    }
}
