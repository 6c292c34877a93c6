use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::UserId;
use crate::errors::DomainError;

/// Target price pre-filled on a fresh alert form.
pub const DEFAULT_TARGET_PRICE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightAlert {
    pub id: AlertId,
    pub user_id: UserId,
    pub origin: String,
    pub destination: String,
    pub dates: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FlightAlert {
    pub fn create(user_id: UserId, draft: AlertDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::generate(),
            user_id,
            origin: draft.origin,
            destination: draft.destination,
            dates: draft.dates,
            target_price: draft.target_price,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, draft: AlertDraft, now: DateTime<Utc>) {
        self.origin = draft.origin;
        self.destination = draft.destination;
        self.dates = draft.dates;
        self.target_price = draft.target_price;
        self.updated_at = Some(now);
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// User-editable alert fields, shared by create and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    pub origin: String,
    pub destination: String,
    pub dates: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_price: Decimal,
}

impl AlertDraft {
    pub fn validate(self) -> Result<Self, DomainError> {
        let origin = required("origin", &self.origin, "origin is required")?;
        let destination = required("destination", &self.destination, "destination is required")?;
        let dates = required("dates", &self.dates, "dates are required")?;

        if self.target_price <= Decimal::ZERO {
            return Err(DomainError::validation(
                "targetPrice",
                "target price must be a positive number",
            ));
        }

        Ok(Self { origin, destination, dates, target_price: self.target_price })
    }
}

fn required(field: &'static str, value: &str, message: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, message));
    }
    Ok(trimmed.to_string())
}
