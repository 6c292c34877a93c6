use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use sentinel_core::domain::alert::{AlertId, FlightAlert};
use sentinel_core::domain::identity::UserId;
use sentinel_core::domain::profile::UserProfile;
use sentinel_core::errors::ApplicationError;

pub mod alert;
pub mod memory;
pub mod profile;
pub mod provisioning;

pub use alert::SqlAlertRepository;
pub use memory::{InMemoryAlertRepository, InMemoryProfileRepository};
pub use profile::SqlProfileRepository;
pub use provisioning::RepositoryProvisioner;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// Inserts the profile unless one already exists for its id. Returns
    /// whether this call created it.
    async fn create_if_absent(&self, profile: UserProfile) -> Result<bool, RepositoryError>;

    async fn update_display_name(
        &self,
        id: &UserId,
        display_name: &str,
    ) -> Result<Option<UserProfile>, RepositoryError>;
}

/// Alert storage. Mutations are scoped to the owning user.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<FlightAlert>, RepositoryError>;

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<FlightAlert>, RepositoryError>;

    async fn create(&self, alert: FlightAlert) -> Result<(), RepositoryError>;

    /// Returns `false` when no alert with that id belongs to `alert.user_id`.
    async fn update(&self, alert: FlightAlert) -> Result<bool, RepositoryError>;

    async fn delete(&self, user_id: &UserId, id: &AlertId) -> Result<bool, RepositoryError>;
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid `{column}` timestamp: {e}")))
}
