use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use sentinel_core::domain::identity::Identity;
use sentinel_core::domain::profile::UserProfile;
use sentinel_core::session::{ProfileProvisioner, ProvisionOutcome, ProvisioningError};

use super::ProfileRepository;

/// First-sign-in profile creation backed by a [`ProfileRepository`].
#[derive(Clone)]
pub struct RepositoryProvisioner {
    profiles: Arc<dyn ProfileRepository>,
}

impl RepositoryProvisioner {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl ProfileProvisioner for RepositoryProvisioner {
    async fn ensure_profile(
        &self,
        identity: &Identity,
    ) -> Result<ProvisionOutcome, ProvisioningError> {
        let existing = self
            .profiles
            .find_by_id(&identity.uid)
            .await
            .map_err(|e| ProvisioningError::new(e.to_string()))?;
        if existing.is_some() {
            return Ok(ProvisionOutcome::AlreadyExisted);
        }

        let created = self
            .profiles
            .create_if_absent(UserProfile::from_identity(identity, Utc::now()))
            .await
            .map_err(|e| ProvisioningError::new(e.to_string()))?;

        Ok(if created { ProvisionOutcome::Created } else { ProvisionOutcome::AlreadyExisted })
    }
}
