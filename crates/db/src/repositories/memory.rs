use std::collections::HashMap;

use tokio::sync::RwLock;

use sentinel_core::domain::alert::{AlertId, FlightAlert};
use sentinel_core::domain::identity::UserId;
use sentinel_core::domain::profile::UserProfile;

use super::{AlertRepository, ProfileRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileRepository {
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait::async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&id.0).cloned())
    }

    async fn create_if_absent(&self, profile: UserProfile) -> Result<bool, RepositoryError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id.0) {
            return Ok(false);
        }
        profiles.insert(profile.id.0.clone(), profile);
        Ok(true)
    }

    async fn update_display_name(
        &self,
        id: &UserId,
        display_name: &str,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&id.0).map(|profile| {
            profile.display_name = display_name.to_string();
            profile.clone()
        }))
    }
}

/// Alerts kept in insertion order so ties on `created_at` list the most
/// recently inserted first, matching the `rowid` tie-break in SQL.
#[derive(Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<Vec<FlightAlert>>,
}

#[async_trait::async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<FlightAlert>, RepositoryError> {
        let alerts = self.alerts.read().await;
        let mut owned: Vec<FlightAlert> =
            alerts.iter().rev().filter(|alert| alert.is_owned_by(user_id)).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<FlightAlert>, RepositoryError> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().find(|alert| alert.id == *id).cloned())
    }

    async fn create(&self, alert: FlightAlert) -> Result<(), RepositoryError> {
        let mut alerts = self.alerts.write().await;
        alerts.retain(|existing| existing.id != alert.id);
        alerts.push(alert);
        Ok(())
    }

    async fn update(&self, alert: FlightAlert) -> Result<bool, RepositoryError> {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|existing| existing.id == alert.id) {
            Some(existing) if existing.is_owned_by(&alert.user_id) => {
                *existing = alert;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, user_id: &UserId, id: &AlertId) -> Result<bool, RepositoryError> {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|alert| !(alert.id == *id && alert.is_owned_by(user_id)));
        Ok(alerts.len() != before)
    }
}
