use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identity::{Identity, UserId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_identity(identity: &Identity, created_at: DateTime<Utc>) -> Self {
        Self {
            id: identity.uid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            display_name: identity.preferred_display_name(),
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: String,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<Self, DomainError> {
        let display_name = self.display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("displayName", "display name is required"));
        }
        Ok(Self { display_name: display_name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ProfileUpdate, UserProfile};
    use crate::domain::identity::Identity;
    use crate::errors::DomainError;

    #[test]
    fn profile_is_derived_from_identity() {
        let identity = Identity::new("uid-1").with_email("sam@example.com");
        let profile = UserProfile::from_identity(&identity, Utc::now());

        assert_eq!(profile.id.0, "uid-1");
        assert_eq!(profile.email, "sam@example.com");
        assert_eq!(profile.display_name, "sam");
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let error = ProfileUpdate { display_name: "   ".to_string() }
            .validate()
            .expect_err("blank name must fail");
        assert!(matches!(error, DomainError::Validation { field: "displayName", .. }));
    }

    #[test]
    fn display_name_is_trimmed() {
        let update = ProfileUpdate { display_name: "  Jo  ".to_string() }
            .validate()
            .expect("valid name");
        assert_eq!(update.display_name, "Jo");
    }
}
