use serde::{Deserialize, Serialize};

use crate::domain::identity::{Identity, UserId};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Init,
    Provisioning(Identity),
    Authenticated(Identity),
    Unauthenticated,
    ProvisioningFailed { identity: Identity, reason: String },
}

impl SessionState {
    /// Identity exposed to consumers. Withheld while provisioning is pending or failed.
    pub fn user(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Init | Self::Provisioning(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Provisioning(_) => "provisioning",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::ProvisioningFailed { .. } => "provisioning_failed",
        }
    }
}

/// Notifications pushed by the authentication provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Auth(AuthEvent),
    ProvisioningSucceeded { uid: UserId },
    ProvisioningFailed { uid: UserId, reason: String },
}

impl SessionEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(AuthEvent::SignedIn(_)) => "signed_in",
            Self::Auth(AuthEvent::SignedOut) => "signed_out",
            Self::ProvisioningSucceeded { .. } => "provisioning_succeeded",
            Self::ProvisioningFailed { .. } => "provisioning_failed",
        }
    }
}

impl From<AuthEvent> for SessionEvent {
    fn from(event: AuthEvent) -> Self {
        Self::Auth(event)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAction {
    EnsureProfile(Identity),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SessionState,
    pub to: SessionState,
    pub event: SessionEvent,
    pub actions: Vec<SessionAction>,
}

impl TransitionOutcome {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}
