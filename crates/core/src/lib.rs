pub mod config;
pub mod domain;
pub mod errors;
pub mod session;

pub use domain::alert::{AlertDraft, AlertId, FlightAlert, DEFAULT_TARGET_PRICE};
pub use domain::estimate::{EstimateRequest, EstimateResponse};
pub use domain::identity::{Identity, UserId};
pub use domain::profile::{ProfileUpdate, UserProfile};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use session::{
    decide, AuthEvent, NavigationDecision, ProfileProvisioner, ProvisionOutcome,
    ProvisioningError, SessionHandle, SessionShell, SessionState,
};
