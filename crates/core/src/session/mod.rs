pub mod engine;
pub mod navigation;
pub mod shell;
pub mod states;

pub use engine::transition;
pub use navigation::{decide, NavigationDecision, RouteCategory, DASHBOARD_PATH, LOGIN_PATH};
pub use shell::{
    AuthStream, ProfileProvisioner, ProvisionOutcome, ProvisioningError, SessionHandle,
    SessionShell,
};
pub use states::{AuthEvent, SessionAction, SessionEvent, SessionState, TransitionOutcome};
