use serde::Serialize;

use crate::session::states::SessionState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    Landing,
    AuthPage,
    Protected,
    OtherPublic,
}

impl RouteCategory {
    pub fn classify(path: &str) -> Self {
        match path {
            "/" => Self::Landing,
            "/login" | "/signup" => Self::AuthPage,
            _ if path == DASHBOARD_PATH || path.starts_with("/dashboard/") => Self::Protected,
            _ => Self::OtherPublic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "location", rename_all = "snake_case")]
pub enum NavigationDecision {
    ShowLoader,
    Redirect(&'static str),
    Render,
    ShowError,
}

impl NavigationDecision {
    pub fn renders_children(&self) -> bool {
        matches!(self, Self::Render)
    }
}

pub fn decide(state: &SessionState, path: &str) -> NavigationDecision {
    let category = RouteCategory::classify(path);
    match (state, category) {
        (SessionState::Init | SessionState::Provisioning(_), _) => NavigationDecision::ShowLoader,
        (SessionState::ProvisioningFailed { .. }, _) => NavigationDecision::ShowError,
        (SessionState::Unauthenticated, RouteCategory::Protected) => {
            NavigationDecision::Redirect(LOGIN_PATH)
        }
        (SessionState::Unauthenticated, _) => NavigationDecision::Render,
        (SessionState::Authenticated(_), RouteCategory::AuthPage | RouteCategory::Landing) => {
            NavigationDecision::Redirect(DASHBOARD_PATH)
        }
        (SessionState::Authenticated(_), _) => NavigationDecision::Render,
    }
}
