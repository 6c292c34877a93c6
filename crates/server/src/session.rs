//! Per-request session resolution.
//!
//! The fronting auth provider asserts the caller's identity through
//! `x-sentinel-*` headers. Each request feeds that assertion into a fresh
//! session shell, so provisioning runs before any handler sees the user.

use axum::http::HeaderMap;
use uuid::Uuid;

use sentinel_core::domain::identity::{Identity, UserId};
use sentinel_core::errors::ApplicationError;
use sentinel_core::session::{AuthEvent, SessionShell, SessionState};

use crate::error::ApiError;
use crate::state::AppState;

pub const UID_HEADER: &str = "x-sentinel-uid";
pub const EMAIL_HEADER: &str = "x-sentinel-email";
pub const DISPLAY_NAME_HEADER: &str = "x-sentinel-display-name";
pub const PHOTO_URL_HEADER: &str = "x-sentinel-photo-url";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn auth_event(headers: &HeaderMap) -> AuthEvent {
    let Some(uid) = header(headers, UID_HEADER) else {
        return AuthEvent::SignedOut;
    };

    AuthEvent::SignedIn(Identity {
        uid: UserId(uid),
        email: header(headers, EMAIL_HEADER),
        display_name: header(headers, DISPLAY_NAME_HEADER),
        photo_url: header(headers, PHOTO_URL_HEADER),
    })
}

pub fn correlation_id(headers: &HeaderMap) -> String {
    header(headers, CORRELATION_HEADER).unwrap_or_else(|| format!("req-{}", Uuid::new_v4()))
}

pub async fn resolve(state: &AppState, headers: &HeaderMap) -> SessionState {
    let shell = SessionShell::new(state.provisioner());
    shell.apply(auth_event(headers)).await
}

/// Identity of an authenticated session, or the API error for any other state.
pub fn require_user(session: SessionState, correlation_id: &str) -> Result<Identity, ApiError> {
    match session {
        SessionState::Authenticated(identity) => Ok(identity),
        SessionState::ProvisioningFailed { reason, .. } => {
            Err(ApiError::from_application(ApplicationError::Provisioning(reason), correlation_id))
        }
        _ => Err(ApiError::from_application(ApplicationError::Unauthenticated, correlation_id)),
    }
}
