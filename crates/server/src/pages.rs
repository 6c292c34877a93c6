//! Guarded HTML pages.
//!
//! Every page resolves the caller's session first and then follows the
//! navigation decision for its path. Protected data is only loaded once the
//! decision is `Render`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tera::{Context, Tera};
use tracing::{error, warn};

use sentinel_core::errors::ApplicationError;
use sentinel_core::session::{decide, NavigationDecision, SessionState};

use crate::session::{correlation_id, resolve};
use crate::state::AppState;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../../templates/pages/layout.html")),
    ("landing.html", include_str!("../../../templates/pages/landing.html")),
    ("login.html", include_str!("../../../templates/pages/login.html")),
    ("signup.html", include_str!("../../../templates/pages/signup.html")),
    ("password_reset.html", include_str!("../../../templates/pages/password_reset.html")),
    ("dashboard.html", include_str!("../../../templates/pages/dashboard.html")),
    ("settings.html", include_str!("../../../templates/pages/settings.html")),
    ("loader.html", include_str!("../../../templates/pages/loader.html")),
    ("error.html", include_str!("../../../templates/pages/error.html")),
];

pub fn templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(error) = tera.add_raw_templates(TEMPLATES.iter().copied()) {
        warn!(
            event_name = "system.templates.load_failed",
            correlation_id = "bootstrap",
            error = %error,
            "failed to register page templates"
        );
    }
    Arc::new(tera)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Landing,
    Login,
    Signup,
    PasswordReset,
    Dashboard,
    Settings,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::PasswordReset => "/password-reset",
            Self::Dashboard => "/dashboard",
            Self::Settings => "/dashboard/settings",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Landing => "landing.html",
            Self::Login => "login.html",
            Self::Signup => "signup.html",
            Self::PasswordReset => "password_reset.html",
            Self::Dashboard => "dashboard.html",
            Self::Settings => "settings.html",
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login))
        .route("/signup", get(signup))
        .route("/password-reset", get(password_reset))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/settings", get(settings))
}

pub async fn landing(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::Landing).await
}

pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::Login).await
}

pub async fn signup(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::Signup).await
}

pub async fn password_reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::PasswordReset).await
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::Dashboard).await
}

pub async fn settings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    guarded(&state, &headers, Page::Settings).await
}

async fn guarded(state: &AppState, headers: &HeaderMap, page: Page) -> Response {
    let cid = correlation_id(headers);
    let session = resolve(state, headers).await;
    respond(state, &session, page, &cid).await
}

pub async fn respond(
    state: &AppState,
    session: &SessionState,
    page: Page,
    correlation_id: &str,
) -> Response {
    match decide(session, page.path()) {
        NavigationDecision::Redirect(location) => Redirect::to(location).into_response(),
        NavigationDecision::ShowLoader => {
            render(state, "loader.html", &signed_out_context(), StatusCode::OK, correlation_id)
        }
        NavigationDecision::ShowError => {
            let reason = match session {
                SessionState::ProvisioningFailed { reason, .. } => reason.clone(),
                _ => "session unavailable".to_string(),
            };
            error_page(state, ApplicationError::Provisioning(reason), correlation_id)
        }
        NavigationDecision::Render => match page_context(state, session, page).await {
            Ok(context) => render(state, page.template(), &context, StatusCode::OK, correlation_id),
            Err(error) => error_page(state, error, correlation_id),
        },
    }
}

async fn page_context(
    state: &AppState,
    session: &SessionState,
    page: Page,
) -> Result<Context, ApplicationError> {
    let mut context = Context::new();
    context.insert("user", &session.user());

    let Some(user) = session.user() else {
        return Ok(context);
    };

    match page {
        Page::Dashboard => {
            let alerts = state.alerts.list_for_user(&user.uid).await?;
            let display_name = state
                .profiles
                .find_by_id(&user.uid)
                .await?
                .map(|profile| profile.display_name)
                .unwrap_or_else(|| user.preferred_display_name());
            context.insert("alerts", &alerts);
            context.insert("display_name", &display_name);
        }
        Page::Settings => {
            let profile = state.profiles.find_by_id(&user.uid).await?;
            context.insert("profile", &profile);
        }
        _ => {}
    }

    Ok(context)
}

fn signed_out_context() -> Context {
    let mut context = Context::new();
    context.insert("user", &Option::<()>::None);
    context
}

fn error_page(state: &AppState, error: ApplicationError, correlation_id: &str) -> Response {
    let interface = error.into_interface(correlation_id);
    let mut context = signed_out_context();
    context.insert("message", interface.user_message());
    context.insert("correlation_id", correlation_id);

    warn!(
        event_name = "page.unavailable",
        correlation_id = %correlation_id,
        error = %interface.message(),
        "page could not be rendered"
    );
    render(state, "error.html", &context, StatusCode::SERVICE_UNAVAILABLE, correlation_id)
}

fn render(
    state: &AppState,
    template: &str,
    context: &Context,
    status: StatusCode,
    correlation_id: &str,
) -> Response {
    match state.templates.render(template, context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(error) => {
            error!(
                event_name = "page.template_failed",
                correlation_id = %correlation_id,
                template,
                error = %error,
                "template rendering failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Something went wrong</h1>".to_string()))
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::LOCATION, Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use sentinel_core::domain::alert::{AlertDraft, FlightAlert};
    use sentinel_core::domain::identity::{Identity, UserId};
    use sentinel_core::session::SessionState;

    use super::{respond, Page};
    use crate::app;
    use crate::test_support::{failing_profiles_state, state_with_replies};

    async fn get(app: axum::Router, uri: &str, uid: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(uid) = uid {
            builder = builder.header("x-sentinel-uid", uid);
        }
        app.oneshot(builder.body(Body::empty()).expect("request")).await.expect("response")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()).expect("location header")
    }

    #[tokio::test]
    async fn dashboard_redirects_signed_out_visitor_to_login() {
        let (state, _) = state_with_replies(Vec::new());

        for path in ["/dashboard", "/dashboard/settings"] {
            let response = get(app(state.clone()), path, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/login");
        }
    }

    #[tokio::test]
    async fn signed_in_user_is_sent_from_auth_pages_to_dashboard() {
        let (state, _) = state_with_replies(Vec::new());

        for path in ["/", "/login", "/signup"] {
            let response = get(app(state.clone()), path, Some("uid-1")).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/dashboard");
        }
    }

    #[tokio::test]
    async fn password_reset_renders_for_everyone() {
        let (state, _) = state_with_replies(Vec::new());

        let signed_out = get(app(state.clone()), "/password-reset", None).await;
        assert_eq!(signed_out.status(), StatusCode::OK);
        assert!(body_text(signed_out).await.contains("Reset your password"));

        let signed_in = get(app(state), "/password-reset", Some("uid-1")).await;
        assert_eq!(signed_in.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_lists_only_own_alerts() {
        let (state, _) = state_with_replies(Vec::new());
        let draft = |origin: &str| AlertDraft {
            origin: origin.to_string(),
            destination: "JFK".to_string(),
            dates: "October 2024".to_string(),
            target_price: Decimal::new(450, 0),
        };
        state
            .alerts
            .create(FlightAlert::create(UserId("uid-1".to_string()), draft("SFO"), Utc::now()))
            .await
            .expect("own alert");
        state
            .alerts
            .create(FlightAlert::create(UserId("uid-2".to_string()), draft("ORD"), Utc::now()))
            .await
            .expect("foreign alert");

        let response = get(app(state), "/dashboard", Some("uid-1")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("SFO"));
        assert!(!html.contains("ORD"));
        assert!(html.contains("Welcome, uid-1"));
    }

    #[tokio::test]
    async fn provisioning_failure_shows_error_without_protected_content() {
        let state = failing_profiles_state();

        let response = get(app(state), "/dashboard", Some("uid-1")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let html = body_text(response).await;
        assert!(html.contains("We could not load your account"));
        assert!(!html.contains("Price alerts"));
        assert!(!html.contains("users table unavailable"));
    }

    #[tokio::test]
    async fn unsettled_session_shows_loader_on_every_page() {
        let (state, _) = state_with_replies(Vec::new());
        let provisioning = SessionState::Provisioning(Identity::new("uid-1"));

        for page in [Page::Landing, Page::Login, Page::Dashboard, Page::Settings] {
            for session in [SessionState::Init, provisioning.clone()] {
                let response = respond(&state, &session, page, "req-1").await;
                assert_eq!(response.status(), StatusCode::OK);
                let html = body_text(response).await;
                assert!(html.contains("Loading your session"));
                assert!(!html.contains("Price alerts"));
            }
        }
    }
}
