use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use sentinel_core::domain::alert::{AlertDraft, AlertId, FlightAlert, DEFAULT_TARGET_PRICE};
use sentinel_core::domain::estimate::{EstimateRequest, EstimateResponse};
use sentinel_core::domain::identity::Identity;
use sentinel_core::domain::profile::{ProfileUpdate, UserProfile};
use sentinel_core::errors::{ApplicationError, DomainError};
use sentinel_core::session::{decide, NavigationDecision, RouteCategory};

use crate::error::ApiError;
use crate::session::{correlation_id, require_user, resolve};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/session", get(session_view))
        .route("/api/v1/session/navigation", get(navigation_view))
        .route("/api/v1/profile", get(get_profile).put(update_profile))
        .route("/api/v1/alerts", get(list_alerts).post(create_alert))
        .route("/api/v1/alerts/{id}", put(update_alert).delete(delete_alert))
        .route("/api/v1/estimate", post(estimate_price))
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: &'static str,
    pub loading: bool,
    pub user: Option<Identity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NavigationQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NavigationView {
    pub path: String,
    pub category: RouteCategory,
    #[serde(flatten)]
    pub decision: NavigationDecision,
}

/// Alert form input. `targetPrice` falls back to the form default on create.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInput {
    pub origin: String,
    pub destination: String,
    pub dates: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub target_price: Option<Decimal>,
}

impl AlertInput {
    fn into_draft(self) -> Result<AlertDraft, DomainError> {
        AlertDraft {
            origin: self.origin,
            destination: self.destination,
            dates: self.dates,
            target_price: self.target_price.unwrap_or(DEFAULT_TARGET_PRICE),
        }
        .validate()
    }
}

fn payload<T>(body: Result<Json<T>, JsonRejection>, correlation_id: &str) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::from_application(
            DomainError::validation("body", rejection.body_text()).into(),
            correlation_id,
        )
    })
}

pub async fn session_view(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionView> {
    let session = resolve(&state, &headers).await;
    Json(SessionView {
        status: session.label(),
        loading: session.is_loading(),
        user: session.user().cloned(),
    })
}

pub async fn navigation_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NavigationQuery>,
) -> Json<NavigationView> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let session = resolve(&state, &headers).await;
    Json(NavigationView {
        category: RouteCategory::classify(&path),
        decision: decide(&session, &path),
        path,
    })
}

pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;

    let profile = state
        .profiles
        .find_by_id(&user.uid)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?
        .ok_or_else(|| {
            ApiError::from_application(
                ApplicationError::NotFound(format!("profile `{}`", user.uid)),
                &cid,
            )
        })?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let update = payload(body, &cid)?
        .validate()
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;

    let profile = state
        .profiles
        .update_display_name(&user.uid, &update.display_name)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?
        .ok_or_else(|| {
            ApiError::from_application(
                ApplicationError::NotFound(format!("profile `{}`", user.uid)),
                &cid,
            )
        })?;

    info!(
        event_name = "profile.updated",
        correlation_id = %cid,
        user_id = %user.uid,
        "display name updated"
    );
    Ok(Json(profile))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FlightAlert>>, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let alerts = state
        .alerts
        .list_for_user(&user.uid)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;
    Ok(Json(alerts))
}

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AlertInput>, JsonRejection>,
) -> Result<(StatusCode, Json<FlightAlert>), ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let draft = payload(body, &cid)?
        .into_draft()
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;

    let alert = FlightAlert::create(user.uid.clone(), draft, Utc::now());
    state
        .alerts
        .create(alert.clone())
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;

    info!(
        event_name = "alert.created",
        correlation_id = %cid,
        user_id = %user.uid,
        alert_id = %alert.id,
        "flight alert created"
    );
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn update_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<AlertDraft>, JsonRejection>,
) -> Result<Json<FlightAlert>, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let draft =
        payload(body, &cid)?.validate().map_err(|e| ApiError::from_application(e.into(), &cid))?;

    let alert_id = AlertId(id);
    let not_found = || {
        ApiError::from_application(ApplicationError::NotFound(format!("alert `{alert_id}`")), &cid)
    };

    let mut alert = state
        .alerts
        .find_by_id(&alert_id)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?
        .filter(|alert| alert.is_owned_by(&user.uid))
        .ok_or_else(not_found)?;

    alert.apply(draft, Utc::now());
    let updated = state
        .alerts
        .update(alert.clone())
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;
    if !updated {
        return Err(not_found());
    }

    info!(
        event_name = "alert.updated",
        correlation_id = %cid,
        user_id = %user.uid,
        alert_id = %alert.id,
        "flight alert updated"
    );
    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let alert_id = AlertId(id);

    let deleted = state
        .alerts
        .delete(&user.uid, &alert_id)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;
    if !deleted {
        return Err(ApiError::from_application(
            ApplicationError::NotFound(format!("alert `{alert_id}`")),
            &cid,
        ));
    }

    info!(
        event_name = "alert.deleted",
        correlation_id = %cid,
        user_id = %user.uid,
        alert_id = %alert_id,
        "flight alert deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn estimate_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let cid = correlation_id(&headers);
    let user = require_user(resolve(&state, &headers).await, &cid)?;
    let request = payload(body, &cid)?;

    let Some(_permit) = state.estimate_gate.try_acquire(&user.uid) else {
        return Err(ApiError::from_application(
            ApplicationError::Conflict("an estimate is already in progress".to_string()),
            &cid,
        ));
    };

    let estimate = state
        .estimator
        .estimate(&request)
        .await
        .map_err(|e| ApiError::from_application(e.into(), &cid))?;
    Ok(Json(estimate))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use sentinel_agent::LlmError;

    use crate::app;
    use crate::test_support::{failing_profiles_state, state_with_replies};

    async fn send(
        app: axum::Router,
        method: &str,
        uri: &str,
        uid: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(uid) = uid {
            builder = builder
                .header("x-sentinel-uid", uid)
                .header("x-sentinel-email", format!("{uid}@example.com"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    #[tokio::test]
    async fn session_reports_signed_out_without_identity() {
        let (state, _) = state_with_replies(Vec::new());
        let (status, body) = send(app(state), "GET", "/api/v1/session", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unauthenticated");
        assert_eq!(body["user"], Value::Null);
    }

    #[tokio::test]
    async fn first_request_provisions_profile_once() {
        let (state, _) = state_with_replies(Vec::new());

        let (status, body) =
            send(app(state.clone()), "GET", "/api/v1/session", Some("uid-1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "authenticated");
        assert_eq!(body["user"]["uid"], "uid-1");

        let (_, profile) =
            send(app(state.clone()), "GET", "/api/v1/profile", Some("uid-1"), None).await;
        assert_eq!(profile["displayName"], "uid-1");

        let (status, renamed) = send(
            app(state.clone()),
            "PUT",
            "/api/v1/profile",
            Some("uid-1"),
            Some(json!({"displayName": "Globetrotter"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["displayName"], "Globetrotter");

        let (_, profile) = send(app(state), "GET", "/api/v1/profile", Some("uid-1"), None).await;
        assert_eq!(profile["displayName"], "Globetrotter");
    }

    #[tokio::test]
    async fn navigation_endpoint_applies_guard_table() {
        let (state, _) = state_with_replies(Vec::new());

        let (_, body) = send(
            app(state.clone()),
            "GET",
            "/api/v1/session/navigation?path=/dashboard",
            None,
            None,
        )
        .await;
        assert_eq!(body["decision"], "redirect");
        assert_eq!(body["location"], "/login");
        assert_eq!(body["category"], "protected");

        let (_, body) = send(
            app(state),
            "GET",
            "/api/v1/session/navigation?path=/login",
            Some("uid-1"),
            None,
        )
        .await;
        assert_eq!(body["decision"], "redirect");
        assert_eq!(body["location"], "/dashboard");
    }

    #[tokio::test]
    async fn api_requires_identity() {
        let (state, _) = state_with_replies(Vec::new());
        let (status, body) = send(app(state), "GET", "/api/v1/alerts", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert!(body["correlation_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn provisioning_failure_yields_service_unavailable() {
        let state = failing_profiles_state();
        let (status, body) =
            send(app(state), "GET", "/api/v1/alerts", Some("uid-1"), None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn alert_lifecycle_is_owner_scoped() {
        let (state, _) = state_with_replies(Vec::new());

        let (status, created) = send(
            app(state.clone()),
            "POST",
            "/api/v1/alerts",
            Some("uid-1"),
            Some(json!({"origin": "SFO", "destination": "JFK", "dates": "October 2024"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["targetPrice"], json!(500.0));
        let id = created["id"].as_str().expect("alert id").to_string();

        let (status, _) = send(
            app(state.clone()),
            "PUT",
            &format!("/api/v1/alerts/{id}"),
            Some("uid-2"),
            Some(json!({"origin": "LAX", "destination": "JFK", "dates": "May", "targetPrice": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, updated) = send(
            app(state.clone()),
            "PUT",
            &format!("/api/v1/alerts/{id}"),
            Some("uid-1"),
            Some(json!({"origin": "LAX", "destination": "JFK", "dates": "May", "targetPrice": 320})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["origin"], "LAX");
        assert!(updated["updatedAt"].is_string());

        let (_, foreign) = send(app(state.clone()), "GET", "/api/v1/alerts", Some("uid-2"), None).await;
        assert_eq!(foreign, json!([]));

        let (status, _) = send(
            app(state.clone()),
            "DELETE",
            &format!("/api/v1/alerts/{id}"),
            Some("uid-2"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app(state.clone()),
            "DELETE",
            &format!("/api/v1/alerts/{id}"),
            Some("uid-1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, remaining) = send(app(state), "GET", "/api/v1/alerts", Some("uid-1"), None).await;
        assert_eq!(remaining, json!([]));
    }

    #[tokio::test]
    async fn invalid_alert_is_rejected() {
        let (state, _) = state_with_replies(Vec::new());
        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/alerts",
            Some("uid-1"),
            Some(json!({"origin": "", "destination": "JFK", "dates": "May", "targetPrice": 100})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().expect("message").contains("origin"));
    }

    #[tokio::test]
    async fn estimate_returns_model_answer() {
        let (state, client) = state_with_replies(vec![Ok(
            r#"{"estimatedPrice": 410.5, "reasoning": "Autumn shoulder season."}"#.to_string(),
        )]);
        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/estimate",
            Some("uid-1"),
            Some(json!({
                "origin": "SFO",
                "destination": "JFK",
                "dates": "October 2024",
                "standardPrice": 1000
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimatedPrice"], json!(410.5));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn estimate_provider_failure_is_service_unavailable() {
        let (state, _) = state_with_replies(vec![Err(LlmError::Timeout("slow".to_string()))]);
        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/estimate",
            Some("uid-1"),
            Some(json!({"origin": "SFO", "destination": "JFK", "dates": "Oct", "standardPrice": 900})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn concurrent_estimate_for_same_user_conflicts() {
        let (state, client) = state_with_replies(Vec::new());
        let _held = state
            .estimate_gate
            .try_acquire(&sentinel_core::UserId("uid-1".to_string()))
            .expect("hold slot");

        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/estimate",
            Some("uid-1"),
            Some(json!({"origin": "SFO", "destination": "JFK", "dates": "Oct", "standardPrice": 900})),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (state, _) = state_with_replies(Vec::new());
        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/estimate",
            Some("uid-1"),
            Some(json!({"origin": "SFO"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }
}
