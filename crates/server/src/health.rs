use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pollbot_slack::api::SlackApi;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    api: Arc<dyn SlackApi>,
    api_base_url: String,
}

impl HealthState {
    pub fn new(api: Arc<dyn SlackApi>, api_base_url: impl Into<String>) -> Self {
        Self { api, api_base_url: api_base_url.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub slack: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let slack = slack_check(&state).await;
    let ready = slack.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "pollbot-server runtime initialized".to_string(),
        },
        slack,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn slack_check(state: &HealthState) -> HealthCheck {
    match state.api.auth_test().await {
        Ok(identity) => HealthCheck {
            status: "ready",
            detail: format!(
                "bot `{}` authenticated for team `{}` via `{}`",
                identity.user_id, identity.team, state.api_base_url
            ),
        },
        Err(error) => {
            warn!(
                event_name = "system.health.slack_degraded",
                correlation_id = "health",
                error = %error,
                "slack auth.test failed"
            );
            HealthCheck { status: "degraded", detail: format!("slack auth.test failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};

    use crate::health::{health, HealthState};
    use crate::test_support::StubSlackApi;

    #[tokio::test]
    async fn health_returns_ready_when_token_is_accepted() {
        let state = HealthState::new(Arc::new(StubSlackApi::default()), "https://slack.com/api");

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.slack.status, "ready");
        assert!(payload.slack.detail.contains("Acme"));
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_token_is_rejected() {
        let api = StubSlackApi {
            fail_auth_with: Some("invalid_auth".to_string()),
            ..StubSlackApi::default()
        };
        let state = HealthState::new(Arc::new(api), "https://slack.com/api");

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.slack.status, "degraded");
        assert!(payload.slack.detail.contains("invalid_auth"));
        assert_eq!(payload.service.status, "ready");
    }
}
