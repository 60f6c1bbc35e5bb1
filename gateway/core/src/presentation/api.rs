// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP surface: `GET /health` and `GET /chat/summary`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::assembler::AssembledResponse;
use crate::application::chat_summary::ChatSummaryService;
use crate::infrastructure::simulated::{SimulationOverrides, SimulationProfile};

pub struct AppState {
    pub summary_service: Arc<ChatSummaryService>,
    /// Base profile for per-request overrides; `None` disables them.
    pub simulation: Option<SimulationProfile>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(summary_service: Arc<ChatSummaryService>) -> Self {
        Self {
            summary_service,
            simulation: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_request_overrides(mut self, base: SimulationProfile) -> Self {
        self.simulation = Some(base);
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat/summary", get(chat_summary_handler))
        .with_state(Arc::new(state))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn chat_summary_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // cancelled if axum drops this future (client went away)
    let caller = CancellationToken::new();
    let _disconnect = caller.clone().drop_guard();

    let user_id = params.get("user_id").map(String::as_str).unwrap_or_default();
    let chat_id = params.get("chat_id").map(String::as_str).unwrap_or_default();

    let overridden = state.simulation.as_ref().and_then(|base| {
        let overrides = SimulationOverrides::from_query(&params);
        if overrides.is_empty() {
            return None;
        }
        debug!(?overrides, "applying per-request simulation overrides");
        Some(
            state
                .summary_service
                .with_dependencies(base.with_overrides(&overrides).build()),
        )
    });
    let service = overridden.as_ref().unwrap_or(state.summary_service.as_ref());

    match service.summarize(user_id, chat_id, &caller).await {
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
        Ok(AssembledResponse::Complete(summary)) | Ok(AssembledResponse::Degraded(summary)) => {
            (StatusCode::OK, Json(summary)).into_response()
        }
        Ok(AssembledResponse::Failed(failure)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": failure.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChatCriticality;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AppState {
        let service = ChatSummaryService::new(
            SimulationProfile::default().build(),
            ChatCriticality::default(),
            Duration::from_millis(200),
        )
        .unwrap();
        AppState::new(Arc::new(service))
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = fetch(app(state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn test_missing_parameter_is_bad_request() {
        let (status, body) = fetch(app(state()), "/chat/summary?user_id=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required parameter: chat_id");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrides_ignored_unless_enabled() {
        let (status, body) = fetch(app(state()), "/chat/summary?user_id=1&chat_id=42&user_fail=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], "1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrides_applied_when_enabled() {
        let router = app(state().with_request_overrides(SimulationProfile::default()));

        let (status, body) = fetch(router.clone(), "/chat/summary?user_id=1&chat_id=42&user_fail=1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "critical dependency failed: user");

        let (status, body) = fetch(router, "/chat/summary?user_id=1&chat_id=42&perms_allowed=no").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["permissions"]["allowed"], false);
    }
}
