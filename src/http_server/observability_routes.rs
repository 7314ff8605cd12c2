//! Observability HTTP Routes
//!
//! Health check reporting the cached revision and connection count.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::realtime::Broadcaster;

/// Health state
pub struct HealthState {
    pub broadcaster: Arc<Broadcaster>,
    pub started_at: DateTime<Utc>,
}

impl HealthState {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            broadcaster,
            started_at: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub revision: u64,
    pub connections: usize,
    pub started_at: String,
}

/// Health check route
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        revision: state.broadcaster.current().value(),
        connections: state.broadcaster.connection_count(),
        started_at: state.started_at.to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::realtime::Revision;

    #[tokio::test]
    async fn test_health_reports_revision() {
        let state = Arc::new(HealthState::new(Arc::new(Broadcaster::new(Revision::new(17)))));
        let app = health_routes(state);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["revision"], 17);
        assert_eq!(parsed["connections"], 0);
        assert!(parsed["started_at"].is_string());
    }
}
