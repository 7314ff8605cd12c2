//! Webhook Routes
//!
//! Lets an authorized caller push a new revision.
//!
//! The shared secret is taken from `?key=` or the `X-Webhook-Key` header.
//! The candidate comes from `?rev=` (GET) or a JSON body field `revision`
//! (POST), given either as a number or a numeric string. Any other POST
//! body is malformed. Stale and malformed candidates are acknowledged
//! without effect.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;

use super::ErrorResponse;
use crate::observability::{Event, Logger};
use crate::realtime::Broadcaster;

/// Header carrying the webhook secret
pub const WEBHOOK_KEY_HEADER: &str = "x-webhook-key";

/// Server-held webhook secret
#[derive(Clone)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wrap a secret. Empty secrets are rejected.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Constant-time comparison against a presented key
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Webhook state
pub struct WebhookState {
    pub broadcaster: Arc<Broadcaster>,
    pub secret: WebhookSecret,
}

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastQuery {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastBody {
    revision: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookResponse {
    /// Whether this submission moved the register
    pub advanced: bool,
    /// Register value after the submission
    pub revision: u64,
}

/// Create webhook routes
pub fn webhook_routes(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/broadcast", get(broadcast_query_handler).post(broadcast_body_handler))
        .with_state(state)
}

/// `GET /broadcast?key=<secret>&rev=<n>`
async fn broadcast_query_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    Query(query): Query<BroadcastQuery>,
) -> Response {
    if !authorized(&state.secret, &query, &headers) {
        return unauthorized();
    }

    let candidate = query.rev.unwrap_or_default();
    submit(&state.broadcaster, &candidate)
}

/// `POST /broadcast?key=<secret>` with `{"revision": n}`
async fn broadcast_body_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    Query(query): Query<BroadcastQuery>,
    body: Bytes,
) -> Response {
    if !authorized(&state.secret, &query, &headers) {
        return unauthorized();
    }

    match serde_json::from_slice::<BroadcastBody>(&body) {
        Ok(body) => submit(&state.broadcaster, &candidate_from_value(&body.revision)),
        Err(_) => {
            let raw = String::from_utf8_lossy(&body);
            Logger::event(Event::RevisionMalformed, &[("candidate", raw.as_ref())]);
            acknowledge(WebhookResponse {
                advanced: false,
                revision: state.broadcaster.current().value(),
            })
        }
    }
}

fn authorized(secret: &WebhookSecret, query: &BroadcastQuery, headers: &HeaderMap) -> bool {
    let presented = query
        .key
        .as_deref()
        .or_else(|| headers.get(WEBHOOK_KEY_HEADER).and_then(|v| v.to_str().ok()));

    match presented {
        Some(key) if secret.matches(key) => true,
        _ => {
            Logger::event(Event::WebhookUnauthorized, &[]);
            false
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: "Not authorized".to_string(),
            code: 403,
        }),
    )
        .into_response()
}

fn candidate_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn submit(broadcaster: &Broadcaster, candidate: &str) -> Response {
    // Malformed input is logged by the broadcaster and acknowledged like a stale one.
    let response = match broadcaster.publish_str(candidate) {
        Ok(outcome) => WebhookResponse {
            advanced: outcome.advanced,
            revision: outcome.revision.value(),
        },
        Err(_) => WebhookResponse {
            advanced: false,
            revision: broadcaster.current().value(),
        },
    };
    acknowledge(response)
}

fn acknowledge(response: WebhookResponse) -> Response {
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::realtime::{outbound_queue, Connection, Outbound, Revision};

    fn app(initial: u64) -> (Router, Arc<Broadcaster>) {
        let broadcaster = Arc::new(Broadcaster::new(Revision::new(initial)));
        let state = Arc::new(WebhookState {
            broadcaster: Arc::clone(&broadcaster),
            secret: WebhookSecret::new("s3cret").unwrap(),
        });
        (webhook_routes(state), broadcaster)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_secret_rejects_empty() {
        assert!(WebhookSecret::new("").is_none());
    }

    #[test]
    fn test_secret_matching() {
        let secret = WebhookSecret::new("abc").unwrap();
        assert!(secret.matches("abc"));
        assert!(!secret.matches("abd"));
        assert!(!secret.matches("ab"));
        assert!(!secret.matches(""));
        assert_eq!(format!("{:?}", secret), "WebhookSecret(<redacted>)");
    }

    #[tokio::test]
    async fn test_query_submission_advances() {
        let (app, broadcaster) = app(5);

        let (status, body) = send(app, get("/broadcast?key=s3cret&rev=7")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"advanced": true, "revision": 7}));
        assert_eq!(broadcaster.current(), Revision::new(7));
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let (app, broadcaster) = app(5);
        let (tx, mut rx) = outbound_queue(4);
        broadcaster.join(Connection::with_id("a", tx)).unwrap();
        rx.try_recv().unwrap();

        let (status, body) = send(app, get("/broadcast?key=nope&rev=9")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 403);
        assert_eq!(broadcaster.current(), Revision::new(5));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_key_rejected() {
        let (app, broadcaster) = app(5);

        let (status, _) = send(app, get("/broadcast?rev=9")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(broadcaster.current(), Revision::new(5));
    }

    #[tokio::test]
    async fn test_body_submission_with_header_key() {
        let (app, broadcaster) = app(5);
        let req = Request::builder()
            .method("POST")
            .uri("/broadcast")
            .header("content-type", "application/json")
            .header(WEBHOOK_KEY_HEADER, "s3cret")
            .body(Body::from(r#"{"revision": 12}"#))
            .unwrap();

        let (status, body) = send(app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"advanced": true, "revision": 12}));
        assert_eq!(broadcaster.current(), Revision::new(12));
    }

    #[tokio::test]
    async fn test_body_submission_string_revision() {
        let (app, broadcaster) = app(5);

        let (status, _) = send(app, post("/broadcast?key=s3cret", json!({"revision": "8"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(broadcaster.current(), Revision::new(8));
    }

    #[tokio::test]
    async fn test_stale_submission_is_success_without_broadcast() {
        let (app, broadcaster) = app(7);
        let (tx, mut rx) = outbound_queue(4);
        broadcaster.join(Connection::with_id("a", tx)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Outbound::Revision(Revision::new(7)));

        let (status, body) = send(app, get("/broadcast?key=s3cret&rev=7")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"advanced": false, "revision": 7}));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_submissions_leave_state() {
        let (app, broadcaster) = app(5);

        for req in [
            get("/broadcast?key=s3cret&rev=abc"),
            get("/broadcast?key=s3cret"),
            post("/broadcast?key=s3cret", json!({"revision": -4})),
            post("/broadcast?key=s3cret", json!({"revision": null})),
            post("/broadcast?key=s3cret", json!({"other": 1})),
        ] {
            let (status, body) = send(app.clone(), req).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"advanced": false, "revision": 5}));
        }
        assert_eq!(broadcaster.current(), Revision::new(5));
    }

    #[tokio::test]
    async fn test_bare_body_is_malformed() {
        let (app, broadcaster) = app(5);

        for (content_type, raw) in [("text/plain", "42"), ("application/json", "42")] {
            let req = Request::builder()
                .method("POST")
                .uri("/broadcast?key=s3cret")
                .header("content-type", content_type)
                .body(Body::from(raw))
                .unwrap();

            let (status, body) = send(app.clone(), req).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"advanced": false, "revision": 5}));
        }
        assert_eq!(broadcaster.current(), Revision::new(5));
    }
}
