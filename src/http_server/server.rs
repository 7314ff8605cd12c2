//! # HTTP Server
//!
//! Combines the realtime, webhook, revision and health routers.

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, HealthState};
use super::realtime_routes::{realtime_routes, RealtimeState, DEFAULT_OUTBOUND_QUEUE_CAPACITY};
use super::revision_routes::{revision_routes, RevisionState};
use super::webhook_routes::{webhook_routes, WebhookSecret, WebhookState};
use crate::bootstrap::RevisionAuthority;
use crate::observability::{Event, Logger};
use crate::realtime::Broadcaster;

/// HTTP server for revcast
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

/// Collaborators the routes are built from
pub struct ServerParts {
    pub broadcaster: Arc<Broadcaster>,
    pub authority: Arc<dyn RevisionAuthority>,
    pub secret: WebhookSecret,
    pub queue_capacity: usize,
}

impl ServerParts {
    pub fn new(
        broadcaster: Arc<Broadcaster>,
        authority: Arc<dyn RevisionAuthority>,
        secret: WebhookSecret,
    ) -> Self {
        Self {
            broadcaster,
            authority,
            secret,
            queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl HttpServer {
    /// Create a server over the given collaborators
    pub fn new(config: HttpServerConfig, parts: ServerParts) -> Self {
        let router = Self::build_router(&config, parts);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, parts: ServerParts) -> Router {
        let realtime_state = Arc::new(RealtimeState {
            broadcaster: Arc::clone(&parts.broadcaster),
            queue_capacity: parts.queue_capacity,
        });
        let webhook_state = Arc::new(WebhookState {
            broadcaster: Arc::clone(&parts.broadcaster),
            secret: parts.secret,
        });
        let revision_state = Arc::new(RevisionState {
            authority: parts.authority,
        });
        let health_state = Arc::new(HealthState::new(parts.broadcaster));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(realtime_routes(realtime_state))
            .merge(webhook_routes(webhook_state))
            .merge(revision_routes(revision_state))
            .merge(health_routes(health_state))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?.to_string();
        Logger::event(Event::Serving, &[("addr", addr.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::bootstrap::BootstrapResult;
    use crate::realtime::Revision;

    struct FixedAuthority;

    #[async_trait]
    impl RevisionAuthority for FixedAuthority {
        async fn fetch_revision(&self) -> BootstrapResult<Revision> {
            Ok(Revision::new(99))
        }
    }

    fn make_server(config: HttpServerConfig) -> HttpServer {
        let parts = ServerParts::new(
            Arc::new(Broadcaster::new(Revision::new(5))),
            Arc::new(FixedAuthority),
            WebhookSecret::new("k").unwrap(),
        );
        HttpServer::new(config, parts)
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = make_server(HttpServerConfig::with_port(9090));
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[tokio::test]
    async fn test_routes_are_merged() {
        for (uri, expected) in [
            ("/health", StatusCode::OK),
            ("/revision", StatusCode::OK),
            ("/broadcast?key=k&rev=6", StatusCode::OK),
            ("/broadcast?key=x&rev=6", StatusCode::FORBIDDEN),
            ("/nonexistent", StatusCode::NOT_FOUND),
        ] {
            let app = make_server(HttpServerConfig::default()).router();
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), expected, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_restricted_cors_builds() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..HttpServerConfig::default()
        };
        let app = make_server(config).router();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
