//! # revcast HTTP Server Module
//!
//! Axum server exposing the real-time channel and the webhook.
//!
//! # Endpoints
//!
//! - `/` - WebSocket upgrade; receives the current revision, then every new one
//! - `/broadcast` - Webhook (`GET ?key=&rev=` or `POST {"revision": n}`)
//! - `/revision` - Latest revision as reported by the authority
//! - `/health` - Health check

pub mod config;
pub mod observability_routes;
pub mod realtime_routes;
pub mod revision_routes;
pub mod server;
pub mod webhook_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use webhook_routes::WebhookSecret;

use serde::Serialize;

/// Error body shared by all handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}
