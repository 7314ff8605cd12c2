//! # Bootstrap Errors

use thiserror::Error;

/// Result type for authority fetches
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Failures talking to the revision authority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Request did not complete
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Authority answered with a non-success status
    #[error("Authority returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Body was not `{"revision": <n>}`
    #[error("Invalid authority response: {0}")]
    InvalidBody(String),
}
