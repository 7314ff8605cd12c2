//! # Real-Time Errors
//!
//! Error types for the real-time module.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    // ==================
    // Input Errors
    // ==================
    /// Candidate revision is not a non-negative integer
    #[error("Malformed revision: {0:?}")]
    MalformedRevision(String),

    // ==================
    // Transport Errors
    // ==================
    /// Outbound queue of the connection is closed
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Outbound queue of the connection is full
    #[error("Outbound queue full: {0}")]
    QueueFull(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RealtimeError::MalformedRevision("12x".into());
        assert_eq!(err.to_string(), "Malformed revision: \"12x\"");

        let err = RealtimeError::QueueFull("c1".into());
        assert_eq!(err.to_string(), "Outbound queue full: c1");
    }
}
