//! Observable events for revcast
//!
//! Every log line names exactly one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Startup begins
    BootStart,
    /// Bootstrap revision loaded, about to serve
    BootComplete,
    /// Startup aborted (FATAL)
    BootFailed,
    /// Listening for connections
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Bootstrap
    /// Revision fetched from the authority
    AuthorityFetched,
    /// Authority fetch failed
    AuthorityFetchFailed,

    // Connections
    /// Client connected and received the current revision
    ConnectionOpened,
    /// Client closed the connection
    ConnectionClosed,
    /// Connection removed for not answering probes
    ConnectionTerminated,
    /// Frame could not be queued for a connection
    SendFailed,
    /// Probe could not be queued for a connection
    ProbeFailed,

    // Revisions
    /// Register advanced and fan-out done
    RevisionAdvanced,
    /// Submitted revision not greater than current
    RevisionStale,
    /// Submitted revision not numeric
    RevisionMalformed,

    // Webhook
    /// Webhook credential mismatch
    WebhookUnauthorized,

    // Liveness
    /// Probe cycle finished
    SweepComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "REVCAST_STARTUP_BEGIN",
            Event::BootComplete => "REVCAST_STARTUP_COMPLETE",
            Event::BootFailed => "REVCAST_STARTUP_FAILED",
            Event::Serving => "REVCAST_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::AuthorityFetched => "AUTHORITY_FETCHED",
            Event::AuthorityFetchFailed => "AUTHORITY_FETCH_FAILED",

            Event::ConnectionOpened => "CONNECTION_OPENED",
            Event::ConnectionClosed => "CONNECTION_CLOSED",
            Event::ConnectionTerminated => "CONNECTION_TERMINATED",
            Event::SendFailed => "SEND_FAILED",
            Event::ProbeFailed => "PROBE_FAILED",

            Event::RevisionAdvanced => "REVISION_ADVANCED",
            Event::RevisionStale => "REVISION_STALE",
            Event::RevisionMalformed => "REVISION_MALFORMED",

            Event::WebhookUnauthorized => "WEBHOOK_UNAUTHORIZED",

            Event::SweepComplete => "SWEEP_COMPLETE",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BootFailed => Severity::Fatal,
            Event::AuthorityFetchFailed => Severity::Error,
            Event::SendFailed
            | Event::ProbeFailed
            | Event::RevisionMalformed
            | Event::WebhookUnauthorized
            | Event::ConnectionTerminated => Severity::Warn,
            Event::SweepComplete | Event::RevisionStale => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_boot_failure_is_fatal() {
        assert!(Event::BootFailed.is_fatal());
        assert!(!Event::AuthorityFetchFailed.is_fatal());
        assert!(!Event::SendFailed.is_fatal());
        assert!(!Event::WebhookUnauthorized.is_fatal());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Event::RevisionAdvanced.as_str(), "REVISION_ADVANCED");
        assert_eq!(Event::ConnectionTerminated.to_string(), "CONNECTION_TERMINATED");
    }

    #[test]
    fn test_transport_failures_are_warnings() {
        assert_eq!(Event::SendFailed.severity(), Severity::Warn);
        assert_eq!(Event::ProbeFailed.severity(), Severity::Warn);
    }
}
