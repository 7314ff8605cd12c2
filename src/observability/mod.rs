//! Observability for revcast
//!
//! Structured JSON logging of typed lifecycle and delivery events.
//!
//! # Usage
//!
//! ```ignore
//! use revcast::observability::{Event, Logger};
//!
//! Logger::event(Event::RevisionAdvanced, &[("revision", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::event(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::event(event, fields);
}
