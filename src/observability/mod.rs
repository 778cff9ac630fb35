//! Observability for the resource layer
//!
//! Structured JSON log lines, one per event. Logging never fails a
//! request and never blocks on anything but the output stream.
//!
//! ```ignore
//! use docrest::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ObjectsDeleted, &[("resource", "booking"), ("count", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
