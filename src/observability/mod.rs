//! Observability subsystem for mdao
//!
//! This module provides:
//! - Structured logging (JSON lines over `tracing`)
//! - Per-engine metrics
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//! 4. Nothing is formatted unless a subscriber wants the level
//!
//! # Usage
//!
//! ```
//! use mdao::observability::{log_event, Event, MetricsRegistry};
//!
//! log_event(Event::IndexAdded, &[("index", "tree(age)")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_selects();
//! assert_eq!(metrics.snapshot().selects, 1);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, TARGET};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

/// Returns true if `event` would be recorded
pub fn event_enabled(event: Event) -> bool {
    Logger::enabled(event.severity())
}
