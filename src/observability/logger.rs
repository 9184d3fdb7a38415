//! Structured JSON logger for mdao
//!
//! - Structured lines (JSON) with deterministic key ordering
//! - Explicit severity levels
//! - One log line = one event
//! - Delivered through `tracing` under the `mdao` target, so the host
//!   application's subscriber decides where lines go

use std::fmt;

use serde_json::{Map, Value};

/// Target every mdao event is logged under
pub const TARGET: &str = "mdao";

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-operation detail
    Trace = 0,
    /// Lifecycle changes
    Info = 1,
    /// Rejected input
    Warn = 2,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that renders JSON lines
pub struct Logger;

impl Logger {
    /// Returns true if a subscriber would record events at `severity`.
    ///
    /// Callers on hot paths check this before formatting fields.
    pub fn enabled(severity: Severity) -> bool {
        match severity {
            Severity::Trace => tracing::enabled!(target: TARGET, tracing::Level::TRACE),
            Severity::Info => tracing::enabled!(target: TARGET, tracing::Level::INFO),
            Severity::Warn => tracing::enabled!(target: TARGET, tracing::Level::WARN),
        }
    }

    /// Log an event with the given severity and fields
    ///
    /// The event name and the field object are recorded as tracing fields
    /// (`event`, `fields`); the message is the full JSON line.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let object = Self::fields_object(fields);
        let fields_json = Value::Object(object.clone()).to_string();
        let line = Self::line(severity, event, object);
        match severity {
            Severity::Trace => tracing::trace!(target: TARGET, event, fields = %fields_json, "{}", line),
            Severity::Info => tracing::info!(target: TARGET, event, fields = %fields_json, "{}", line),
            Severity::Warn => tracing::warn!(target: TARGET, event, fields = %fields_json, "{}", line),
        }
    }

    /// Renders one event as a single JSON object with sorted keys
    pub(crate) fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        Self::line(severity, event, Self::fields_object(fields))
    }

    fn fields_object(fields: &[(&str, &str)]) -> Map<String, Value> {
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), Value::from(*value)))
            .collect()
    }

    fn line(severity: Severity, event: &str, mut object: Map<String, Value>) -> String {
        object.insert("event".to_string(), Value::from(event));
        object.insert("severity".to_string(), Value::from(severity.as_str()));
        Value::Object(object).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
    }

    #[test]
    fn test_log_json_format() {
        let output = Logger::render(Severity::Info, "TEST_EVENT", &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "TEST_EVENT");
        assert_eq!(parsed["severity"], "INFO");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = Logger::render(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = Logger::render(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );
        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(apple_pos < zebra_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = Logger::render(
            Severity::Info,
            "TEST",
            &[("message", "hello \"world\"\nline2")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "hello \"world\"\nline2");
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_event_name_wins_over_field() {
        let output = Logger::render(Severity::Trace, "REAL", &[("event", "spoofed")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "REAL");
    }

    #[test]
    fn test_log_without_subscriber() {
        // No subscriber installed: must be a silent no-op
        Logger::log(Severity::Trace, "TEST", &[("k", "v")]);
        Logger::log(Severity::Warn, "TEST", &[]);
    }
}
