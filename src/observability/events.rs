//! Observability events for mdao
//!
//! Every event the engine can log. Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in mdao
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Engine constructed
    EngineCreated,
    /// Alternative index registered
    IndexAdded,
    /// Read-only snapshot taken
    SnapshotTaken,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Configuration rejected
    ConfigRejected,

    // Writes
    /// Record inserted or replaced
    RecordPut,
    /// Record removed
    RecordRemoved,
    /// Bulk removal
    RemoveAll,

    // Reads
    /// Primary key lookup
    RecordFound,
    /// Select planned
    QueryPlanned,
    /// Select executed
    QueryExecuted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineCreated => "ENGINE_CREATED",
            Event::IndexAdded => "INDEX_ADDED",
            Event::SnapshotTaken => "SNAPSHOT_TAKEN",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",

            Event::RecordPut => "RECORD_PUT",
            Event::RecordRemoved => "RECORD_REMOVED",
            Event::RemoveAll => "REMOVE_ALL",

            Event::RecordFound => "RECORD_FOUND",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_COMPLETE",
        }
    }

    /// Level the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::EngineCreated
            | Event::IndexAdded
            | Event::ConfigLoaded
            | Event::RemoveAll
            | Event::QueryPlanned => Severity::Info,
            Event::ConfigRejected => Severity::Warn,
            Event::SnapshotTaken
            | Event::RecordPut
            | Event::RecordRemoved
            | Event::RecordFound
            | Event::QueryExecuted => Severity::Trace,
        }
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
    fn test_all_events_have_string_representation() {
        let events = [
            Event::EngineCreated,
            Event::IndexAdded,
            Event::SnapshotTaken,
            Event::ConfigLoaded,
            Event::ConfigRejected,
            Event::RecordPut,
            Event::RecordRemoved,
            Event::RemoveAll,
            Event::RecordFound,
            Event::QueryPlanned,
            Event::QueryExecuted,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            // Verify all uppercase format
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_hot_path_events_are_trace() {
        assert_eq!(Event::RecordPut.severity(), Severity::Trace);
        assert_eq!(Event::RecordFound.severity(), Severity::Trace);
        assert_eq!(Event::IndexAdded.severity(), Severity::Info);
        assert_eq!(Event::ConfigRejected.severity(), Severity::Warn);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::RecordPut), "RECORD_PUT");
        assert_eq!(format!("{}", Event::QueryExecuted), "QUERY_COMPLETE");
    }
}
