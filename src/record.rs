//! Run-record data model and event-log parsing
//!
//! A `RunRecord` is one execution of a named test sequence against the
//! hardware, as stored in the `test_runs` table. The JSON event log is
//! parsed tolerantly: malformed payloads become an empty event list so a
//! single corrupt row never aborts an analysis.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status strings that count as a successful run outcome.
///
/// Any status outside this set is treated as a failure.
pub const SUCCESS_STATUSES: [&str; 3] = ["completed", "ok", "success"];

/// One execution of a test sequence, with its outcome and event log.
///
/// Timestamps are parsed once at the storage boundary (see
/// [`parse_timestamp`]) and are immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Row id in the test_runs table
    pub id: i64,
    /// Human-assigned run name
    pub name: String,
    /// Name of the sequence this run executed
    pub sequence_name: String,
    /// Wall-clock start of the run (UTC)
    pub start_time: DateTime<Utc>,
    /// Total run duration in seconds, if recorded
    pub duration_secs: Option<f64>,
    /// Total cycle count, if recorded
    pub cycles: Option<u32>,
    /// Outcome status string (see [`SUCCESS_STATUSES`])
    pub status: String,
    /// Raw JSON event log payload, if any
    pub log: Option<String>,
}

impl RunRecord {
    /// Whether this run's status is a successful outcome.
    pub fn is_success(&self) -> bool {
        is_success_status(&self.status)
    }
}

/// Whether a status string is in the successful-outcome set.
pub fn is_success_status(status: &str) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// One logged event: which cycle it belongs to and its time offset.
///
/// Missing fields default to 0, matching how sparse logger firmware
/// emits events.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LogEvent {
    /// Cycle index the event belongs to
    #[serde(default)]
    pub cycle: u32,
    /// Timestamp offset within the run (milliseconds)
    #[serde(default)]
    pub time: f64,
}

/// The two accepted log payload shapes: a bare event list, or an
/// envelope object with an `events` key (the logger's richer format that
/// also carries sensor data we don't consume here).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLog {
    Events(Vec<LogEvent>),
    Envelope {
        #[serde(default)]
        events: Vec<LogEvent>,
    },
}

/// Parse a raw log payload into its event list.
///
/// Malformed JSON, a non-list/non-envelope payload, or a missing payload
/// all yield an empty list. The caller still gets a defined (zero)
/// metric for the run.
pub fn parse_event_log(raw: Option<&str>) -> Vec<LogEvent> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<RawLog>(raw) {
        Ok(RawLog::Events(events)) => events,
        Ok(RawLog::Envelope { events }) => events,
        Err(e) => {
            tracing::warn!("unparseable event log, substituting empty: {}", e);
            Vec::new()
        }
    }
}

/// Parse an ISO-8601 timestamp string into UTC.
///
/// Accepts RFC 3339 (with offset) and naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// strings, which are interpreted as UTC. Returns `None` for anything
/// else; storage-layer callers skip such rows.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// A derived per-run data point on the metric timeline.
///
/// Recomputed on every analysis call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MetricPoint {
    /// Run start time
    pub timestamp: DateTime<Utc>,
    /// Source run id
    pub run_id: i64,
    /// Sequence the run executed
    pub sequence: String,
    /// Average cycle time for the run (0 when not derivable)
    pub avg_cycle_time: f64,
    /// Run duration in seconds, if recorded
    pub duration_secs: Option<f64>,
    /// Total cycle count, if recorded
    pub cycles: Option<u32>,
    /// Whether the run's status was a successful outcome
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str) -> RunRecord {
        RunRecord {
            id: 1,
            name: "run-1".to_string(),
            sequence_name: "burn-in".to_string(),
            start_time: parse_timestamp("2026-01-01T10:00:00").unwrap(),
            duration_secs: Some(12.5),
            cycles: Some(100),
            status: status.to_string(),
            log: None,
        }
    }

    #[test]
    fn test_success_statuses() {
        assert!(record("completed").is_success());
        assert!(record("ok").is_success());
        assert!(record("success").is_success());
        assert!(!record("error").is_success());
        assert!(!record("aborted").is_success());
        assert!(!record("").is_success());
    }

    #[test]
    fn test_parse_event_log_bare_list() {
        let events = parse_event_log(Some(
            r#"[{"cycle":0,"time":0},{"cycle":0,"time":100}]"#,
        ));
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].cycle, 0);
        assert_eq!(events[1].time, 100.0);
    }

    #[test]
    fn test_parse_event_log_envelope() {
        let events = parse_event_log(Some(
            r#"{"events":[{"cycle":1,"time":5}],"sensors":{"temp":[21.5]}}"#,
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cycle, 1);
    }

    #[test]
    fn test_parse_event_log_missing_fields_default() {
        let events = parse_event_log(Some(r#"[{"time":10},{"cycle":2},{}]"#));
        assert_eq!(events[0].cycle, 0);
        assert_eq!(events[1].time, 0.0);
        assert_eq!(events[2], LogEvent { cycle: 0, time: 0.0 });
    }

    #[test]
    fn test_parse_event_log_malformed_is_empty() {
        assert!(parse_event_log(Some("not json")).is_empty());
        assert!(parse_event_log(Some("42")).is_empty());
        assert!(parse_event_log(Some(r#"{"no_events_key":true}"#)).is_empty());
        assert!(parse_event_log(None).is_empty());
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2026-01-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-01T08:00:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_naive_as_utc() {
        assert!(parse_timestamp("2026-01-01T10:00:00").is_some());
        assert!(parse_timestamp("2026-01-01 10:00:00.250").is_some());
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
