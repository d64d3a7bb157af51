//! Cycle-time extraction from run event logs
//!
//! A cycle time is the elapsed time between the first and last logged
//! event sharing a cycle index within one run. The per-run metric used
//! across all analyses is the arithmetic mean of those spans.

use std::collections::BTreeMap;

use trueno::Vector;

use crate::record::{parse_event_log, LogEvent, MetricPoint, RunRecord};

/// Per-cycle spans (`max(time) − min(time)`) for every cycle index with
/// at least two events, in first-appearance order of the cycle index.
///
/// A cycle with a single event brackets nothing and contributes no
/// sample.
pub fn cycle_times(events: &[LogEvent]) -> Vec<f64> {
    // (cycle, min, max, count); linear scan keeps first-appearance order
    let mut groups: Vec<(u32, f64, f64, usize)> = Vec::new();

    for event in events {
        match groups.iter_mut().find(|g| g.0 == event.cycle) {
            Some(g) => {
                g.1 = g.1.min(event.time);
                g.2 = g.2.max(event.time);
                g.3 += 1;
            }
            None => groups.push((event.cycle, event.time, event.time, 1)),
        }
    }

    groups
        .iter()
        .filter(|g| g.3 > 1)
        .map(|g| g.2 - g.1)
        .collect()
}

/// Arithmetic mean of the per-cycle spans, or 0.0 when no cycle has two
/// bracketing events.
pub fn average_cycle_time(events: &[LogEvent]) -> f64 {
    let times = cycle_times(events);
    if times.is_empty() {
        return 0.0;
    }

    let samples: Vec<f32> = times.iter().map(|&t| t as f32).collect();
    Vector::from_slice(&samples).mean().unwrap_or(0.0) as f64
}

/// The cycle-time distribution of one run (parses the raw log payload).
pub fn run_cycle_times(record: &RunRecord) -> Vec<f64> {
    cycle_times(&parse_event_log(record.log.as_deref()))
}

/// Derive the timeline data point for one run.
pub fn metric_point(record: &RunRecord) -> MetricPoint {
    let events = parse_event_log(record.log.as_deref());
    MetricPoint {
        timestamp: record.start_time,
        run_id: record.id,
        sequence: record.sequence_name.clone(),
        avg_cycle_time: average_cycle_time(&events),
        duration_secs: record.duration_secs,
        cycles: record.cycles,
        success: record.is_success(),
    }
}

/// Build the full metric timeline for a record set, sorted by timestamp.
pub fn extract_timeline(records: &[RunRecord]) -> Vec<MetricPoint> {
    let mut timeline: Vec<MetricPoint> = records.iter().map(metric_point).collect();
    timeline.sort_by_key(|p| p.timestamp);
    timeline
}

/// Group timeline points by sequence name, preserving time order within
/// each sequence.
pub fn group_by_sequence(timeline: &[MetricPoint]) -> BTreeMap<String, Vec<MetricPoint>> {
    let mut by_sequence: BTreeMap<String, Vec<MetricPoint>> = BTreeMap::new();
    for point in timeline {
        by_sequence
            .entry(point.sequence.clone())
            .or_default()
            .push(point.clone());
    }
    by_sequence
}
