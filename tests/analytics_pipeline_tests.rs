//! End-to-end analytics over in-memory run records
//!
//! Exercises the full pipeline the way a caller would: build records,
//! extract the timeline, and run every analysis against it.

use tendencia::analyzer::{analyze_longterm_trends, LongTermOutcome};
use tendencia::correlation::{analyze_correlations, CorrelationConfig, CorrelationOutcome};
use tendencia::cycle_time::{average_cycle_time, extract_timeline, group_by_sequence, metric_point};
use tendencia::degradation::{detect_degradation, AlertKind, AlertSeverity, DegradationConfig};
use tendencia::forecast::{forecast_performance, ForecastConfig, ForecastOutcome, PerformanceTrend};
use tendencia::record::{parse_event_log, RunRecord};
use tendencia::risk::{assess_failure_risk, FailureTrend, RiskConfig, RiskLevel, RiskOutcome};
use tendencia::summary::{compare_runs, ComparisonOutcome};
use tendencia::trend::{estimate_trend, TrendConfig, TrendDirection, TrendOutcome};

fn ts(day: u32) -> chrono::DateTime<chrono::Utc> {
    tendencia::record::parse_timestamp(&format!("2026-06-{:02}T12:00:00", day)).unwrap()
}

/// Log with one cycle per span, each spanning the given milliseconds.
fn span_log(spans: &[f64]) -> String {
    let events: Vec<String> = spans
        .iter()
        .enumerate()
        .flat_map(|(cycle, &span)| {
            vec![
                format!(r#"{{"cycle":{},"time":0}}"#, cycle),
                format!(r#"{{"cycle":{},"time":{}}}"#, cycle, span),
            ]
        })
        .collect();
    format!("[{}]", events.join(","))
}

fn run(id: i64, sequence: &str, day: u32, status: &str, spans: &[f64]) -> RunRecord {
    RunRecord {
        id,
        name: format!("run-{id}"),
        sequence_name: sequence.to_string(),
        start_time: ts(day),
        duration_secs: Some(30.0 + id as f64),
        cycles: Some(spans.len() as u32),
        status: status.to_string(),
        log: Some(span_log(spans)),
    }
}

#[test]
fn test_reference_event_log_yields_125() {
    let events = parse_event_log(Some(
        r#"[{"cycle":0,"time":0},{"cycle":0,"time":100},{"cycle":1,"time":100},{"cycle":1,"time":250}]"#,
    ));
    assert_eq!(average_cycle_time(&events), 125.0);
}

#[test]
fn test_trend_r_squared_bounds_over_extracted_series() {
    let records: Vec<RunRecord> = (0..8)
        .map(|i| run(i as i64, "seq", i + 1, "ok", &[100.0 + 7.0 * i as f64]))
        .collect();
    let timeline = extract_timeline(&records);
    let series: Vec<f64> = timeline.iter().map(|p| p.avg_cycle_time).collect();

    match estimate_trend(&series, &TrendConfig::default()) {
        TrendOutcome::Calculated(report) => {
            assert!((0.0..=1.0).contains(&report.r_squared));
            assert_eq!(report.trend_direction, TrendDirection::Degrading);
        }
        other => panic!("expected Calculated, got {:?}", other),
    }
}

#[test]
fn test_trend_constant_series_r_squared_zero() {
    let series = vec![42.0; 6];
    match estimate_trend(&series, &TrendConfig::default()) {
        TrendOutcome::Calculated(report) => {
            assert_eq!(report.r_squared, 0.0);
            assert_eq!(report.trend_direction, TrendDirection::Stable);
        }
        other => panic!("expected Calculated, got {:?}", other),
    }
}

#[test]
fn test_degradation_five_point_split_alerts_high() {
    // early [10, 10], late [15, 15, 15] → +50% → degradation, high
    let records: Vec<RunRecord> = [10.0, 10.0, 15.0, 15.0, 15.0]
        .iter()
        .enumerate()
        .map(|(i, &span)| run(i as i64, "seq", i as u32 + 1, "ok", &[span]))
        .collect();
    let by_sequence = group_by_sequence(&extract_timeline(&records));
    let alerts = detect_degradation(&by_sequence, &DegradationConfig::default());

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Degradation);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert!((alerts[0].change_percent - 50.0).abs() < 1e-3);
}

#[test]
fn test_forecast_increasing_series_reads_degrading() {
    let samples: Vec<(chrono::DateTime<chrono::Utc>, f64)> = (0..5)
        .map(|i| (ts(i + 1), 100.0 + 10.0 * i as f64))
        .collect();
    match forecast_performance("seq", &samples, 7, &ForecastConfig::default()) {
        ForecastOutcome::Success(report) => {
            assert_eq!(
                report.current_performance.trend,
                PerformanceTrend::Degrading
            );
            assert!(report.degradation_forecast.percent_change > 2.0);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn test_risk_recent_failures_capped_critical() {
    // newest first: 10 errors, then 10 successes
    let statuses: Vec<String> = std::iter::repeat("error".to_string())
        .take(10)
        .chain(std::iter::repeat("ok".to_string()).take(10))
        .collect();

    match assess_failure_risk("seq", &statuses, &RiskConfig::default()) {
        RiskOutcome::Success(report) => {
            assert!((report.risk_assessment.success_rate - 50.0).abs() < 1e-9);
            assert_eq!(report.statistics.trend, FailureTrend::Increasing);
            assert_eq!(report.risk_assessment.risk_level, RiskLevel::Critical);
            assert_eq!(report.risk_assessment.risk_score, 100);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn test_correlation_zero_variance_defined_behavior() {
    let records: Vec<RunRecord> = (1..=3)
        .map(|i| run(i, "seq", i as u32, "ok", &[20.0, 20.0]))
        .collect();
    match analyze_correlations(&records, None, &CorrelationConfig::default()) {
        CorrelationOutcome::Success(report) => {
            assert!(report.strong_correlations.is_empty());
            assert_eq!(report.correlation_matrix[0][0], 1.0);
            assert!(report.correlation_matrix[0][1].is_nan());
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn test_full_analysis_over_mixed_history() {
    let mut records = Vec::new();
    // burn-in drifts upward; selftest stays flat with occasional failures
    for i in 0..8_u32 {
        records.push(run(
            i as i64,
            "burn-in",
            i + 1,
            "ok",
            &[100.0 + 15.0 * i as f64, 105.0 + 15.0 * i as f64],
        ));
        let status = if i == 5 { "error" } else { "ok" };
        records.push(run(100 + i as i64, "selftest", i + 1, status, &[50.0, 51.0]));
    }

    let outcome = analyze_longterm_trends(
        &records,
        30,
        &TrendConfig::default(),
        &DegradationConfig::default(),
    );
    let report = match outcome {
        LongTermOutcome::Success(report) => report,
        other => panic!("expected Success, got {:?}", other),
    };

    assert_eq!(report.total_runs, 16);
    assert_eq!(report.sequence_performance.len(), 2);

    // burn-in's drift dominates the combined series and its own split
    let burn_in_alerts: Vec<_> = report
        .degradation_alerts
        .iter()
        .filter(|a| a.sequence == "burn-in")
        .collect();
    assert_eq!(burn_in_alerts.len(), 1);
    assert_eq!(burn_in_alerts[0].kind, AlertKind::Degradation);

    // selftest is flat: no alert
    assert!(report
        .degradation_alerts
        .iter()
        .all(|a| a.sequence != "selftest"));

    // one failed run shows up in the daily roll-up
    let failures: usize = report
        .daily_summary
        .iter()
        .map(|d| d.total_runs - d.successful_runs)
        .sum();
    assert_eq!(failures, 1);
}

#[test]
fn test_comparison_spread_over_records() {
    let records = vec![
        run(1, "seq", 1, "ok", &[100.0]),
        run(2, "seq", 2, "ok", &[150.0]),
    ];
    match compare_runs(&records) {
        ComparisonOutcome::Success(report) => {
            assert_eq!(report.summary.best_run.as_ref().unwrap().run_id, 1);
            assert_eq!(report.summary.worst_run.as_ref().unwrap().run_id, 2);
            assert!((report.summary.performance_difference_percent - 50.0).abs() < 1e-6);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn test_outcomes_serialize_with_status_tags() {
    let trend = estimate_trend(&[], &TrendConfig::default());
    assert_eq!(
        serde_json::to_value(&trend).unwrap()["status"],
        "insufficient_data"
    );

    let analysis = analyze_longterm_trends(
        &[],
        30,
        &TrendConfig::default(),
        &DegradationConfig::default(),
    );
    assert_eq!(serde_json::to_value(&analysis).unwrap()["status"], "no_data");

    let records: Vec<RunRecord> = (0..6)
        .map(|i| run(i as i64, "seq", i as u32 + 1, "ok", &[100.0 + i as f64]))
        .collect();
    let analysis = analyze_longterm_trends(
        &records,
        30,
        &TrendConfig::default(),
        &DegradationConfig::default(),
    );
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["trends"]["status"], "calculated");
    assert_eq!(json["total_runs"], 6);
}

#[test]
fn test_metric_point_failure_status_carried() {
    let record = run(1, "seq", 1, "aborted", &[100.0]);
    let point = metric_point(&record);
    assert!(!point.success);
    assert_eq!(point.avg_cycle_time, 100.0);
}
