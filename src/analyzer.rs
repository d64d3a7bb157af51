//! Long-term analysis over a windowed record set
//!
//! Composes the independent analytics (timeline extraction, trend
//! estimation, degradation detection, daily roll-ups) into one report.
//! The caller controls the window by what it queries; every component
//! here is a pure function over the supplied records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cycle_time::{extract_timeline, group_by_sequence};
use crate::degradation::{detect_degradation, DegradationAlert, DegradationConfig};
use crate::record::{MetricPoint, RunRecord};
use crate::summary::{daily_summaries, DailySummary};
use crate::trend::{estimate_trend, TrendConfig, TrendOutcome};

/// The composed long-term analysis.
#[derive(Debug, Clone, Serialize)]
pub struct LongTermReport {
    /// Window label (the caller's query window)
    pub period_days: u32,
    pub total_runs: usize,
    pub timeline: Vec<MetricPoint>,
    pub trends: TrendOutcome,
    pub degradation_alerts: Vec<DegradationAlert>,
    pub sequence_performance: BTreeMap<String, Vec<MetricPoint>>,
    pub daily_summary: Vec<DailySummary>,
}

/// Discriminated analysis outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LongTermOutcome {
    Success(LongTermReport),
    NoData { message: String, period_days: u32 },
}

impl LongTermOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            LongTermOutcome::Success(report) => {
                let mut out = format!(
                    "=== Long-term analysis: {} runs over {} days ===\n\n",
                    report.total_runs, report.period_days
                );
                out.push_str(&report.trends.to_report_string());

                if report.degradation_alerts.is_empty() {
                    out.push_str("\nNo degradation alerts.\n");
                } else {
                    out.push_str(&format!(
                        "\nDegradation alerts ({}):\n",
                        report.degradation_alerts.len()
                    ));
                    for alert in &report.degradation_alerts {
                        out.push_str(&format!("  - {}\n", alert.message));
                    }
                }

                out.push_str("\nDaily summary:\n");
                for day in &report.daily_summary {
                    out.push_str(&format!(
                        "  {}  {:>3} runs, {:>5.1}% success, avg duration {:.1}s\n",
                        day.date, day.total_runs, day.success_rate, day.avg_duration
                    ));
                }
                out
            }
            LongTermOutcome::NoData { message, .. } => {
                format!("⚠️  {}\n", message)
            }
        }
    }
}

/// Run the full long-term analysis over a record set.
///
/// `period_days` only labels the report; the window itself is whatever
/// the caller queried. An empty record set yields
/// [`LongTermOutcome::NoData`].
pub fn analyze_longterm_trends(
    records: &[RunRecord],
    period_days: u32,
    trend_config: &TrendConfig,
    degradation_config: &DegradationConfig,
) -> LongTermOutcome {
    if records.is_empty() {
        return LongTermOutcome::NoData {
            message: format!("no runs found in the last {} days", period_days),
            period_days,
        };
    }

    let timeline = extract_timeline(records);
    let by_sequence = group_by_sequence(&timeline);

    let metrics: Vec<f64> = timeline.iter().map(|p| p.avg_cycle_time).collect();
    let trends = estimate_trend(&metrics, trend_config);
    let degradation_alerts = detect_degradation(&by_sequence, degradation_config);
    let daily_summary = daily_summaries(records);

    LongTermOutcome::Success(LongTermReport {
        period_days,
        total_runs: records.len(),
        timeline,
        trends,
        degradation_alerts,
        sequence_performance: by_sequence,
        daily_summary,
    })
}
