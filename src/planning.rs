//! Maintenance-window estimation and capacity forecasting
//!
//! Maintenance estimates project each sequence's 30-day degradation
//! forecast onto a "days until the maintenance threshold is reached"
//! figure. Capacity forecasting projects run volume and storage needs
//! from the daily run counts of the analyzed window.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trueno::Vector;

use crate::cycle_time::metric_point;
use crate::forecast::{forecast_performance, ForecastConfig, ForecastOutcome, MetricSample};
use crate::record::RunRecord;

/// Planning thresholds and sizing assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Degradation percent at which maintenance is due
    pub maintenance_threshold_percent: f64,
    /// Horizon used for the underlying per-sequence forecasts
    pub forecast_horizon_days: u32,
    /// Estimates below this many days are urgent
    pub urgent_window_days: u32,
    /// Storage footprint assumed per run
    pub storage_per_run_kb: f64,
    /// Minimum runs in the window before capacity is projected
    pub min_runs: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            maintenance_threshold_percent: 20.0,
            forecast_horizon_days: 30,
            urgent_window_days: 14,
            storage_per_run_kb: 50.0,
            min_runs: 5,
        }
    }
}

impl PlanningConfig {
    /// Validate threshold sanity.
    pub fn validate(&self) -> Result<(), String> {
        if self.maintenance_threshold_percent <= 0.0 {
            return Err(format!(
                "maintenance_threshold_percent must be positive, got {}",
                self.maintenance_threshold_percent
            ));
        }
        if self.forecast_horizon_days == 0 {
            return Err("forecast_horizon_days must be positive".to_string());
        }
        if self.storage_per_run_kb < 0.0 {
            return Err(format!(
                "storage_per_run_kb must be non-negative, got {}",
                self.storage_per_run_kb
            ));
        }
        Ok(())
    }
}

/// How soon a sequence needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    High,
    Moderate,
    Low,
}

/// Maintenance outlook for one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceEstimate {
    pub sequence: String,
    /// Projected degradation over the forecast horizon
    pub current_degradation_percent: f64,
    /// Days until the threshold is reached; `None` when no degradation
    /// is projected
    pub days_to_maintenance: Option<u32>,
    pub urgency: Urgency,
    pub threshold_percent: f64,
}

/// Discriminated maintenance outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MaintenanceOutcome {
    Success {
        threshold_degradation: f64,
        sequences_analyzed: usize,
        maintenance_schedule: Vec<MaintenanceEstimate>,
    },
    NoData {
        message: String,
    },
}

impl MaintenanceOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            MaintenanceOutcome::Success {
                threshold_degradation,
                maintenance_schedule,
                ..
            } => {
                let mut out = format!(
                    "🔧 Maintenance schedule (threshold {:.0}% degradation)\n",
                    threshold_degradation
                );
                for estimate in maintenance_schedule {
                    let due = match estimate.days_to_maintenance {
                        Some(0) => "due now".to_string(),
                        Some(days) => format!("in ~{} days", days),
                        None => "not projected".to_string(),
                    };
                    out.push_str(&format!(
                        "  [{:?}] {}: {:+.1}% projected, {}\n",
                        estimate.urgency,
                        estimate.sequence,
                        estimate.current_degradation_percent,
                        due
                    ));
                }
                out
            }
            MaintenanceOutcome::NoData { message } => {
                format!("⚠️  {}\n", message)
            }
        }
    }
}

/// Estimate when each sequence will need maintenance.
///
/// Sequences without a successful forecast (too little data, singular
/// model) are omitted. Estimates come back sorted soonest first, with
/// unprojected sequences last.
pub fn estimate_maintenance_windows(
    records: &[RunRecord],
    forecast_config: &ForecastConfig,
    config: &PlanningConfig,
) -> MaintenanceOutcome {
    let mut by_sequence: BTreeMap<String, Vec<MetricSample>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_success()) {
        let point = metric_point(record);
        if point.avg_cycle_time > 0.0 {
            by_sequence
                .entry(record.sequence_name.clone())
                .or_default()
                .push((point.timestamp, point.avg_cycle_time));
        }
    }

    if by_sequence.is_empty() {
        return MaintenanceOutcome::NoData {
            message: "no successful runs with cycle data found".to_string(),
        };
    }

    let threshold = config.maintenance_threshold_percent;
    let horizon = config.forecast_horizon_days;
    let mut estimates = Vec::new();

    for (sequence, samples) in &by_sequence {
        let outcome = forecast_performance(sequence, samples, horizon, forecast_config);
        let ForecastOutcome::Success(report) = outcome else {
            continue;
        };

        let degradation = report.degradation_forecast.percent_change;
        let (days_to_maintenance, urgency) = if degradation >= threshold {
            (Some(0), Urgency::Critical)
        } else if degradation > 0.0 {
            let days_per_percent = horizon as f64 / degradation;
            let days = (days_per_percent * threshold) as u32;
            let urgency = if days < config.urgent_window_days {
                Urgency::High
            } else {
                Urgency::Moderate
            };
            (Some(days), urgency)
        } else {
            (None, Urgency::Low)
        };

        estimates.push(MaintenanceEstimate {
            sequence: sequence.clone(),
            current_degradation_percent: degradation,
            days_to_maintenance,
            urgency,
            threshold_percent: threshold,
        });
    }

    // soonest first, unprojected sequences last
    estimates.sort_by_key(|e| e.days_to_maintenance.unwrap_or(u32::MAX));

    MaintenanceOutcome::Success {
        threshold_degradation: threshold,
        sequences_analyzed: estimates.len(),
        maintenance_schedule: estimates,
    }
}

/// Observed run volume over the analyzed window.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUsage {
    pub avg_daily_runs: f64,
    pub std_daily_runs: f64,
    pub total_runs_analyzed: usize,
}

/// Projected volume and storage for the forecast window.
#[derive(Debug, Clone, Serialize)]
pub struct UsageProjection {
    pub estimated_total_runs: u64,
    pub estimated_storage_mb: f64,
    pub estimated_daily_runs: f64,
}

/// Discriminated capacity outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapacityOutcome {
    Success {
        period_analyzed_days: u32,
        forecast_days: u32,
        current_metrics: CurrentUsage,
        predictions: UsageProjection,
    },
    InsufficientData {
        reason: String,
    },
}

impl CapacityOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            CapacityOutcome::Success {
                forecast_days,
                current_metrics,
                predictions,
                ..
            } => format!(
                "📦 Capacity forecast for the next {} days\n\
                 Observed: {:.1} runs/day (σ {:.1}) over {} runs\n\
                 Projected: {} runs, ~{:.1} MB storage\n",
                forecast_days,
                current_metrics.avg_daily_runs,
                current_metrics.std_daily_runs,
                current_metrics.total_runs_analyzed,
                predictions.estimated_total_runs,
                predictions.estimated_storage_mb
            ),
            CapacityOutcome::InsufficientData { reason } => {
                format!("⚠️  Insufficient data for capacity forecast: {}\n", reason)
            }
        }
    }
}

/// Project run volume and storage from a window of run records.
///
/// `period_days` labels the analyzed window (the caller controls the
/// actual query window); fewer than `min_runs` records yields
/// [`CapacityOutcome::InsufficientData`].
pub fn forecast_capacity(
    records: &[RunRecord],
    period_days: u32,
    days_ahead: u32,
    config: &PlanningConfig,
) -> CapacityOutcome {
    if records.len() < config.min_runs {
        return CapacityOutcome::InsufficientData {
            reason: format!(
                "need at least {} runs in the last {} days, got {}",
                config.min_runs,
                period_days,
                records.len()
            ),
        };
    }

    let mut daily_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        *daily_counts.entry(record.start_time.date_naive()).or_default() += 1;
    }

    let counts: Vec<f32> = daily_counts.values().map(|&c| c as f32).collect();
    let vector = Vector::from_slice(&counts);
    let avg_daily_runs = vector.mean().unwrap_or(0.0) as f64;
    let std_daily_runs = vector.stddev().unwrap_or(0.0) as f64;

    let estimated_total_runs = (avg_daily_runs * days_ahead as f64) as u64;
    let estimated_storage_mb =
        estimated_total_runs as f64 * config.storage_per_run_kb / 1024.0;

    CapacityOutcome::Success {
        period_analyzed_days: period_days,
        forecast_days: days_ahead,
        current_metrics: CurrentUsage {
            avg_daily_runs,
            std_daily_runs,
            total_runs_analyzed: records.len(),
        },
        predictions: UsageProjection {
            estimated_total_runs,
            estimated_storage_mb,
            estimated_daily_runs: avg_daily_runs,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;

    /// Log with one cycle spanning `span` milliseconds.
    fn span_log(span: f64) -> String {
        format!(r#"[{{"cycle":0,"time":0}},{{"cycle":0,"time":{}}}]"#, span)
    }

    fn record(id: i64, sequence: &str, day: u32, span: f64) -> RunRecord {
        RunRecord {
            id,
            name: format!("run-{id}"),
            sequence_name: sequence.to_string(),
            start_time: parse_timestamp(&format!("2026-04-{:02}T10:00:00", day)).unwrap(),
            duration_secs: Some(10.0),
            cycles: Some(1),
            status: "ok".to_string(),
            log: Some(span_log(span)),
        }
    }

    #[test]
    fn test_maintenance_no_data() {
        let outcome = estimate_maintenance_windows(
            &[],
            &ForecastConfig::default(),
            &PlanningConfig::default(),
        );
        assert!(matches!(outcome, MaintenanceOutcome::NoData { .. }));
    }

    #[test]
    fn test_maintenance_degrading_sequence_is_scheduled() {
        // Cycle time climbing ~10%/day → 30-day projection far past 20%
        let records: Vec<RunRecord> = (0..6)
            .map(|i| record(i as i64, "drifting", i + 1, 100.0 + 10.0 * i as f64))
            .collect();
        let outcome = estimate_maintenance_windows(
            &records,
            &ForecastConfig::default(),
            &PlanningConfig::default(),
        );
        match outcome {
            MaintenanceOutcome::Success {
                maintenance_schedule,
                sequences_analyzed,
                ..
            } => {
                assert_eq!(sequences_analyzed, 1);
                let estimate = &maintenance_schedule[0];
                assert_eq!(estimate.days_to_maintenance, Some(0));
                assert_eq!(estimate.urgency, Urgency::Critical);
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_maintenance_stable_sequence_low_urgency() {
        let records: Vec<RunRecord> = (0..6)
            .map(|i| record(i as i64, "steady", i + 1, 100.0))
            .collect();
        let outcome = estimate_maintenance_windows(
            &records,
            &ForecastConfig::default(),
            &PlanningConfig::default(),
        );
        match outcome {
            MaintenanceOutcome::Success {
                maintenance_schedule,
                ..
            } => {
                assert_eq!(maintenance_schedule[0].days_to_maintenance, None);
                assert_eq!(maintenance_schedule[0].urgency, Urgency::Low);
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_maintenance_sorted_soonest_first() {
        let mut records: Vec<RunRecord> = (0..6)
            .map(|i| record(i as i64, "steady", i + 1, 100.0))
            .collect();
        records.extend(
            (0..6).map(|i| record(100 + i as i64, "drifting", i + 1, 100.0 + 10.0 * i as f64)),
        );
        let outcome = estimate_maintenance_windows(
            &records,
            &ForecastConfig::default(),
            &PlanningConfig::default(),
        );
        match outcome {
            MaintenanceOutcome::Success {
                maintenance_schedule,
                ..
            } => {
                assert_eq!(maintenance_schedule[0].sequence, "drifting");
                assert_eq!(maintenance_schedule[1].sequence, "steady");
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity_insufficient_data() {
        let records: Vec<RunRecord> = (0..3).map(|i| record(i, "seq", 1, 100.0)).collect();
        let outcome =
            forecast_capacity(&records, 30, 30, &PlanningConfig::default());
        assert!(matches!(outcome, CapacityOutcome::InsufficientData { .. }));
    }

    #[test]
    fn test_capacity_projection_scales_with_horizon() {
        // 2 runs/day over 3 days
        let records: Vec<RunRecord> = (0..6)
            .map(|i| record(i, "seq", 1 + (i / 2) as u32, 100.0))
            .collect();
        let outcome = forecast_capacity(&records, 30, 10, &PlanningConfig::default());
        match outcome {
            CapacityOutcome::Success {
                current_metrics,
                predictions,
                ..
            } => {
                assert!((current_metrics.avg_daily_runs - 2.0).abs() < 1e-6);
                assert_eq!(predictions.estimated_total_runs, 20);
                // 20 runs × 50 KB ≈ 0.98 MB
                assert!((predictions.estimated_storage_mb - 20.0 * 50.0 / 1024.0).abs() < 1e-6);
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(PlanningConfig::default().validate().is_ok());
        let bad = PlanningConfig {
            maintenance_threshold_percent: 0.0,
            ..PlanningConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
