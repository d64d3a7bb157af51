//! Per-sequence performance degradation detection
//!
//! Splits each sequence's metric history into early and late halves and
//! alerts when the mean cycle time shifted by more than the configured
//! band. Sequences with too little history are silently skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trueno::Vector;

use crate::record::MetricPoint;

/// Detection thresholds; the 10% band and 25% high-severity cut are
/// fixed design constants carried as defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationConfig {
    /// Minimum points per sequence before a split is attempted
    pub min_points: usize,
    /// |change| in percent that triggers an alert
    pub alert_band_percent: f64,
    /// Degradation percent beyond which the alert is high severity
    pub high_severity_percent: f64,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            min_points: 5,
            alert_band_percent: 10.0,
            high_severity_percent: 25.0,
        }
    }
}

impl DegradationConfig {
    /// Validate threshold sanity.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_points < 2 {
            return Err(format!(
                "min_points must be >= 2 to form two halves, got {}",
                self.min_points
            ));
        }
        if self.alert_band_percent <= 0.0 {
            return Err(format!(
                "alert_band_percent must be positive, got {}",
                self.alert_band_percent
            ));
        }
        if self.high_severity_percent <= self.alert_band_percent {
            return Err(format!(
                "high_severity_percent ({}) must exceed alert_band_percent ({})",
                self.high_severity_percent, self.alert_band_percent
            ));
        }
        Ok(())
    }
}

/// Direction of the detected shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Degradation,
    Improvement,
}

/// Alert severity; improvements are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    High,
    Moderate,
    Info,
}

/// One early-vs-late shift that crossed the alert band.
#[derive(Debug, Clone, Serialize)]
pub struct DegradationAlert {
    pub sequence: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub change_percent: f64,
    pub early_avg: f64,
    pub late_avg: f64,
    pub message: String,
}

/// Detect degradation (or improvement) across all sequences.
///
/// Per sequence, in time order: fewer than `min_points` points → the
/// sequence is skipped without an alert. The list splits at floor(n/2);
/// non-positive metrics are dropped from each half, and a half left
/// empty also skips the sequence. Alerts come back ordered by sequence
/// name.
pub fn detect_degradation(
    by_sequence: &BTreeMap<String, Vec<MetricPoint>>,
    config: &DegradationConfig,
) -> Vec<DegradationAlert> {
    let mut alerts = Vec::new();

    for (sequence, points) in by_sequence {
        if points.len() < config.min_points {
            continue;
        }

        let split = points.len() / 2;
        let early = positive_metrics(&points[..split]);
        let late = positive_metrics(&points[split..]);

        if early.is_empty() || late.is_empty() {
            continue;
        }

        let early_avg = Vector::from_slice(&early).mean().unwrap_or(0.0) as f64;
        let late_avg = Vector::from_slice(&late).mean().unwrap_or(0.0) as f64;

        let change_percent = if early_avg > 0.0 {
            (late_avg - early_avg) / early_avg * 100.0
        } else {
            0.0
        };

        if change_percent > config.alert_band_percent {
            let severity = if change_percent > config.high_severity_percent {
                AlertSeverity::High
            } else {
                AlertSeverity::Moderate
            };
            alerts.push(DegradationAlert {
                sequence: sequence.clone(),
                kind: AlertKind::Degradation,
                severity,
                change_percent,
                early_avg,
                late_avg,
                message: format!(
                    "{}: performance degraded by {:.1}%",
                    sequence, change_percent
                ),
            });
        } else if change_percent < -config.alert_band_percent {
            alerts.push(DegradationAlert {
                sequence: sequence.clone(),
                kind: AlertKind::Improvement,
                severity: AlertSeverity::Info,
                change_percent,
                early_avg,
                late_avg,
                message: format!(
                    "{}: performance improved by {:.1}%",
                    sequence,
                    change_percent.abs()
                ),
            });
        }
    }

    alerts
}

fn positive_metrics(points: &[MetricPoint]) -> Vec<f32> {
    points
        .iter()
        .map(|p| p.avg_cycle_time)
        .filter(|&v| v > 0.0)
        .map(|v| v as f32)
        .collect()
}
