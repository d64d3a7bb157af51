//! Long-term cycle-time trend estimation
//!
//! Fits a degree-1 polynomial over a metric series (x = sample index)
//! and classifies the relative slope into a direction and severity.
//! Thresholds are configuration-driven with source-compatible defaults.

use serde::{Deserialize, Serialize};
use trueno::Vector;

use crate::fit;

/// Thresholds for trend classification, in percent of the series mean
/// per unit index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// |relative slope| below this is a stable trend
    pub stable_band_percent: f64,
    /// Relative slope beyond this is a moderate change
    pub moderate_threshold_percent: f64,
    /// Relative slope beyond this is a critical (or, improving,
    /// significant) change
    pub critical_threshold_percent: f64,
    /// R² reported when the series has no variance
    pub degenerate_r_squared: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            stable_band_percent: 1.0,
            moderate_threshold_percent: 2.0,
            critical_threshold_percent: 5.0,
            degenerate_r_squared: fit::DEGENERATE_R_SQUARED,
        }
    }
}

impl TrendConfig {
    /// Validate threshold ordering.
    pub fn validate(&self) -> Result<(), String> {
        if self.stable_band_percent <= 0.0 {
            return Err(format!(
                "stable_band_percent must be positive, got {}",
                self.stable_band_percent
            ));
        }
        if self.moderate_threshold_percent <= self.stable_band_percent {
            return Err(format!(
                "moderate_threshold_percent ({}) must exceed stable_band_percent ({})",
                self.moderate_threshold_percent, self.stable_band_percent
            ));
        }
        if self.critical_threshold_percent <= self.moderate_threshold_percent {
            return Err(format!(
                "critical_threshold_percent ({}) must exceed moderate_threshold_percent ({})",
                self.critical_threshold_percent, self.moderate_threshold_percent
            ));
        }
        Ok(())
    }
}

/// Which way the metric is moving over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Stable,
    Degrading,
    Improving,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Degrading => write!(f, "degrading"),
            TrendDirection::Improving => write!(f, "improving"),
        }
    }
}

/// How pronounced the movement is.
///
/// `Critical` marks a steep degradation; `Significant` the improving
/// counterpart beyond the same threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSeverity {
    None,
    Minor,
    Moderate,
    Critical,
    Significant,
}

impl std::fmt::Display for TrendSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendSeverity::None => write!(f, "none"),
            TrendSeverity::Minor => write!(f, "minor"),
            TrendSeverity::Moderate => write!(f, "moderate"),
            TrendSeverity::Critical => write!(f, "critical"),
            TrendSeverity::Significant => write!(f, "significant"),
        }
    }
}

/// Result of a trend fit over one metric series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    /// Fitted slope in metric units per sample index
    pub slope: f64,
    /// Slope as percent of the series mean per sample index
    pub relative_slope_percent: f64,
    /// Goodness of fit, 0..1 (degenerate value for constant series)
    pub r_squared: f64,
    pub trend_direction: TrendDirection,
    pub trend_severity: TrendSeverity,
    /// Mean of the retained (positive) samples
    pub avg_cycle_time: f64,
    /// Population standard deviation of the retained samples
    pub std_cycle_time: f64,
}

/// Discriminated trend outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendOutcome {
    Calculated(TrendReport),
    InsufficientData { reason: String },
}

impl TrendOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            TrendOutcome::Calculated(report) => {
                let arrow = match report.trend_direction {
                    TrendDirection::Stable => "→",
                    TrendDirection::Degrading => "📈",
                    TrendDirection::Improving => "📉",
                };
                format!(
                    "{} Trend: {} ({})\n\
                     Slope:          {:+.4} per run ({:+.2}% of mean)\n\
                     R²:             {:.3}\n\
                     Mean cycle time: {:.2} ms (σ {:.2})\n",
                    arrow,
                    report.trend_direction,
                    report.trend_severity,
                    report.slope,
                    report.relative_slope_percent,
                    report.r_squared,
                    report.avg_cycle_time,
                    report.std_cycle_time
                )
            }
            TrendOutcome::InsufficientData { reason } => {
                format!("⚠️  Insufficient data for trend estimation: {}\n", reason)
            }
        }
    }
}

/// Estimate the trend of a metric series.
///
/// Non-positive samples are dropped first (a zero metric means the run's
/// log carried no usable cycle data); x is the 0-based index over the
/// retained samples, not the raw timestamp.
///
/// Fewer than 2 retained samples yields
/// [`TrendOutcome::InsufficientData`], never an error.
pub fn estimate_trend(series: &[f64], config: &TrendConfig) -> TrendOutcome {
    let retained: Vec<f64> = series.iter().copied().filter(|&v| v > 0.0).collect();

    if retained.len() < 2 {
        return TrendOutcome::InsufficientData {
            reason: format!(
                "need at least 2 positive samples, got {}",
                retained.len()
            ),
        };
    }

    let x: Vec<f64> = (0..retained.len()).map(|i| i as f64).collect();
    let poly = match fit::fit_polynomial(&x, &retained, 1) {
        Ok(poly) => poly,
        // Index positions always have spread; treat a failed solve as
        // an unusable series rather than aborting the analysis.
        Err(e) => {
            return TrendOutcome::InsufficientData {
                reason: e.to_string(),
            }
        }
    };

    let slope = poly.linear_term();
    let predicted: Vec<f64> = x.iter().map(|&v| poly.eval(v)).collect();
    let r2 = fit::r_squared(&retained, &predicted, config.degenerate_r_squared);

    let samples: Vec<f32> = retained.iter().map(|&v| v as f32).collect();
    let vector = Vector::from_slice(&samples);
    let mean = vector.mean().unwrap_or(0.0) as f64;
    let std = vector.stddev().unwrap_or(0.0) as f64;

    let relative_slope = if mean > 0.0 { slope / mean * 100.0 } else { 0.0 };
    let (direction, severity) = classify_trend(relative_slope, config);

    TrendOutcome::Calculated(TrendReport {
        slope,
        relative_slope_percent: relative_slope,
        r_squared: r2,
        trend_direction: direction,
        trend_severity: severity,
        avg_cycle_time: mean,
        std_cycle_time: std,
    })
}

/// Map a relative slope onto direction and severity.
fn classify_trend(relative_slope: f64, config: &TrendConfig) -> (TrendDirection, TrendSeverity) {
    if relative_slope.abs() < config.stable_band_percent {
        return (TrendDirection::Stable, TrendSeverity::None);
    }

    if relative_slope > 0.0 {
        let severity = if relative_slope > config.critical_threshold_percent {
            TrendSeverity::Critical
        } else if relative_slope > config.moderate_threshold_percent {
            TrendSeverity::Moderate
        } else {
            TrendSeverity::Minor
        };
        (TrendDirection::Degrading, severity)
    } else {
        let severity = if relative_slope < -config.critical_threshold_percent {
            TrendSeverity::Significant
        } else if relative_slope < -config.moderate_threshold_percent {
            TrendSeverity::Moderate
        } else {
            TrendSeverity::Minor
        };
        (TrendDirection::Improving, severity)
    }
}
