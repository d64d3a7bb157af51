//! Cycle-time forecasting for a single sequence
//!
//! Fits a degree-≤2 polynomial over "days since first sample" and
//! extrapolates it across a forward horizon. Confidence bands come from
//! the residual spread of the fit against the observed data; a singular
//! fit is surfaced as a typed model error, never a numeric exception.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use trueno::Vector;

use crate::fit;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Forecaster tuning; defaults match the historical behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Minimum usable samples before a model is attempted
    pub min_points: usize,
    /// Maximum polynomial degree (the effective degree is
    /// `min(max_degree, n − 1)`)
    pub max_degree: usize,
    /// Half-width of the confidence band in residual standard deviations
    pub band_sigma: f64,
    /// Confidence label attached to every forecast point
    pub confidence_percent: f64,
    /// Projected change beyond this raises a moderate warning
    pub moderate_warning_percent: f64,
    /// Projected change beyond this raises a high warning
    pub high_warning_percent: f64,
    /// Projected change beyond this marks current performance degrading
    pub degrading_trend_percent: f64,
    /// R² reported when the observed series has no variance
    pub degenerate_r_squared: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_points: 5,
            max_degree: 2,
            band_sigma: 2.0,
            confidence_percent: 95.0,
            moderate_warning_percent: 5.0,
            high_warning_percent: 15.0,
            degrading_trend_percent: 2.0,
            degenerate_r_squared: fit::DEGENERATE_R_SQUARED,
        }
    }
}

impl ForecastConfig {
    /// Validate threshold sanity.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_points < 2 {
            return Err(format!("min_points must be >= 2, got {}", self.min_points));
        }
        if self.band_sigma <= 0.0 {
            return Err(format!("band_sigma must be positive, got {}", self.band_sigma));
        }
        if self.high_warning_percent <= self.moderate_warning_percent {
            return Err(format!(
                "high_warning_percent ({}) must exceed moderate_warning_percent ({})",
                self.high_warning_percent, self.moderate_warning_percent
            ));
        }
        Ok(())
    }
}

/// One (timestamp, average cycle time) observation.
pub type MetricSample = (DateTime<Utc>, f64);

/// Severity of a projected degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    High,
    Moderate,
}

/// Warning derived from the projected change over the horizon.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastWarning {
    pub level: WarningLevel,
    pub message: String,
    pub recommendation: String,
}

/// One forecast sample with its confidence band.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastPoint {
    pub date: DateTime<Utc>,
    pub predicted_cycle_time: f64,
    /// Band lower bound, floored at 0
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Confidence label in percent
    pub confidence: f64,
}

/// How well the model fit the observed data.
#[derive(Debug, Clone, Serialize)]
pub struct ModelQuality {
    pub r_squared: f64,
    pub data_points: usize,
    /// e.g. "polynomial_degree_2"
    pub model_type: String,
}

/// Present-day performance reading derived from the last observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTrend {
    Degrading,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentPerformance {
    /// Mean of the last 3 observed cycle times
    pub avg_cycle_time: f64,
    pub trend: PerformanceTrend,
}

/// Projected change and the warning it raises, if any.
#[derive(Debug, Clone, Serialize)]
pub struct DegradationForecast {
    pub percent_change: f64,
    pub warning: Option<ForecastWarning>,
}

/// Complete forecast for one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub sequence: String,
    pub model_quality: ModelQuality,
    pub current_performance: CurrentPerformance,
    pub predictions: Vec<ForecastPoint>,
    pub degradation_forecast: DegradationForecast,
}

/// Discriminated forecast outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Success(ForecastReport),
    InsufficientData { sequence: String, reason: String },
    Error { sequence: String, reason: String },
}

impl ForecastOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            ForecastOutcome::Success(report) => {
                let mut out = format!(
                    "🔮 Forecast for '{}' ({}, R² {:.3}, {} runs)\n",
                    report.sequence,
                    report.model_quality.model_type,
                    report.model_quality.r_squared,
                    report.model_quality.data_points
                );
                out.push_str(&format!(
                    "Current avg cycle time: {:.2} ms ({})\n\n",
                    report.current_performance.avg_cycle_time,
                    match report.current_performance.trend {
                        PerformanceTrend::Degrading => "degrading",
                        PerformanceTrend::Stable => "stable",
                    }
                ));
                for point in &report.predictions {
                    out.push_str(&format!(
                        "  {}  {:8.2} ms  [{:.2} .. {:.2}]\n",
                        point.date.format("%Y-%m-%d"),
                        point.predicted_cycle_time,
                        point.lower_bound,
                        point.upper_bound
                    ));
                }
                out.push_str(&format!(
                    "\nProjected change: {:+.1}%\n",
                    report.degradation_forecast.percent_change
                ));
                if let Some(warning) = &report.degradation_forecast.warning {
                    out.push_str(&format!(
                        "⚠️  {}: {}\n",
                        warning.message, warning.recommendation
                    ));
                }
                out
            }
            ForecastOutcome::InsufficientData { sequence, reason } => {
                format!("⚠️  Insufficient data for '{}': {}\n", sequence, reason)
            }
            ForecastOutcome::Error { sequence, reason } => {
                format!("❌ Forecast failed for '{}': {}\n", sequence, reason)
            }
        }
    }
}

/// Forecast a sequence's cycle time `horizon_days` into the future.
///
/// `samples` are (timestamp, metric) observations for successful runs;
/// non-positive metrics are dropped. Fewer than `min_points` usable
/// samples yields [`ForecastOutcome::InsufficientData`]; a singular
/// least-squares system yields [`ForecastOutcome::Error`].
pub fn forecast_performance(
    sequence: &str,
    samples: &[MetricSample],
    horizon_days: u32,
    config: &ForecastConfig,
) -> ForecastOutcome {
    let mut usable: Vec<MetricSample> = samples
        .iter()
        .filter(|(_, metric)| *metric > 0.0)
        .copied()
        .collect();
    usable.sort_by_key(|(ts, _)| *ts);

    if usable.len() < config.min_points {
        return ForecastOutcome::InsufficientData {
            sequence: sequence.to_string(),
            reason: format!(
                "need at least {} runs with usable cycle data, got {}",
                config.min_points,
                usable.len()
            ),
        };
    }

    let t0 = usable[0].0;
    let days: Vec<f64> = usable
        .iter()
        .map(|(ts, _)| (*ts - t0).num_milliseconds() as f64 / MILLIS_PER_DAY)
        .collect();
    let metrics: Vec<f64> = usable.iter().map(|(_, metric)| *metric).collect();

    let degree = config.max_degree.min(usable.len() - 1);
    let poly = match fit::fit_polynomial(&days, &metrics, degree) {
        Ok(poly) => poly,
        Err(e) => {
            return ForecastOutcome::Error {
                sequence: sequence.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let fitted: Vec<f64> = days.iter().map(|&d| poly.eval(d)).collect();
    let r2 = fit::r_squared(&metrics, &fitted, config.degenerate_r_squared);

    let residuals: Vec<f32> = metrics
        .iter()
        .zip(&fitted)
        .map(|(&observed, &predicted)| (observed - predicted) as f32)
        .collect();
    let std_residual = Vector::from_slice(&residuals).stddev().unwrap_or(0.0) as f64;

    // horizon_days + 1 evenly spaced points from the last observed day
    let last_day = *days.last().unwrap_or(&0.0);
    let count = horizon_days as usize + 1;
    let step = if count > 1 {
        horizon_days as f64 / (count - 1) as f64
    } else {
        0.0
    };

    let predictions: Vec<ForecastPoint> = (0..count)
        .map(|i| {
            let day = last_day + step * i as f64;
            let predicted = poly.eval(day);
            ForecastPoint {
                date: t0 + Duration::milliseconds((day * MILLIS_PER_DAY).round() as i64),
                predicted_cycle_time: predicted,
                lower_bound: (predicted - config.band_sigma * std_residual).max(0.0),
                upper_bound: predicted + config.band_sigma * std_residual,
                confidence: config.confidence_percent,
            }
        })
        .collect();

    let current_avg = tail_mean(&metrics, 3);
    let predicted_values: Vec<f64> = predictions
        .iter()
        .map(|p| p.predicted_cycle_time)
        .collect();
    let future_avg = tail_mean(&predicted_values, 3);

    let percent_change = if current_avg > 0.0 {
        (future_avg - current_avg) / current_avg * 100.0
    } else {
        0.0
    };

    let warning = if percent_change > config.high_warning_percent {
        Some(ForecastWarning {
            level: WarningLevel::High,
            message: format!(
                "expected degradation of {:.1}% within {} days",
                percent_change, horizon_days
            ),
            recommendation: "maintenance or optimization recommended".to_string(),
        })
    } else if percent_change > config.moderate_warning_percent {
        Some(ForecastWarning {
            level: WarningLevel::Moderate,
            message: format!("slight degradation expected: {:.1}%", percent_change),
            recommendation: "keep the system under observation".to_string(),
        })
    } else {
        None
    };

    let trend = if percent_change > config.degrading_trend_percent {
        PerformanceTrend::Degrading
    } else {
        PerformanceTrend::Stable
    };

    ForecastOutcome::Success(ForecastReport {
        sequence: sequence.to_string(),
        model_quality: ModelQuality {
            r_squared: r2,
            data_points: usable.len(),
            model_type: format!("polynomial_degree_{}", poly.degree()),
        },
        current_performance: CurrentPerformance {
            avg_cycle_time: current_avg,
            trend,
        },
        predictions,
        degradation_forecast: DegradationForecast {
            percent_change,
            warning,
        },
    })
}

/// Mean of the last (up to) `n` values.
fn tail_mean(values: &[f64], n: usize) -> f64 {
    let tail: Vec<f32> = values.iter().rev().take(n).map(|&v| v as f32).collect();
    if tail.is_empty() {
        return 0.0;
    }
    Vector::from_slice(&tail).mean().unwrap_or(0.0) as f64
}
