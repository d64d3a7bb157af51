//! Pearson correlation analysis across derived per-run metrics
//!
//! For each qualifying run (successful, with a derivable cycle-time
//! distribution) four variables are derived: duration, cycle count,
//! mean cycle time, and a stability score. The full symmetric Pearson
//! matrix over those variables is reported together with the strong
//! off-diagonal pairs.

use serde::{Deserialize, Serialize};
use trueno::Vector;

use crate::cycle_time::run_cycle_times;
use crate::record::RunRecord;

/// Variable order of the matrix rows/columns.
pub const VARIABLES: [&str; 4] = ["duration", "cycles", "avg_cycle_time", "cycle_stability"];

/// Correlation thresholds and degenerate-case conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Minimum qualifying runs before a matrix is computed
    pub min_runs: usize,
    /// |r| beyond this is reported as a strong pair
    pub strong_threshold: f64,
    /// |r| beyond this is labeled "strong" rather than "moderate"
    pub very_strong_threshold: f64,
    /// Stability penalty applied when the mean cycle time is zero
    /// (the historical convention: full penalty, stability 0)
    pub zero_mean_penalty: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_runs: 3,
            strong_threshold: 0.7,
            very_strong_threshold: 0.9,
            zero_mean_penalty: 100.0,
        }
    }
}

impl CorrelationConfig {
    /// Validate threshold ordering.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_runs < 2 {
            return Err(format!("min_runs must be >= 2, got {}", self.min_runs));
        }
        if !(0.0..=1.0).contains(&self.strong_threshold)
            || !(0.0..=1.0).contains(&self.very_strong_threshold)
        {
            return Err("correlation thresholds must be in [0, 1]".to_string());
        }
        if self.very_strong_threshold <= self.strong_threshold {
            return Err(format!(
                "very_strong_threshold ({}) must exceed strong_threshold ({})",
                self.very_strong_threshold, self.strong_threshold
            ));
        }
        Ok(())
    }
}

/// Label for a reported pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
}

/// One off-diagonal pair above the strong threshold.
#[derive(Debug, Clone, Serialize)]
pub struct StrongCorrelation {
    pub variable1: String,
    pub variable2: String,
    pub correlation: f64,
    pub strength: CorrelationStrength,
}

/// The correlation matrix and its notable pairs.
///
/// Zero-variance pairs have an undefined coefficient: the matrix entry
/// is NaN (serialized as null) and the pair never appears in
/// `strong_correlations`.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub variables: Vec<String>,
    pub correlation_matrix: Vec<Vec<f64>>,
    pub strong_correlations: Vec<StrongCorrelation>,
    pub sample_size: usize,
}

/// Discriminated correlation outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    Success(CorrelationReport),
    InsufficientData { reason: String },
}

impl CorrelationOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            CorrelationOutcome::Success(report) => {
                let mut out = format!(
                    "📊 Correlation matrix over {} runs\n",
                    report.sample_size
                );
                for (i, variable) in report.variables.iter().enumerate() {
                    out.push_str(&format!("  {:>16}:", variable));
                    for value in &report.correlation_matrix[i] {
                        if value.is_finite() {
                            out.push_str(&format!(" {:+.2}", value));
                        } else {
                            out.push_str("   n/a");
                        }
                    }
                    out.push('\n');
                }
                if report.strong_correlations.is_empty() {
                    out.push_str("\nNo strong correlations found.\n");
                } else {
                    out.push_str("\nStrong correlations:\n");
                    for pair in &report.strong_correlations {
                        out.push_str(&format!(
                            "  {} ↔ {}  r={:+.3} ({:?})\n",
                            pair.variable1, pair.variable2, pair.correlation, pair.strength
                        ));
                    }
                }
                out
            }
            CorrelationOutcome::InsufficientData { reason } => {
                format!("⚠️  Insufficient data for correlation analysis: {}\n", reason)
            }
        }
    }
}

/// Build the Pearson correlation matrix for a record set.
///
/// Qualifying records are successful runs with a non-empty cycle-time
/// distribution, optionally restricted to one sequence. Fewer than
/// `min_runs` qualifying records yields
/// [`CorrelationOutcome::InsufficientData`].
pub fn analyze_correlations(
    records: &[RunRecord],
    sequence: Option<&str>,
    config: &CorrelationConfig,
) -> CorrelationOutcome {
    let mut durations = Vec::new();
    let mut cycles = Vec::new();
    let mut avg_cycle_times = Vec::new();
    let mut stabilities = Vec::new();

    for record in records {
        if let Some(wanted) = sequence {
            if record.sequence_name != wanted {
                continue;
            }
        }
        if !record.is_success() {
            continue;
        }

        let spans = run_cycle_times(record);
        if spans.is_empty() {
            continue;
        }

        let samples: Vec<f32> = spans.iter().map(|&s| s as f32).collect();
        let vector = Vector::from_slice(&samples);
        let avg = vector.mean().unwrap_or(0.0) as f64;
        let std = vector.stddev().unwrap_or(0.0) as f64;

        let penalty = if avg > 0.0 {
            std / avg * 100.0
        } else {
            config.zero_mean_penalty
        };

        durations.push(record.duration_secs.unwrap_or(0.0));
        cycles.push(record.cycles.unwrap_or(0) as f64);
        avg_cycle_times.push(avg);
        stabilities.push((100.0 - penalty).max(0.0));
    }

    let sample_size = durations.len();
    if sample_size < config.min_runs {
        return CorrelationOutcome::InsufficientData {
            reason: format!(
                "need at least {} successful runs with cycle data, got {}",
                config.min_runs, sample_size
            ),
        };
    }

    let columns = [&durations, &cycles, &avg_cycle_times, &stabilities];
    let n = columns.len();

    let mut matrix = vec![vec![0.0_f64; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = if i == j {
                // diagonal is 1 by definition, even for constant columns
                1.0
            } else {
                pearson(columns[i], columns[j])
            };
        }
    }

    let mut strong_correlations = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            let r = matrix[i][j];
            if r.is_finite() && r.abs() > config.strong_threshold {
                strong_correlations.push(StrongCorrelation {
                    variable1: VARIABLES[i].to_string(),
                    variable2: VARIABLES[j].to_string(),
                    correlation: r,
                    strength: if r.abs() > config.very_strong_threshold {
                        CorrelationStrength::Strong
                    } else {
                        CorrelationStrength::Moderate
                    },
                });
            }
        }
    }

    CorrelationOutcome::Success(CorrelationReport {
        variables: VARIABLES.iter().map(|v| v.to_string()).collect(),
        correlation_matrix: matrix,
        strong_correlations,
        sample_size,
    })
}

/// Pearson's r; NaN when either column has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if n == 0.0 {
        return f64::NAN;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    let denominator = (variance_x * variance_y).sqrt();
    if denominator > 0.0 {
        covariance / denominator
    } else {
        f64::NAN
    }
}
