//! Failure-risk scoring from recent run outcomes
//!
//! Converts a sequence's pass/fail history into a qualitative risk level
//! with a numeric score, plus hysteresis: a rising failure count in the
//! most recent window escalates the score and level one step.

use serde::{Deserialize, Serialize};

use crate::record::is_success_status;

/// Risk scoring thresholds; success-rate bands in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// How many of the most recent runs are considered at most
    pub history_limit: usize,
    /// Minimum runs before a score is attempted
    pub min_runs: usize,
    /// Size of the recent/previous comparison windows
    pub trend_window: usize,
    /// Success rate at or above which risk is low
    pub low_threshold_percent: f64,
    /// Success rate at or above which risk is moderate
    pub moderate_threshold_percent: f64,
    /// Success rate at or above which risk is high (below: critical)
    pub high_threshold_percent: f64,
    /// Score added when the failure trend is increasing (capped at 100)
    pub escalation_bonus: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            min_runs: 5,
            trend_window: 10,
            low_threshold_percent: 95.0,
            moderate_threshold_percent: 85.0,
            high_threshold_percent: 70.0,
            escalation_bonus: 20,
        }
    }
}

impl RiskConfig {
    /// Validate threshold ordering.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_runs == 0 {
            return Err("min_runs must be positive".to_string());
        }
        if self.trend_window == 0 {
            return Err("trend_window must be positive".to_string());
        }
        if !(self.high_threshold_percent < self.moderate_threshold_percent
            && self.moderate_threshold_percent < self.low_threshold_percent)
        {
            return Err(format!(
                "thresholds must be ordered high < moderate < low, got {} / {} / {}",
                self.high_threshold_percent,
                self.moderate_threshold_percent,
                self.low_threshold_percent
            ));
        }
        Ok(())
    }
}

/// Qualitative risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    fn base_score(self) -> u32 {
        match self {
            RiskLevel::Low => 10,
            RiskLevel::Moderate => 30,
            RiskLevel::High => 60,
            RiskLevel::Critical => 90,
        }
    }

    /// One-step escalation; high and critical are unaffected (their
    /// escalation happens through the score alone).
    fn escalate(self) -> Self {
        match self {
            RiskLevel::Low => RiskLevel::Moderate,
            RiskLevel::Moderate => RiskLevel::High,
            other => other,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Direction of the failure count between the two most recent windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// The headline risk numbers.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// 0–100
    pub risk_score: u32,
    pub success_rate: f64,
    pub failure_rate: f64,
}

/// Supporting counts behind the assessment.
#[derive(Debug, Clone, Serialize)]
pub struct RiskStatistics {
    pub total_runs_analyzed: usize,
    pub failed_runs: usize,
    /// Failures in the most recent window
    pub recent_failures: usize,
    /// Failures in the preceding window (0 when absent)
    pub previous_failures: usize,
    pub trend: FailureTrend,
}

/// Full risk report for one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub sequence: String,
    pub risk_assessment: RiskAssessment,
    pub statistics: RiskStatistics,
    /// Deterministic, derived from level / trend / success rate
    pub recommendations: Vec<String>,
}

/// Discriminated risk outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskOutcome {
    Success(RiskReport),
    InsufficientData { sequence: String, reason: String },
}

impl RiskOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            RiskOutcome::Success(report) => {
                let icon = match report.risk_assessment.risk_level {
                    RiskLevel::Low => "🟢",
                    RiskLevel::Moderate => "🟡",
                    RiskLevel::High => "🟠",
                    RiskLevel::Critical => "🔴",
                };
                let mut out = format!(
                    "{} Risk for '{}': {} (score {}/100)\n\
                     Success rate: {:.1}% over {} runs ({} failed)\n\
                     Failure trend: {:?} (recent {}, previous {})\n",
                    icon,
                    report.sequence,
                    report.risk_assessment.risk_level,
                    report.risk_assessment.risk_score,
                    report.risk_assessment.success_rate,
                    report.statistics.total_runs_analyzed,
                    report.statistics.failed_runs,
                    report.statistics.trend,
                    report.statistics.recent_failures,
                    report.statistics.previous_failures
                );
                for recommendation in &report.recommendations {
                    out.push_str(&format!("  - {}\n", recommendation));
                }
                out
            }
            RiskOutcome::InsufficientData { sequence, reason } => {
                format!("⚠️  Insufficient data for '{}': {}\n", sequence, reason)
            }
        }
    }
}

/// Score the failure risk of a sequence from its outcome history.
///
/// `statuses` must be ordered newest first; only the first
/// `history_limit` entries are considered. The failure trend is
/// computed only when a full preceding window exists, by comparing the
/// failure counts of the two most recent windows.
pub fn assess_failure_risk(sequence: &str, statuses: &[String], config: &RiskConfig) -> RiskOutcome {
    let history = &statuses[..statuses.len().min(config.history_limit)];

    if history.len() < config.min_runs {
        return RiskOutcome::InsufficientData {
            sequence: sequence.to_string(),
            reason: format!(
                "need at least {} runs for risk analysis, got {}",
                config.min_runs,
                history.len()
            ),
        };
    }

    let total = history.len();
    let failed = history.iter().filter(|s| !is_success_status(s)).count();
    let success_rate = (total - failed) as f64 / total as f64 * 100.0;

    let window = config.trend_window;
    let recent_failures = count_failures(&history[..window.min(total)]);
    let (previous_failures, trend) = if total >= 2 * window {
        let previous = count_failures(&history[window..2 * window]);
        let trend = if recent_failures > previous {
            FailureTrend::Increasing
        } else if recent_failures < previous {
            FailureTrend::Decreasing
        } else {
            FailureTrend::Stable
        };
        (previous, trend)
    } else {
        (0, FailureTrend::Stable)
    };

    let mut level = if success_rate >= config.low_threshold_percent {
        RiskLevel::Low
    } else if success_rate >= config.moderate_threshold_percent {
        RiskLevel::Moderate
    } else if success_rate >= config.high_threshold_percent {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    };
    let mut score = level.base_score();

    if trend == FailureTrend::Increasing {
        score = (score + config.escalation_bonus).min(100);
        level = level.escalate();
    }

    let mut recommendations = Vec::new();
    if level >= RiskLevel::High {
        recommendations.push("inspect the system and analyze failure causes".to_string());
        recommendations.push("review detailed logs of failed runs".to_string());
    }
    if trend == FailureTrend::Increasing {
        recommendations.push("failure rate is rising - maintenance strongly recommended".to_string());
    }
    if success_rate < 90.0 {
        recommendations.push("check configuration and hardware".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("system is running stable".to_string());
    }

    RiskOutcome::Success(RiskReport {
        sequence: sequence.to_string(),
        risk_assessment: RiskAssessment {
            risk_level: level,
            risk_score: score,
            success_rate,
            failure_rate: 100.0 - success_rate,
        },
        statistics: RiskStatistics {
            total_runs_analyzed: total,
            failed_runs: failed,
            recent_failures,
            previous_failures,
            trend,
        },
        recommendations,
    })
}

fn count_failures(statuses: &[String]) -> usize {
    statuses.iter().filter(|s| !is_success_status(s)).count()
}
