//! Run-to-run comparison and daily roll-up summaries
//!
//! The comparison report puts several runs side by side with their
//! cycle-time distribution statistics and names the best and worst
//! performer. Daily summaries aggregate run counts, success rates and
//! mean durations per UTC day.

use std::collections::BTreeMap;

use aprender::stats::DescriptiveStats;
use chrono::NaiveDate;
use serde::Serialize;
use trueno::Vector;

use crate::cycle_time::run_cycle_times;
use crate::record::RunRecord;

/// One run's row in a comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct RunComparison {
    pub run_id: i64,
    pub name: String,
    pub sequence: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub duration_secs: Option<f64>,
    pub cycles: Option<u32>,
    pub status: String,
    /// All zero when the run has no derivable cycle times
    pub avg_cycle_time: f64,
    pub std_cycle_time: f64,
    pub min_cycle_time: f64,
    pub max_cycle_time: f64,
    pub median_cycle_time: f64,
    pub p95_cycle_time: f64,
}

/// Best/worst performer and the spread between them.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub best_run: Option<RunComparison>,
    pub worst_run: Option<RunComparison>,
    pub performance_difference_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub runs: Vec<RunComparison>,
    pub summary: ComparisonSummary,
}

/// Discriminated comparison outcome; `status` tag in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Success(ComparisonReport),
    Error { reason: String },
}

impl ComparisonOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        match self {
            ComparisonOutcome::Success(report) => {
                let mut out = format!("⚖️  Comparing {} runs\n", report.runs.len());
                for run in &report.runs {
                    out.push_str(&format!(
                        "  #{} {} ({}): avg {:.2} ms, median {:.2}, p95 {:.2}, range [{:.2} .. {:.2}]\n",
                        run.run_id,
                        run.name,
                        run.status,
                        run.avg_cycle_time,
                        run.median_cycle_time,
                        run.p95_cycle_time,
                        run.min_cycle_time,
                        run.max_cycle_time
                    ));
                }
                if let (Some(best), Some(worst)) =
                    (&report.summary.best_run, &report.summary.worst_run)
                {
                    out.push_str(&format!(
                        "\nBest: #{} ({:.2} ms), worst: #{} ({:.2} ms), spread {:.1}%\n",
                        best.run_id,
                        best.avg_cycle_time,
                        worst.run_id,
                        worst.avg_cycle_time,
                        report.summary.performance_difference_percent
                    ));
                }
                out
            }
            ComparisonOutcome::Error { reason } => {
                format!("❌ Comparison failed: {}\n", reason)
            }
        }
    }
}

/// Compare a set of runs by their cycle-time distributions.
///
/// Needs at least 2 records. Runs without usable cycle data report
/// all-zero statistics and are excluded from best/worst selection.
pub fn compare_runs(records: &[RunRecord]) -> ComparisonOutcome {
    if records.len() < 2 {
        return ComparisonOutcome::Error {
            reason: format!("need at least 2 runs to compare, got {}", records.len()),
        };
    }

    let runs: Vec<RunComparison> = records.iter().map(comparison_row).collect();

    let mut best: Option<&RunComparison> = None;
    let mut worst: Option<&RunComparison> = None;
    for run in runs.iter().filter(|r| r.avg_cycle_time > 0.0) {
        if best.map_or(true, |b| run.avg_cycle_time < b.avg_cycle_time) {
            best = Some(run);
        }
        if worst.map_or(true, |w| run.avg_cycle_time > w.avg_cycle_time) {
            worst = Some(run);
        }
    }

    let performance_difference_percent = match (best, worst) {
        (Some(best), Some(worst)) if best.avg_cycle_time > 0.0 => {
            (worst.avg_cycle_time - best.avg_cycle_time) / best.avg_cycle_time * 100.0
        }
        _ => 0.0,
    };

    ComparisonOutcome::Success(ComparisonReport {
        summary: ComparisonSummary {
            best_run: best.cloned(),
            worst_run: worst.cloned(),
            performance_difference_percent,
        },
        runs,
    })
}

fn comparison_row(record: &RunRecord) -> RunComparison {
    let spans = run_cycle_times(record);
    let samples: Vec<f32> = spans.iter().map(|&s| s as f32).collect();

    let (avg, std, min, max, median, p95) = if samples.is_empty() {
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    } else {
        let vector = Vector::from_slice(&samples);
        let stats = DescriptiveStats::new(&vector);
        (
            vector.mean().unwrap_or(0.0) as f64,
            vector.stddev().unwrap_or(0.0) as f64,
            vector.min().unwrap_or(0.0) as f64,
            vector.max().unwrap_or(0.0) as f64,
            stats.quantile(0.5).unwrap_or(0.0) as f64,
            stats.quantile(0.95).unwrap_or(0.0) as f64,
        )
    };

    RunComparison {
        run_id: record.id,
        name: record.name.clone(),
        sequence: record.sequence_name.clone(),
        start_time: record.start_time,
        duration_secs: record.duration_secs,
        cycles: record.cycles,
        status: record.status.clone(),
        avg_cycle_time: avg,
        std_cycle_time: std,
        min_cycle_time: min,
        max_cycle_time: max,
        median_cycle_time: median,
        p95_cycle_time: p95,
    }
}

/// One UTC day's aggregate over a record set.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub success_rate: f64,
    /// Mean of the recorded durations that day (0 when none)
    pub avg_duration: f64,
}

/// Aggregate runs into per-day summaries, sorted by date.
pub fn daily_summaries(records: &[RunRecord]) -> Vec<DailySummary> {
    #[derive(Default)]
    struct DayAccumulator {
        count: usize,
        success: usize,
        durations: Vec<f32>,
    }

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.start_time.date_naive()).or_default();
        day.count += 1;
        if record.is_success() {
            day.success += 1;
        }
        if let Some(duration) = record.duration_secs {
            day.durations.push(duration as f32);
        }
    }

    days.into_iter()
        .map(|(date, day)| {
            let avg_duration = if day.durations.is_empty() {
                0.0
            } else {
                Vector::from_slice(&day.durations).mean().unwrap_or(0.0) as f64
            };
            DailySummary {
                date,
                total_runs: day.count,
                successful_runs: day.success,
                success_rate: day.success as f64 / day.count as f64 * 100.0,
                avg_duration,
            }
        })
        .collect()
}
