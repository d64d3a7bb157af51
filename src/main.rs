use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use serde::Serialize;
use tendencia::cli::{Cli, Command, OutputFormat};
use tendencia::correlation::{analyze_correlations, CorrelationConfig};
use tendencia::cycle_time::metric_point;
use tendencia::degradation::DegradationConfig;
use tendencia::forecast::{forecast_performance, ForecastConfig, MetricSample};
use tendencia::planning::{estimate_maintenance_windows, forecast_capacity, PlanningConfig};
use tendencia::risk::{assess_failure_risk, RiskConfig};
use tendencia::store::RunStore;
use tendencia::summary::compare_runs;
use tendencia::trend::TrendConfig;
use tendencia::{analyzer, VERSION};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print an outcome as JSON or as its text rendering.
fn emit<T: Serialize>(
    format: OutputFormat,
    outcome: &T,
    render: impl FnOnce(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => print!("{}", render(outcome)),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);
    tracing::debug!("tendencia {} starting", VERSION);

    let store = RunStore::open(&args.db)?;

    match args.command {
        Command::Trends { days } => {
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            let records = store.runs_since(cutoff)?;
            let outcome = analyzer::analyze_longterm_trends(
                &records,
                days,
                &TrendConfig::default(),
                &DegradationConfig::default(),
            );
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Forecast {
            sequence,
            days_ahead,
        } => {
            let records = store.runs_for_sequence(&sequence, true)?;
            let samples: Vec<MetricSample> = records
                .iter()
                .map(metric_point)
                .filter(|p| p.avg_cycle_time > 0.0)
                .map(|p| (p.timestamp, p.avg_cycle_time))
                .collect();
            let outcome =
                forecast_performance(&sequence, &samples, days_ahead, &ForecastConfig::default());
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Risk { sequence } => {
            let config = RiskConfig::default();
            let statuses = store.recent_statuses(&sequence, config.history_limit)?;
            let outcome = assess_failure_risk(&sequence, &statuses, &config);
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Correlation { sequence } => {
            let records = store.all_runs(sequence.as_deref())?;
            let outcome =
                analyze_correlations(&records, sequence.as_deref(), &CorrelationConfig::default());
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Compare { runs } => {
            let records = store.runs_by_ids(&runs)?;
            if records.len() != runs.len() {
                anyhow::bail!(
                    "not all run ids found: requested {}, found {}",
                    runs.len(),
                    records.len()
                );
            }
            let outcome = compare_runs(&records);
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Maintenance { threshold } => {
            if threshold <= 0.0 {
                anyhow::bail!("--threshold must be positive, got {}", threshold);
            }
            let config = PlanningConfig {
                maintenance_threshold_percent: threshold,
                ..PlanningConfig::default()
            };
            let records = store.all_runs(None)?;
            let outcome =
                estimate_maintenance_windows(&records, &ForecastConfig::default(), &config);
            emit(args.format, &outcome, |o| o.to_report_string())
        }

        Command::Capacity { days_ahead } => {
            let config = PlanningConfig::default();
            let period_days = config.forecast_horizon_days;
            let cutoff = Utc::now() - Duration::days(i64::from(period_days));
            let records = store.runs_since(cutoff)?;
            let outcome = forecast_capacity(&records, period_days, days_ahead, &config);
            emit(args.format, &outcome, |o| o.to_report_string())
        }
    }
}
