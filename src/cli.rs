//! CLI argument parsing for Tendencia

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tendencia")]
#[command(version)]
#[command(about = "Trend, degradation and failure-risk analytics for hardware test-run histories", long_about = None)]
pub struct Cli {
    /// Path to the run database
    #[arg(long = "db", value_name = "PATH")]
    pub db: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable diagnostic logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Long-term trend and degradation analysis over a window
    Trends {
        /// Analysis window in days
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Forecast a sequence's cycle time into the future
    Forecast {
        /// Sequence name
        sequence: String,

        /// Forecast horizon in days
        #[arg(long = "days-ahead", default_value_t = 7)]
        days_ahead: u32,
    },

    /// Failure-risk assessment for a sequence
    Risk {
        /// Sequence name
        sequence: String,
    },

    /// Correlation matrix across derived run metrics
    Correlation {
        /// Restrict the analysis to one sequence
        #[arg(long)]
        sequence: Option<String>,
    },

    /// Compare specific runs side by side
    Compare {
        /// Comma-separated run ids (e.g. --runs 3,7,12)
        #[arg(long, value_delimiter = ',', required = true)]
        runs: Vec<i64>,
    },

    /// Estimate per-sequence maintenance windows
    Maintenance {
        /// Degradation percent at which maintenance is due
        #[arg(long, default_value_t = 20.0)]
        threshold: f64,
    },

    /// Project run volume and storage needs
    Capacity {
        /// Forecast horizon in days
        #[arg(long = "days-ahead", default_value_t = 30)]
        days_ahead: u32,
    },
}
