//! CLI argument parsing for sysopt

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for optimization reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// One JSON document per line for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sysopt")]
#[command(version)]
#[command(about = "Syscall performance optimizer with resource-aware recommendations", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Average execution time threshold in seconds (overrides config)
    #[arg(short, long, value_name = "SECONDS")]
    pub threshold: Option<f64>,

    /// Seconds between reports (overrides config)
    #[arg(short = 'i', long = "refresh-interval", value_name = "SECONDS")]
    pub refresh_interval: Option<u64>,

    /// Feed simulated syscall events in the background
    #[arg(short, long)]
    pub simulate: bool,

    /// Record a one-shot burst of simulated events before the first report
    #[arg(long)]
    pub burst: bool,

    /// Replay events from a JSON-lines file
    #[arg(short, long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Number of reports to print before exiting
    #[arg(short = 'n', long, value_name = "N", default_value = "1")]
    pub rounds: usize,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Never call the suggestion backend, even if an API key is set
    #[arg(long = "no-backend")]
    pub no_backend: bool,

    /// Report zero resource usage instead of sampling the system
    #[arg(long = "no-sampling")]
    pub no_sampling: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sysopt"]);
        assert!(cli.config.is_none());
        assert!(cli.threshold.is_none());
        assert!(cli.refresh_interval.is_none());
        assert!(!cli.simulate);
        assert!(!cli.burst);
        assert_eq!(cli.rounds, 1);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.no_backend);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_events_file() {
        let cli = Cli::parse_from(["sysopt", "--events", "trace.jsonl"]);
        assert_eq!(cli.events, Some(PathBuf::from("trace.jsonl")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "sysopt",
            "--threshold",
            "0.02",
            "--refresh-interval",
            "2",
            "--rounds",
            "3",
        ]);
        assert_eq!(cli.threshold, Some(0.02));
        assert_eq!(cli.refresh_interval, Some(2));
        assert_eq!(cli.rounds, 3);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["sysopt", "-s", "-n", "2", "-c", "sysopt.toml"]);
        assert!(cli.simulate);
        assert_eq!(cli.rounds, 2);
        assert_eq!(cli.config, Some(PathBuf::from("sysopt.toml")));
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["sysopt", "--format", "json", "--no-backend"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_backend);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["sysopt", "--format", "csv"]).is_err());
    }
}
