//! Configuration settings for StackTune
//!
//! Defines the CLI arguments and the run configuration derived from them.

use crate::error::{Result, StackTuneError};
use crate::plan::{PlannerPolicy, MIN_AVAILABLE_SPACE_GB};
use crate::system::{ServiceTarget, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DEGRADED_AFTER};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default data volume inspected for free space and disk usage
pub const DEFAULT_DATA_PATH: &str = "/";

/// StackTune - resource planning and health alerts for a log-analytics stack
#[derive(Parser, Debug, Clone)]
#[command(name = "stacktune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Size a search/dashboard/shipper stack to its host and watch its health")]
#[command(long_about = r#"
StackTune inspects the host, classifies it into a memory tier and derives
heap sizes, container limits, queue sizes and retention for the search
engine, the dashboard and the log shipper. It also evaluates runtime
metrics against tier-appropriate thresholds.

Examples:
  stacktune facts                        # Show detected hardware
  stacktune plan --emit ./config         # Plan and write stacktune.env
  stacktune plan --facts host.json       # Plan from recorded facts
  stacktune check --output-format json   # Evaluate current health
"#)]
pub struct CliArgs {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Output format for reports
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output_format: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Collect and print hardware facts
    #[command(name = "facts")]
    Facts {
        /// Data volume to inspect
        #[arg(long, default_value = DEFAULT_DATA_PATH, value_name = "PATH")]
        path: PathBuf,
        /// Also save the facts as JSON
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },

    /// Classify the host and plan stack parameters
    #[command(name = "plan")]
    Plan {
        /// Plan from a facts JSON file instead of the live host
        #[arg(long, value_name = "FILE")]
        facts: Option<PathBuf>,
        /// Data volume to inspect
        #[arg(long, default_value = DEFAULT_DATA_PATH, value_name = "PATH")]
        path: PathBuf,
        /// Minimum free space required on the data volume
        #[arg(long, default_value_t = MIN_AVAILABLE_SPACE_GB, value_name = "GB")]
        min_space_gb: u64,
        /// Write the environment manifest into this directory
        #[arg(long, value_name = "DIR")]
        emit: Option<PathBuf>,
    },

    /// Resolve alert thresholds for the host
    #[command(name = "thresholds")]
    Thresholds {
        /// Resolve from a facts JSON file instead of the live host
        #[arg(long, value_name = "FILE")]
        facts: Option<PathBuf>,
        /// Data volume to inspect
        #[arg(long, default_value = DEFAULT_DATA_PATH, value_name = "PATH")]
        path: PathBuf,
    },

    /// Sample metrics and evaluate alerts
    #[command(name = "check")]
    Check {
        /// Evaluate a metrics JSON file instead of sampling
        #[arg(long, value_name = "FILE")]
        metrics: Option<PathBuf>,
        /// Use a facts JSON file instead of the live host
        #[arg(long, value_name = "FILE")]
        facts: Option<PathBuf>,
        /// Data volume to inspect
        #[arg(long, default_value = DEFAULT_DATA_PATH, value_name = "PATH")]
        path: PathBuf,
        /// Service to probe as name=host:port (repeatable)
        #[arg(long = "service", value_name = "NAME=HOST:PORT")]
        services: Vec<String>,
        /// Current retention in days (default: planned from free space)
        #[arg(long, value_name = "DAYS")]
        retention_days: Option<u32>,
        /// TCP connect timeout for service probes
        #[arg(long, default_value = "2s", value_name = "DURATION")]
        connect_timeout: String,
        /// Connect latency above which a service is degraded
        #[arg(long, default_value = "500ms", value_name = "DURATION")]
        degraded_after: String,
    },
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration for one run, validated from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Data volume inspected for space and usage
    pub data_path: PathBuf,
    /// Recorded facts to use instead of the live host
    pub facts_file: Option<PathBuf>,
    /// Recorded metrics to use instead of sampling
    pub metrics_file: Option<PathBuf>,
    /// Planner policy
    pub planner: PlannerPolicy,
    /// Directory for emitted artifacts
    pub emit_dir: Option<PathBuf>,
    /// Services to probe
    pub services: Vec<ServiceTarget>,
    /// Retention override for alert evaluation
    pub retention_days: Option<u32>,
    /// Probe connect timeout
    pub connect_timeout: Duration,
    /// Probe latency marking a service degraded
    pub degraded_after: Duration,
    /// Report format
    pub output_format: OutputFormat,
    /// Suppress non-error output
    pub quiet: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            facts_file: None,
            metrics_file: None,
            planner: PlannerPolicy::default(),
            emit_dir: None,
            services: ServiceTarget::defaults(),
            retention_days: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            degraded_after: DEFAULT_DEGRADED_AFTER,
            output_format: OutputFormat::Text,
            quiet: false,
        }
    }
}

/// Parse a human-readable duration such as `2s` or `500ms`
pub fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(value.trim()).map_err(|e| format!("Invalid duration '{}': {}", value, e))
}

impl RunConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = Self {
            output_format: args.output_format,
            quiet: args.quiet,
            ..Default::default()
        };

        match &args.command {
            Commands::Facts { path, .. } => {
                config.data_path = path.clone();
            }
            Commands::Plan {
                facts,
                path,
                min_space_gb,
                emit,
            } => {
                config.data_path = path.clone();
                config.facts_file = facts.clone();
                config.planner.min_available_space_gb = *min_space_gb;
                config.emit_dir = emit.clone();
            }
            Commands::Thresholds { facts, path } => {
                config.data_path = path.clone();
                config.facts_file = facts.clone();
            }
            Commands::Check {
                metrics,
                facts,
                path,
                services,
                retention_days,
                connect_timeout,
                degraded_after,
            } => {
                config.data_path = path.clone();
                config.facts_file = facts.clone();
                config.metrics_file = metrics.clone();
                if !services.is_empty() {
                    config.services = services
                        .iter()
                        .map(|s| ServiceTarget::parse(s))
                        .collect::<Result<Vec<_>>>()?;
                }
                if *retention_days == Some(0) {
                    return Err(StackTuneError::config("Retention must be at least 1 day"));
                }
                config.retention_days = *retention_days;
                config.connect_timeout = parse_duration(connect_timeout)
                    .map_err(|e| StackTuneError::config(format!("Invalid connect timeout: {}", e)))?;
                config.degraded_after = parse_duration(degraded_after)
                    .map_err(|e| StackTuneError::config(format!("Invalid degraded threshold: {}", e)))?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(StackTuneError::config("Connect timeout must be greater than zero"));
        }
        if self.degraded_after >= self.connect_timeout {
            return Err(StackTuneError::config(format!(
                "Degraded threshold ({}) must be below the connect timeout ({})",
                humantime::format_duration(self.degraded_after),
                humantime::format_duration(self.connect_timeout)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_plan_config() {
        let args = parse(&[
            "stacktune", "plan", "--facts", "host.json", "--min-space-gb", "20", "--emit", "out",
        ]);
        let config = RunConfig::from_cli(&args).unwrap();
        assert_eq!(config.facts_file, Some(PathBuf::from("host.json")));
        assert_eq!(config.planner.min_available_space_gb, 20);
        assert_eq!(config.emit_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_check_defaults() {
        let args = parse(&["stacktune", "check"]);
        let config = RunConfig::from_cli(&args).unwrap();
        assert_eq!(config.services, ServiceTarget::defaults());
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.degraded_after, DEFAULT_DEGRADED_AFTER);
        assert_eq!(config.retention_days, None);
    }

    #[test]
    fn test_check_services_and_global_flags() {
        let args = parse(&[
            "stacktune",
            "check",
            "--service",
            "search=10.0.0.2:9200",
            "--service",
            "shipper=10.0.0.3:5066",
            "--output-format",
            "json",
            "-q",
        ]);
        let config = RunConfig::from_cli(&args).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[1].name, "shipper");
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(config.quiet);
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let bad_service = parse(&["stacktune", "check", "--service", "nohost"]);
        assert!(RunConfig::from_cli(&bad_service).is_err());

        let zero_retention = parse(&["stacktune", "check", "--retention-days", "0"]);
        assert!(RunConfig::from_cli(&zero_retention).is_err());

        let inverted = parse(&[
            "stacktune", "check", "--connect-timeout", "1s", "--degraded-after", "2s",
        ]);
        assert!(RunConfig::from_cli(&inverted).is_err());
    }
}
