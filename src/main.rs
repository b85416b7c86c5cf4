//! StackTune CLI - resource planning and health alerts for a log-analytics stack

use clap::Parser;
use serde::Serialize;
use stacktune::config::{CliArgs, Commands, LogFormat, OutputFormat, RunConfig};
use stacktune::emit::EnvManifest;
use stacktune::error::Result;
use stacktune::monitor::{evaluate, resolve, AlertThresholds, Evaluation, MetricSnapshot, MetricUnavailable};
use stacktune::plan::{classify, retention_days, HardwareFacts, ParameterPlanner, PlanReport, Tier};
use stacktune::system::{FactCollector, MetricSampler, TcpProbe};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Exit code when `check` finds at least one critical alert
const EXIT_CRITICAL: i32 = 2;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    init_logging(&args);

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = RunConfig::from_cli(&args)?;

    if args.verbose > 0 && !config.quiet && config.output_format == OutputFormat::Text {
        print_config(&config);
    }

    match &args.command {
        Commands::Facts { save, .. } => cmd_facts(&config, save.as_deref()),
        Commands::Plan { .. } => cmd_plan(&config),
        Commands::Thresholds { .. } => cmd_thresholds(&config),
        Commands::Check { .. } => cmd_check(&config),
    }
}

fn load_facts(config: &RunConfig) -> Result<HardwareFacts> {
    match &config.facts_file {
        Some(path) => {
            tracing::info!("Loading facts from {:?}", path);
            HardwareFacts::load(path)
        }
        None => Ok(FactCollector::new(&config.data_path).collect()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_facts(config: &RunConfig, save: Option<&Path>) -> Result<()> {
    let facts = FactCollector::new(&config.data_path).collect();

    if let Some(path) = save {
        facts.save(path)?;
        tracing::info!("Saved facts to {:?}", path);
    }

    if config.quiet {
        return Ok(());
    }
    match config.output_format {
        OutputFormat::Text => {
            facts.print_summary();
            println!("Tier:        {}", classify(&facts));
            Ok(())
        }
        OutputFormat::Json => print_json(&facts),
    }
}

fn cmd_plan(config: &RunConfig) -> Result<()> {
    let facts = load_facts(config)?;
    let tier = classify(&facts);
    let planner = ParameterPlanner::new(config.planner);
    let report = planner.plan_with_report(&facts, tier)?;

    let written = match &config.emit_dir {
        Some(dir) => Some(EnvManifest::from_params(&report.parameters).write_to(dir)?),
        None => None,
    };

    if config.quiet {
        return Ok(());
    }
    match config.output_format {
        OutputFormat::Text => {
            print_plan(&report);
            if let Some(path) = written {
                println!("\nManifest written to {}", path.display());
            }
            Ok(())
        }
        OutputFormat::Json => print_json(&report),
    }
}

fn print_plan(report: &PlanReport) {
    report.parameters.print_summary();
    if !report.substitutions.is_empty() {
        println!("\nAssumed facts:");
        for substitution in &report.substitutions {
            println!("  {}", substitution);
        }
    }
}

#[derive(Serialize)]
struct ThresholdReport {
    tier: Tier,
    thresholds: AlertThresholds,
}

fn cmd_thresholds(config: &RunConfig) -> Result<()> {
    let facts = load_facts(config)?;
    let report = ThresholdReport {
        tier: classify(&facts),
        thresholds: resolve(&facts),
    };

    if config.quiet {
        return Ok(());
    }
    match config.output_format {
        OutputFormat::Text => {
            report.thresholds.print_summary();
            println!("\nTier:            {}", report.tier);
            Ok(())
        }
        OutputFormat::Json => print_json(&report),
    }
}

#[derive(Serialize)]
struct CheckReport {
    thresholds: AlertThresholds,
    retention_days: u32,
    snapshot: MetricSnapshot,
    unavailable: Vec<MetricUnavailable>,
    evaluation: Evaluation,
}

fn cmd_check(config: &RunConfig) -> Result<()> {
    let facts = load_facts(config)?;
    let thresholds = resolve(&facts);
    let retention = config
        .retention_days
        .unwrap_or_else(|| retention_days(facts.available_space_gb));

    let (snapshot, unavailable) = match &config.metrics_file {
        Some(path) => {
            tracing::info!("Loading metrics from {:?}", path);
            MetricSnapshot::load(path)?
        }
        None => {
            let probe = TcpProbe::new(config.connect_timeout, config.degraded_after);
            MetricSampler::with_probe(&config.data_path, config.services.clone(), probe).sample()
        }
    };

    let evaluation = evaluate(&snapshot, &thresholds, retention);
    let critical = evaluation.has_critical();

    if !config.quiet {
        match config.output_format {
            OutputFormat::Text => {
                evaluation.print_summary();
                for missing in &unavailable {
                    println!("  note: {}", missing);
                }
            }
            OutputFormat::Json => print_json(&CheckReport {
                thresholds,
                retention_days: retention,
                snapshot,
                unavailable,
                evaluation,
            })?,
        }
    }

    if critical {
        std::process::exit(EXIT_CRITICAL);
    }

    Ok(())
}

fn print_config(config: &RunConfig) {
    println!("=== Configuration ===");
    println!("Data path:       {:?}", config.data_path);
    if let Some(ref facts) = config.facts_file {
        println!("Facts file:      {:?}", facts);
    }
    if let Some(ref metrics) = config.metrics_file {
        println!("Metrics file:    {:?}", metrics);
    }
    println!("Min free space:  {} GB", config.planner.min_available_space_gb);
    if let Some(ref dir) = config.emit_dir {
        println!("Emit to:         {:?}", dir);
    }
    println!("Connect timeout: {}", humantime::format_duration(config.connect_timeout));
    println!("Degraded after:  {}", humantime::format_duration(config.degraded_after));
    println!("Services:");
    for target in &config.services {
        println!("  {:<14} {}", target.name, target.address);
    }
    println!();
}
