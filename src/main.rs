use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use waveplan::config::Config;
use waveplan::{DagAnalysis, Result};

/// Waveplan - DAG wave planning and cost governance for delivery agents
#[derive(Parser, Debug)]
#[command(name = "waveplan")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    WAVEPLAN_DEBUG=1        Enable debug logging (alternative to --debug)\n    MAX_COST_PER_HOUR       Override the governor's hourly cost budget\n    MAX_REQUESTS_PER_HOUR   Override the governor's hourly request budget\n    COOLDOWN_MINUTES        Override the circuit cooldown\n    WARNING_THRESHOLD       Override the warning ratio (0-1)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.waveplan/waveplan.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Plan waves, critical path and efficiency for a JSON task list
    Plan {
        /// Path to a JSON array of tasks
        tasks: PathBuf,

        /// Also save the analysis as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the analysis as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Price a metered call with the configured price table
    Price {
        /// Service or model tag
        #[arg(long)]
        service: String,

        /// Input units (e.g. prompt tokens)
        #[arg(long = "input", default_value_t = 0)]
        units_in: u64,

        /// Output units (e.g. completion tokens)
        #[arg(long = "output", default_value_t = 0)]
        units_out: u64,
    },

    /// Show the effective governor configuration (file + environment)
    Config {
        /// Save the effective configuration to ~/.waveplan/waveplan.toml
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    waveplan::log::init_with_debug(cli.debug);

    if let Err(err) = run(cli.command) {
        tracing::error!(error = %err, "command failed");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Plan {
            tasks,
            output,
            json,
        } => run_plan(tasks, output, json),
        Command::Price {
            service,
            units_in,
            units_out,
        } => run_price(&service, units_in, units_out),
        Command::Config { write } => run_config(write),
    }
}

fn run_plan(tasks: PathBuf, output: Option<PathBuf>, json: bool) -> Result<()> {
    tracing::info!(path = %tasks.display(), "planning task list");
    let analysis = DagAnalysis::from_json(&fs::read_to_string(&tasks)?)?;

    if json {
        println!("{}", analysis.to_json_pretty()?);
    } else {
        println!("{}", analysis);
    }

    if let Some(path) = output {
        fs::write(&path, analysis.to_json_pretty()?)?;
        println!();
        println!("Results saved to: {}", path.display());
    }
    Ok(())
}

fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.governor = config.governor.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn run_price(service: &str, units_in: u64, units_out: u64) -> Result<()> {
    let pricing = load_config()?.effective_pricing();
    if !pricing.is_known(service) {
        println!(
            "Unknown service '{}', priced as '{}'",
            service, pricing.default_service
        );
    }
    println!("{:.6}", pricing.cost(service, units_in, units_out));
    Ok(())
}

fn run_config(write: bool) -> Result<()> {
    let config = load_config()?;
    if write {
        config.save()?;
        println!("Saved to: {}", Config::config_path()?.display());
        println!();
    }
    let governor = config.governor;
    println!("max_cost_per_hour     = {}", governor.max_cost_per_hour);
    println!("max_requests_per_hour = {}", governor.max_requests_per_hour);
    println!("cooldown_minutes      = {}", governor.cooldown_minutes);
    println!("warning_threshold     = {}", governor.warning_threshold);

    let pricing = config.effective_pricing();
    println!();
    println!("pricing (per 1M units, default: {})", pricing.default_service);
    for (service, price) in &pricing.services {
        println!("  {:<28} in {:>8.2}  out {:>8.2}", service, price.input, price.output);
    }
    Ok(())
}
