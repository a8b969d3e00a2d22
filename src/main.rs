use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "gauge")]
#[command(version, about = "Context budget monitor for AI agent orchestration")]
pub struct Cli {
    /// Verbose output (per-event detail during simulation)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file. Defaults to ./gauge.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default gauge.toml in the current directory
    Init {
        /// Overwrite an existing gauge.toml
        #[arg(long)]
        force: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Print the effective budget threshold table
    Thresholds,
    /// Replay a workload file through a monitored store and report
    Simulate {
        /// Path to the workload JSON file
        workload: PathBuf,

        /// Override the configured token budget
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Disable automatic remediation actions
        #[arg(long)]
        no_actions: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any problems
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let load_config = || -> Result<gauge::config::GaugeToml> {
        match &cli.config {
            Some(path) => gauge::config::GaugeToml::load(path),
            None => gauge::config::GaugeToml::load_or_default(&cwd),
        }
    };

    match &cli.command {
        Commands::Init { force } => cmd::cmd_init(&cwd, *force)?,
        Commands::Config { command } => {
            cmd::cmd_config(&cwd, cli.config.as_deref(), command.clone())?
        }
        Commands::Thresholds => cmd::cmd_thresholds(&load_config()?)?,
        Commands::Simulate {
            workload,
            max_tokens,
            no_actions,
        } => {
            let mut config = load_config()?;
            if let Some(max) = max_tokens {
                config.store.max_tokens = *max;
            }
            if *no_actions {
                config.monitor.enable_auto_actions = false;
            }
            config.validate()?;
            cmd::cmd_simulate(&config, workload, cli.verbose)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "gauge=debug" } else { "gauge=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
