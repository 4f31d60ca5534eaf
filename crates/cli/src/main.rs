//! Water Quality Prediction CLI
//!
//! A command-line tool for requesting water quality predictions,
//! probing the prediction service and troubleshooting connectivity.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commands::{batch, health, predict};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wq_lib::{PredictionClient, SensorReading};

/// Water Quality Prediction CLI
#[derive(Parser)]
#[command(name = "wqc")]
#[command(author, version, about = "CLI for the Water Quality Prediction Service", long_about = None)]
pub struct Cli {
    /// Prediction service URL (can also be set via ML_SERVICE_URL env var)
    #[arg(long, env = "ML_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Path to the CLI config file
    #[arg(long, env = "WQC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict water quality for a single sensor reading
    Predict(ReadingArgs),

    /// Predict water quality for every reading in a JSON file
    Batch {
        /// File holding a JSON array of readings or {"readings": [...]}
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Check prediction service health
    Health,

    /// Run a connection self-test against the prediction service
    Diagnose,

    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Sensor values for a single reading
#[derive(Args, Debug, Clone)]
pub struct ReadingArgs {
    /// pH value
    #[arg(long)]
    pub ph: Option<f64>,

    /// pH value under its alternate name (used when --ph is absent)
    #[arg(long)]
    pub ph_level: Option<f64>,

    /// Water temperature in °C
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Turbidity in NTU
    #[arg(long)]
    pub turbidity: Option<f64>,

    /// Dissolved oxygen in mg/L
    #[arg(long)]
    pub dissolved_oxygen: Option<f64>,

    /// Pond identifier
    #[arg(long)]
    pub pond_id: Option<i64>,
}

impl From<ReadingArgs> for SensorReading {
    fn from(args: ReadingArgs) -> Self {
        SensorReading {
            ph: args.ph.map(Value::from),
            ph_level: args.ph_level.map(Value::from),
            temperature: args.temperature.map(Value::from),
            turbidity: args.turbidity.map(Value::from),
            dissolved_oxygen: args.dissolved_oxygen.map(Value::from),
            pond_id: args.pond_id.map(Value::from),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Store settings in the config file
    Set {
        /// Prediction service URL to use by default
        #[arg(long)]
        service_url: Option<String>,

        /// Default output format
        #[arg(long)]
        format: Option<output::OutputFormat>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::Config::default_path()?,
    };
    let file_config = config::Config::load(&config_path)?;
    let format = cli.format.or(file_config.format).unwrap_or_default();

    let service_url = cli.service_url.as_deref();

    // Execute command
    let ok = match cli.command {
        Commands::Predict(args) => {
            let client = connect(service_url, &file_config)?;
            predict::predict(&client, args.into(), format).await?
        }
        Commands::Batch { file } => {
            let client = connect(service_url, &file_config)?;
            batch::predict_batch(&client, &file, format).await?
        }
        Commands::Health => health::health(&connect(service_url, &file_config)?, format).await?,
        Commands::Diagnose => {
            health::diagnose(&connect(service_url, &file_config)?, format).await?
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => {
                commands::config::show(&config_path, &file_config, service_url, format)?;
                true
            }
            ConfigCommands::Set {
                service_url,
                format: new_format,
            } => {
                commands::config::set(&config_path, file_config, service_url, new_format)?;
                true
            }
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

/// Build the prediction client from flag, env, config file or default
fn connect(service_url: Option<&str>, file_config: &config::Config) -> Result<PredictionClient> {
    let client_config = config::resolve_client_config(service_url, file_config)?;
    debug!(service_url = %client_config.service_url, "Using prediction service");
    PredictionClient::new(&client_config).context("Failed to create prediction client")
}
