//! Hospital Surge Predictor CLI
//!
//! A command-line tool for training the surge model, running predictions
//! locally or against a surge agent, and exporting synthetic training data.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::{generate, model, predict, scenarios, train};
use std::path::PathBuf;
use surge_engine::EngineConfig;
use tracing_subscriber::EnvFilter;

/// Hospital Surge Predictor CLI
#[derive(Parser)]
#[command(name = "surge")]
#[command(author, version, about = "CLI for the Hospital Surge Predictor", long_about = None)]
pub struct Cli {
    /// Agent URL for --remote commands (can also be set via SURGE_API_URL env var)
    #[arg(long, env = "SURGE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the local model (can also be set via SURGE_MODEL_DIR env var)
    #[arg(long, env = "SURGE_MODEL_DIR", global = true)]
    pub model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Synthetic rows to train on or export
    #[arg(long, global = true)]
    pub samples: Option<usize>,

    /// Trees in the random forest when training locally
    #[arg(long, global = true)]
    pub trees: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a new surge model
    Train {
        /// Ask the agent to retrain instead of training locally
        #[arg(long)]
        remote: bool,
    },

    /// Predict surge risk from a situational report
    Predict {
        /// Free-text report (air quality, events, occupancy, health trends)
        text: String,

        /// Reference date for calendar features (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Send the report to the agent instead of predicting locally
        #[arg(long)]
        remote: bool,
    },

    /// Run the built-in low, high and moderate risk scenarios
    Scenarios {
        /// Reference date for calendar features (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Export the synthetic training table as CSV
    Generate {
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Generator seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the current model and its evaluation
    Model {
        /// Query the agent instead of the local model directory
        #[arg(long)]
        remote: bool,
    },
}

/// Flags merged over the config file
struct Settings {
    api_url: String,
    format: output::OutputFormat,
    engine: EngineConfig,
}

impl Settings {
    fn resolve(cli: &Cli, file: config::Config) -> Self {
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            model_dir: cli
                .model_dir
                .clone()
                .or(file.model_dir)
                .unwrap_or(defaults.model_dir.clone()),
            training_samples: cli
                .samples
                .or(file.training_samples)
                .unwrap_or(defaults.training_samples),
            n_estimators: cli
                .trees
                .or(file.n_estimators)
                .unwrap_or(defaults.n_estimators),
            ..defaults
        };

        let format = cli
            .format
            .or_else(|| {
                file.default_format
                    .as_deref()
                    .and_then(output::OutputFormat::parse_name)
            })
            .unwrap_or_default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or(file.api_url)
                .unwrap_or_else(|| config::DEFAULT_API_URL.to_string()),
            format,
            engine,
        }
    }

    fn client(&self) -> Result<client::ApiClient> {
        client::ApiClient::new(&self.api_url)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("surge_engine=debug,surge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(&cli, config::Config::load()?);
    let format = settings.format;

    match cli.command {
        Commands::Train { remote: true } => {
            train::train_remote(&settings.client()?, format).await?;
        }
        Commands::Train { remote: false } => {
            train::train_local(settings.engine, format).await?;
        }
        Commands::Predict { text, date, remote } => {
            if remote {
                predict::predict_remote(&settings.client()?, &text, date, format).await?;
            } else {
                predict::predict_local(settings.engine, &text, date, format).await?;
            }
        }
        Commands::Scenarios { date } => {
            scenarios::run(settings.engine, date, format).await?;
        }
        Commands::Generate { output, seed } => {
            let samples = settings.engine.training_samples;
            let seed = seed.unwrap_or(settings.engine.data_seed);
            generate::export(samples, seed, output.as_deref())?;
        }
        Commands::Model { remote } => {
            if remote {
                model::show_remote(&settings.client()?, format).await?;
            } else {
                model::show_local(&settings.engine.model_dir, format)?;
            }
        }
    }

    Ok(())
}
