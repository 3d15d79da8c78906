//! Cadiz CLI binary.
//!
//! Drives the portfolio construction pipeline over a directory of CSV tables.

mod cmd;
mod config;
mod data;

use std::{path::PathBuf, process};

use anyhow::Result;
use cadiz_optimize::Constraint;
use cadiz_traits::InMemoryDataSource;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{cmd::optimize::OptimizeArgs, config::CadizConfig};

#[derive(Parser)]
#[command(name = "cadiz")]
#[command(about = "Factor-model portfolio construction", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding exposures.csv, covariances.csv, and assets.csv
    #[arg(long, env = "CADIZ_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// JSON configuration file
    #[arg(long, env = "CADIZ_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available signals and constraints
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build the asset covariance matrix for a date
    Covariance {
        /// Risk model date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute signal scores and alphas
    Signals {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Signals to compute (defaults to all)
        #[arg(short, long, value_delimiter = ',')]
        signals: Vec<String>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build per-signal paper portfolios from an alpha file
    Paper {
        /// Alpha CSV written by `cadiz signals`
        #[arg(short, long)]
        alphas: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Blend signal alphas into a composite alpha
    Blend {
        /// Alpha CSV written by `cadiz signals`
        #[arg(short, long)]
        alphas: PathBuf,

        /// Paper weights CSV written by `cadiz paper` (built when omitted)
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Optimize the portfolio for a date
    Optimize {
        /// Alpha CSV with `date, asset, alpha` (and optionally `name`)
        #[arg(short, long)]
        alphas: PathBuf,

        /// Alpha stream to use when the file holds several
        #[arg(short, long)]
        name: Option<String>,

        /// Portfolio date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Constraints to apply
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_values_t = [Constraint::FullInvestment, Constraint::LongOnly]
        )]
        constraints: Vec<Constraint>,

        /// Risk aversion (overrides the configuration)
        #[arg(short, long)]
        gamma: Option<f64>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        data_dir,
        config,
        command,
    } = Cli::parse();
    let load = || -> Result<(CadizConfig, InMemoryDataSource)> {
        Ok((
            CadizConfig::load(config.as_deref())?,
            data::load_source(&data_dir)?,
        ))
    };

    match command {
        Commands::List { category, verbose } => cmd::list::list(category, verbose),
        Commands::Covariance { date, output } => {
            let (_, source) = load()?;
            cmd::covariance::covariance(&source, data::parse_date(&date)?, output.as_deref())
        }
        Commands::Signals {
            start,
            end,
            signals,
            output,
        } => {
            let (config, source) = load()?;
            cmd::signals::signals(
                &source,
                &config.signals,
                &signals,
                data::parse_date(&start)?,
                data::parse_date(&end)?,
                output.as_deref(),
            )
        }
        Commands::Paper { alphas, output } => {
            let (config, source) = load()?;
            cmd::paper::paper(&source, &config, &alphas, output.as_deref())
        }
        Commands::Blend {
            alphas,
            weights,
            output,
        } => {
            let (config, source) = load()?;
            cmd::blend::blend(
                &source,
                &config,
                &alphas,
                weights.as_deref(),
                output.as_deref(),
            )
        }
        Commands::Optimize {
            alphas,
            name,
            date,
            constraints,
            gamma,
            output,
        } => {
            let (config, source) = load()?;
            cmd::optimize::optimize(
                &source,
                &config,
                OptimizeArgs {
                    alphas: &alphas,
                    name: name.as_deref(),
                    date: data::parse_date(&date)?,
                    constraints: &constraints,
                    gamma,
                    output: output.as_deref(),
                },
            )
        }
    }
}
