mod api;
mod cli;
mod dataset;
mod error;
mod models;
mod services;
mod utils;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::models::{Scope, Season};
use crate::services::Metric;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "plstats")]
#[command(about = "Premier League match statistics, rankings and hypothesis tests")]
struct Cli {
    /// Path to the match CSV (falls back to PLSTATS_DATASET, then data/england.csv)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Rows to analyse
    #[arg(long, global = true, value_enum, default_value_t = Scope::Full)]
    scope: Scope,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset summary
    Overview,
    /// Per-season average of a metric
    Seasons {
        #[arg(short, long, value_enum, default_value_t = Metric::Goals)]
        metric: Metric,
        /// First season to include, e.g. 2005/06
        #[arg(long)]
        from: Option<Season>,
    },
    /// Teams ranked by a metric
    TopTeams {
        #[arg(short, long, value_enum, default_value_t = Metric::Goals)]
        metric: Metric,
        #[arg(long)]
        from: Option<Season>,
        #[arg(short, long, default_value = "15")]
        limit: usize,
    },
    /// Frequency of each per-match value of a metric
    Distribution {
        #[arg(short, long, value_enum, default_value_t = Metric::Goals)]
        metric: Metric,
        #[arg(long)]
        from: Option<Season>,
    },
    /// Champions t-test, home advantage z-test and shots/goals correlation
    Tests,
    /// List every team in the slice
    Teams,
    /// Query team statistics
    Team {
        #[arg(short, long)]
        name: String,
    },
    /// Direct meetings between two teams
    HeadToHead {
        #[arg(long)]
        team: String,
        #[arg(long)]
        opponent: String,
    },
    /// Side-by-side team profiles
    Compare {
        #[arg(long)]
        first: String,
        #[arg(long)]
        second: String,
    },
    /// Start the API server
    Serve {
        /// Listening port (falls back to PLSTATS_PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn resolve_port(flag: Option<u16>) -> Result<u16> {
    match flag {
        Some(port) => Ok(port),
        None => match std::env::var("PLSTATS_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PLSTATS_PORT '{}' is not a valid port", raw)),
            Err(_) => Ok(DEFAULT_PORT),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let path = dataset::dataset_path(cli.data);
    tracing::info!("Loading matches from {}", path.display());
    let table = dataset::global(&path)?;

    let ctx = cli::Context {
        table,
        scope: cli.scope,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Overview) | None => cli::show_overview(&ctx)?,
        Some(Commands::Seasons { metric, from }) => cli::show_seasons(&ctx, metric, from)?,
        Some(Commands::TopTeams { metric, from, limit }) => cli::show_top_teams(&ctx, metric, from, limit)?,
        Some(Commands::Distribution { metric, from }) => cli::show_distribution(&ctx, metric, from)?,
        Some(Commands::Tests) => cli::show_tests(&ctx)?,
        Some(Commands::Teams) => cli::show_teams(&ctx)?,
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::show_team(&ctx, &name)?;
        }
        Some(Commands::HeadToHead { team, opponent }) => cli::show_head_to_head(&ctx, &team, &opponent)?,
        Some(Commands::Compare { first, second }) => cli::show_compare(&ctx, &first, &second)?,
        Some(Commands::Serve { port }) => {
            let port = resolve_port(port)?;
            tracing::info!("Starting plstats API server on port {}", port);
            api::serve(table, port).await?;
        }
    }

    Ok(())
}
