mod args;
mod commands;
mod context;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use eventmap_core::EventMapConfig;
use tracing_subscriber::EnvFilter;

use crate::args::FilterArgs;
use crate::context::Context;

#[derive(Parser)]
#[command(name = "eventmap")]
#[command(about = "Find events near you and keep track of the ones you like")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load events around a city from the endpoint
    Fetch {
        /// City key from the config (defaults to default_city)
        #[arg(short, long)]
        city: Option<String>,

        /// Fetch even if the area was loaded before
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show cached events without contacting the endpoint
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Drop cached events
    Refresh,
    /// Save an event
    Save { id: String },
    /// Remove an event from saved events
    Unsave { id: String },
    /// List saved events
    Saved,
    /// Browse the map interactively
    Explore {
        #[arg(short, long)]
        city: Option<String>,
    },
    /// Print the config file location
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Config = cli.command {
        println!("{}", EventMapConfig::config_path()?.display());
        return Ok(());
    }

    let ctx = Context::load()?;

    match cli.command {
        Commands::Fetch {
            city,
            force,
            filters,
        } => commands::fetch::run(&ctx, city.as_deref(), &filters, force).await,
        Commands::List { filters } => commands::list::run(&ctx, &filters),
        Commands::Refresh => commands::refresh::run(&ctx),
        Commands::Save { id } => commands::saved::save(&ctx, &id),
        Commands::Unsave { id } => commands::saved::unsave(&ctx, &id),
        Commands::Saved => commands::saved::list(&ctx),
        Commands::Explore { city } => commands::explore::run(&ctx, city.as_deref()).await,
        Commands::Config => Ok(()),
    }
}
