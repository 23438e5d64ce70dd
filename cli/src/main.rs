mod commands;
mod config;
mod openfoodfacts;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{cmd_lookup, cmd_session, parse_date};
use crate::config::Config;
use crate::openfoodfacts::OpenFoodFactsClient;
use bite_core::ledger::DayLedger;
use bite_core::lookup::LookupGateway;

#[derive(Parser)]
#[command(
    name = "bite",
    version,
    about = "Scan food, adjust servings, watch the day add up",
    long_about = "Scan food, adjust servings, watch the day add up.\n\n\
        Runs an interactive session by default. Entries live for the length of the session."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive logging session (default)
    Session {
        /// Day to start on (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Look up a barcode in `OpenFoodFacts` without logging it
    Lookup {
        /// Barcode number
        barcode: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(path = %config.config_path.display(), url = %config.lookup.base_url, "config loaded");
    let off: Arc<dyn LookupGateway> = Arc::new(OpenFoodFactsClient::new(&config.lookup)?);

    match cli.command.unwrap_or(Commands::Session { date: None }) {
        Commands::Session { date } => {
            let date = parse_date(date.as_deref())?;
            let ledger = DayLedger::with_meals(date, config.meals).into_shared();
            cmd_session(ledger, off, config.goals).await
        }
        Commands::Lookup { barcode, json } => cmd_lookup(off.as_ref(), &barcode, json).await,
    }
}
