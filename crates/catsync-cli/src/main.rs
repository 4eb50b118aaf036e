mod state;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::state::StateCommands;

#[derive(Debug, Parser)]
#[command(name = "catsync")]
#[command(about = "Supplier catalog to Shopify sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a supplier feed and push it to the store
    Sync {
        /// Supplier name as configured in suppliers.yaml
        #[arg(long)]
        supplier: String,

        /// Parse, group and price the feed without calling the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or reset persisted per-supplier state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("no command given; run `catsync --help` for usage");
        return Ok(());
    };

    let config = catsync_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Sync { supplier, dry_run } => {
            let suppliers = catsync_core::load_suppliers(&config.suppliers_path)?;
            let supplier = suppliers
                .find(&supplier)
                .ok_or_else(|| anyhow::anyhow!("supplier '{supplier}' not found in suppliers file"))?;
            sync::run_sync(&config, supplier, dry_run).await?;
        }
        Commands::State { command } => state::run_state(&config, command)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
