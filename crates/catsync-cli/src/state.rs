//! `catsync state`: read and reset the per-supplier files written by sync runs.

use catsync_core::AppConfig;
use catsync_engine::{JsonFileStore, StateStore};
use clap::Subcommand;

/// Sub-commands available under `state`.
#[derive(Debug, Subcommand)]
pub enum StateCommands {
    /// Print the resume cursor and image cache counts for a supplier
    Show {
        #[arg(long)]
        supplier: String,
    },
    /// Delete the resume cursor so the next run starts from the first product
    ResetProgress {
        #[arg(long)]
        supplier: String,
    },
}

/// # Errors
///
/// Returns an error if the state files exist but cannot be read, parsed or
/// removed.
pub(crate) fn run_state(config: &AppConfig, command: StateCommands) -> anyhow::Result<()> {
    match command {
        StateCommands::Show { supplier } => {
            let store = JsonFileStore::for_supplier(&config.state_dir, &supplier);
            let entries = store.load_entries()?;
            let cursor = store.load_cursor()?;

            let uploaded = entries.values().filter(|e| e.uploaded).count();
            let invalid = entries
                .values()
                .filter(|e| e.validation.as_ref().is_some_and(|v| !v.valid))
                .count();

            println!("supplier: {supplier}");
            println!("cache file: {}", store.cache_path().display());
            println!("images known: {}", entries.len());
            println!("images uploaded: {uploaded}");
            println!("images invalid: {invalid}");
            match cursor {
                Some(key) => println!("resume after: {key}"),
                None => println!("resume after: (none, next run starts from the beginning)"),
            }
        }
        StateCommands::ResetProgress { supplier } => {
            let store = JsonFileStore::for_supplier(&config.state_dir, &supplier);
            store.clear_cursor()?;
            tracing::info!(supplier = %supplier, path = %store.progress_path().display(), "progress cursor cleared");
            println!("cleared resume cursor for {supplier}");
        }
    }
    Ok(())
}
