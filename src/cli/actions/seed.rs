use crate::cli::actions::database;
use crate::seed::{seed, SeedConfig};
use anyhow::{Context, Result};
use tracing::error;

#[derive(Debug)]
pub struct Args {
    pub database: database::Args,
    pub config: SeedConfig,
}

/// Execute the seed action.
/// # Errors
/// Returns an error if the database is unreachable or any seeding step fails.
pub async fn execute(args: Args) -> Result<()> {
    let store = database::connect(&args.database).await?;

    let result = seed(&store, &args.config).await;

    store.close().await;

    match result {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) => {
            error!("Error seeding database: {}", e);
            Err(e).context("seed failed")
        }
    }
}
