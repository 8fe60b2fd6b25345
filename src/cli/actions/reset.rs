use crate::cli::actions::database;
use crate::credentials::PasswordHasher;
use crate::reset::{reset_password, ResetConfig};
use anyhow::{Context, Result};
use tracing::error;

#[derive(Debug)]
pub struct Args {
    pub database: database::Args,
    pub config: ResetConfig,
    pub bcrypt_cost: u32,
}

/// Execute the reset-password action.
/// # Errors
/// Returns an error if the user does not exist, hashing fails or the database fails.
pub async fn execute(args: Args) -> Result<()> {
    let hasher = PasswordHasher::new(args.bcrypt_cost).context("invalid bcrypt cost")?;

    let store = database::connect(&args.database).await?;

    let result = reset_password(&store, &hasher, &args.config).await;

    store.close().await;

    match result {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) => {
            error!("Error resetting password: {}", e);
            Err(e).context("password reset failed")
        }
    }
}
