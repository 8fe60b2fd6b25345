use crate::cli::commands::vault::{Options as VaultOptions, SecretSource};
use crate::store::PgStore;
use crate::vault;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// Where to find the database.
#[derive(Debug)]
pub struct Args {
    pub dsn: SecretString,
    pub vault: Option<VaultOptions>,
}

/// Resolve the final DSN, leasing credentials from Vault when configured.
///
/// # Errors
/// Returns an error if Vault login or the credential lease fails.
pub async fn resolve_dsn(args: &Args) -> Result<SecretString> {
    let Some(opts) = &args.vault else {
        return Ok(args.dsn.clone());
    };

    let secret_id = match &opts.secret {
        SecretSource::SecretId(secret_id) => secret_id.clone(),
        SecretSource::WrappedToken(wrapped) => vault::unwrap(&opts.url, wrapped)
            .await
            .context("failed to unwrap Vault secret id")?,
    };

    let token = vault::approle_login(&opts.url, &opts.role_id, &secret_id)
        .await
        .context("Vault AppRole login failed")?;

    let creds = vault::database::database_creds(&opts.url, &token, &opts.db_role)
        .await
        .context("failed to lease database credentials from Vault")?;

    info!(
        "using Vault database lease {} ({}s)",
        creds.lease_id, creds.lease_duration
    );

    creds.apply_to_dsn(args.dsn.expose_secret())
}

/// Connect to the credential store. A connection failure is fatal.
///
/// # Errors
/// Returns an error if the DSN cannot be resolved or the database is unreachable.
pub async fn connect(args: &Args) -> Result<PgStore> {
    let dsn = resolve_dsn(args).await?;

    let store = PgStore::connect(dsn.expose_secret())
        .await
        .context("database connection failed")?;

    debug!("credential store ready");

    Ok(store)
}
