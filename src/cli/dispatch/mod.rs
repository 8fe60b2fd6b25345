//! Map validated CLI arguments to an [`Action`].

use crate::cli::actions::{database, reset, seed, Action};
use crate::cli::commands::{
    vault, ARG_ADMIN_EMAIL, ARG_ADMIN_NAME, ARG_ADMIN_PHONE, ARG_BCRYPT_COST, ARG_DSN, ARG_EMAIL,
    ARG_PASSWORD, CMD_RESET_PASSWORD, CMD_SEED,
};
use crate::credentials::hasher::DEFAULT_COST;
use crate::reset::ResetConfig;
use crate::seed::SeedConfig;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn database_args(matches: &clap::ArgMatches) -> Result<database::Args> {
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    Ok(database::Args {
        dsn: SecretString::from(dsn),
        vault: vault::Options::parse(matches)?,
    })
}

fn required(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_SEED, sub_m)) => {
            let mut config = SeedConfig::new(&required(sub_m, ARG_ADMIN_EMAIL)?);
            config.admin_name = required(sub_m, ARG_ADMIN_NAME)?;
            config.admin_phone = required(sub_m, ARG_ADMIN_PHONE)?;
            config.validate()?;

            Ok(Action::Seed(seed::Args {
                database: database_args(sub_m)?,
                config,
            }))
        }
        Some((CMD_RESET_PASSWORD, sub_m)) => {
            let config = ResetConfig::new(
                &required(sub_m, ARG_EMAIL)?,
                SecretString::from(required(sub_m, ARG_PASSWORD)?),
            );
            config.validate()?;

            Ok(Action::ResetPassword(reset::Args {
                database: database_args(sub_m)?,
                config,
                bcrypt_cost: sub_m
                    .get_one::<u32>(ARG_BCRYPT_COST)
                    .copied()
                    .unwrap_or(DEFAULT_COST),
            }))
        }
        _ => Err(anyhow!("missing subcommand: expected `seed` or `reset-password`")),
    }
}
