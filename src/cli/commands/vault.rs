use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_VAULT_URL: &str = "vault-url";
pub const ARG_VAULT_ROLE_ID: &str = "vault-role-id";
pub const ARG_VAULT_SECRET_ID: &str = "vault-secret-id";
pub const ARG_VAULT_WRAPPED_TOKEN: &str = "vault-wrapped-token";
pub const ARG_VAULT_DB_ROLE: &str = "vault-db-role";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VAULT_URL)
                .long(ARG_VAULT_URL)
                .help("Vault approle login URL, example: https://vault.tld:8200/v1/auth/<approle>/login")
                .long_help(
                    "Vault approle login URL. When set, the database username/password are leased from Vault and injected into the DSN.",
                )
                .env("BHUMI_VAULT_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_VAULT_ROLE_ID)
                .long(ARG_VAULT_ROLE_ID)
                .help("Vault role id")
                .env("BHUMI_VAULT_ROLE_ID")
                .global(true)
                .requires(ARG_VAULT_URL),
        )
        .arg(
            Arg::new(ARG_VAULT_SECRET_ID)
                .long(ARG_VAULT_SECRET_ID)
                .help("Vault secret id")
                .env("BHUMI_VAULT_SECRET_ID")
                .global(true)
                .conflicts_with(ARG_VAULT_WRAPPED_TOKEN),
        )
        .arg(
            Arg::new(ARG_VAULT_WRAPPED_TOKEN)
                .long(ARG_VAULT_WRAPPED_TOKEN)
                .help("Vault wrapped token")
                .env("BHUMI_VAULT_WRAPPED_TOKEN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_VAULT_DB_ROLE)
                .long(ARG_VAULT_DB_ROLE)
                .help("Vault database secrets engine role")
                .env("BHUMI_VAULT_DB_ROLE")
                .default_value("bhumi")
                .global(true),
        )
}

/// How to obtain the Vault secret id.
#[derive(Debug)]
pub enum SecretSource {
    SecretId(SecretString),
    WrappedToken(SecretString),
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub role_id: String,
    pub secret: SecretSource,
    pub db_role: String,
}

impl Options {
    /// `None` when no Vault URL is configured.
    ///
    /// # Errors
    /// Returns an error if a Vault URL is set but the AppRole arguments are incomplete.
    pub fn parse(matches: &ArgMatches) -> Result<Option<Self>> {
        let Some(url) = matches.get_one::<String>(ARG_VAULT_URL).cloned() else {
            return Ok(None);
        };

        let role_id = matches
            .get_one::<String>(ARG_VAULT_ROLE_ID)
            .cloned()
            .context("missing required argument: --vault-role-id")?;

        let secret = if let Some(wrapped) = matches.get_one::<String>(ARG_VAULT_WRAPPED_TOKEN) {
            SecretSource::WrappedToken(SecretString::from(wrapped.clone()))
        } else {
            let secret_id = matches
                .get_one::<String>(ARG_VAULT_SECRET_ID)
                .cloned()
                .context("missing required argument: --vault-secret-id or --vault-wrapped-token")?;
            SecretSource::SecretId(SecretString::from(secret_id))
        };

        let db_role = matches
            .get_one::<String>(ARG_VAULT_DB_ROLE)
            .cloned()
            .unwrap_or_else(|| "bhumi".to_string());

        Ok(Some(Self {
            url,
            role_id,
            secret,
            db_role,
        }))
    }
}
