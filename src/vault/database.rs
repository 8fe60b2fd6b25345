use crate::vault;
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

/// A leased database account.
#[derive(Debug)]
pub struct DatabaseCreds {
    pub lease_id: String,
    pub lease_duration: u64,
    pub username: String,
    pub password: SecretString,
}

impl DatabaseCreds {
    /// Return `dsn` with this account's username and password.
    ///
    /// # Errors
    /// Returns an error if `dsn` is not a URL that can carry credentials.
    pub fn apply_to_dsn(&self, dsn: &str) -> Result<SecretString> {
        let mut dsn = Url::parse(dsn)?;

        dsn.set_username(&self.username)
            .map_err(|()| anyhow!("Error setting username"))?;

        dsn.set_password(Some(self.password.expose_secret()))
            .map_err(|()| anyhow!("Error setting password"))?;

        Ok(SecretString::from(dsn.to_string()))
    }
}

/// Get DB credentials from the `database/creds/<role>` endpoint.
///
/// # Errors
/// Returns an error if Vault rejects the request or a field is missing.
#[instrument(skip(token))]
pub async fn database_creds(vault_url: &str, token: &SecretString, role: &str) -> Result<DatabaseCreds> {
    let db_creds = vault::endpoint_url(vault_url, &format!("/v1/database/creds/{role}"))?;

    let response = vault::client()?
        .get(db_creds.as_str())
        .header("X-Vault-Token", token.expose_secret())
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(vault::error_from(&db_creds, response).await);
    }

    let json_response: Value = response.json().await?;

    let creds = parse_creds(&json_response)?;

    debug!(
        "leased database user {} for {} seconds",
        creds.username, creds.lease_duration
    );

    Ok(creds)
}

fn parse_creds(json_response: &Value) -> Result<DatabaseCreds> {
    let lease_id = json_response["lease_id"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no lease_id found"))?;

    let lease_duration = json_response["lease_duration"]
        .as_u64()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no lease_duration found"))?;

    let username = json_response["data"]["username"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no username found"))?;

    let password = json_response["data"]["password"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no password found"))?;

    Ok(DatabaseCreds {
        lease_id: lease_id.to_string(),
        lease_duration,
        username: username.to_string(),
        password: SecretString::from(password.to_string()),
    })
}
