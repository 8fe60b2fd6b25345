//! Database credentials from Vault.
//!
//! When a Vault URL is configured the DSN carries no user or password; the
//! tool logs in with AppRole and asks the database secrets engine for a
//! short-lived account instead.

pub mod database;

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

/// Build `scheme://host:port{endpoint}` from the configured login URL.
///
/// # Errors
/// Returns an error if the URL has no host or an unsupported scheme.
#[instrument]
pub fn endpoint_url(vault_url: &str, endpoint: &str) -> Result<String> {
    let url = Url::parse(vault_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{endpoint}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

pub(crate) fn client() -> Result<Client> {
    Ok(Client::builder().user_agent(APP_USER_AGENT).build()?)
}

/// Turn a non-2xx Vault response into an error carrying Vault's message.
pub(crate) async fn error_from(url: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let message = match response.json::<Value>().await {
        Ok(body) => body["errors"][0].as_str().unwrap_or_default().to_string(),
        Err(_) => String::new(),
    };

    anyhow!("{} - {}, {}", url, status, message)
}

/// Unwrap a response-wrapped secret id.
///
/// # Errors
/// Returns an error if the request fails or the response has no `secret_id`.
#[instrument(skip(token))]
pub async fn unwrap(vault_url: &str, token: &SecretString) -> Result<SecretString> {
    let unwrap_url = endpoint_url(vault_url, "/v1/sys/wrapping/unwrap")?;

    let response = client()?
        .post(&unwrap_url)
        .header("X-Vault-Token", token.expose_secret())
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_from(&unwrap_url, response).await);
    }

    let json_response: Value = response.json().await?;
    let sid = json_response["data"]["secret_id"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no secret_id found"))?;

    Ok(SecretString::from(sid.to_string()))
}

/// Login to Vault using AppRole, returns the client token.
///
/// # Errors
/// Returns an error if the login is rejected or the response has no token.
#[instrument(skip(secret_id))]
pub async fn approle_login(
    vault_url: &str,
    role_id: &str,
    secret_id: &SecretString,
) -> Result<SecretString> {
    let login_payload = json!({
        "role_id": role_id,
        "secret_id": secret_id.expose_secret(),
    });

    let response = client()?
        .post(vault_url)
        .json(&login_payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_from(vault_url, response).await);
    }

    let json_response: Value = response.json().await?;
    let token = json_response["auth"]["client_token"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no client_token found"))?;

    Ok(SecretString::from(token.to_string()))
}
