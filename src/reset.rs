//! Operator-driven password rotation for a single account.

use crate::credentials::{normalize_email, valid_email, CredentialError, PasswordHasher, Role};
use crate::store::CredentialStore;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::{info, instrument};

pub const DEFAULT_RESET_EMAIL: &str = "bhumiinteriorsolution@gmail.com";

#[derive(Debug)]
pub struct ResetConfig {
    pub email: String,
    pub password: SecretString,
}

impl ResetConfig {
    #[must_use]
    pub fn new(email: &str, password: SecretString) -> Self {
        Self {
            email: normalize_email(email),
            password,
        }
    }

    /// # Errors
    /// Returns [`CredentialError::InvalidConfig`] for a malformed email or an
    /// empty password.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if !valid_email(&self.email) {
            return Err(CredentialError::InvalidConfig(format!(
                "invalid email: {}",
                self.email
            )));
        }

        if self.password.expose_secret().is_empty() {
            return Err(CredentialError::InvalidConfig(
                "password must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for ResetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Password successfully reset for: {}", self.email)?;
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "Password: updated")?;
        writeln!(f, "Role: {}", self.role)?;
        write!(f, "Created: {}", self.created_at)
    }
}

/// Replace the password hash of the user identified by `config.email`.
///
/// # Errors
/// [`CredentialError::NotFound`] when no such user exists (nothing is
/// created), a hashing error for an unusable password, or any storage error.
#[instrument(skip(store, hasher), fields(email = %config.email))]
pub async fn reset_password<S>(
    store: &S,
    hasher: &PasswordHasher,
    config: &ResetConfig,
) -> Result<ResetReport, CredentialError>
where
    S: CredentialStore + ?Sized,
{
    config.validate()?;

    let mut user = store
        .find_by_email(&config.email)
        .await?
        .ok_or_else(|| CredentialError::NotFound(config.email.clone()))?;

    user.password_hash = hasher.hash(config.password.expose_secret())?;

    store.save(&mut user).await?;

    info!("password reset for {}", user.email);

    Ok(ResetReport {
        email: user.email,
        role: user.role,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })
}
