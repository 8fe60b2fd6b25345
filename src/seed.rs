//! First-use provisioning of the user store.

use crate::credentials::{
    normalize_email, valid_email, CredentialError, Role, UserCredential, PLACEHOLDER_HASH,
};
use crate::store::{missing_indexes, CredentialStore, COLLECTIONS};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{info, instrument, warn};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@bhumiinteriorsolution.in";
pub const DEFAULT_ADMIN_NAME: &str = "Admin User";
pub const DEFAULT_ADMIN_PHONE: &str = "+91 92281 04285";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_name: String,
    pub admin_phone: String,
}

impl SeedConfig {
    #[must_use]
    pub fn new(admin_email: &str) -> Self {
        Self {
            admin_email: normalize_email(admin_email),
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns [`CredentialError::InvalidConfig`] for a malformed admin email
    /// or a blank admin name.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.admin_name.trim().is_empty() {
            return Err(CredentialError::InvalidConfig(
                "admin name must not be empty".to_string(),
            ));
        }

        if !valid_email(&self.admin_email) {
            return Err(CredentialError::InvalidConfig(format!(
                "invalid admin email: {}",
                self.admin_email
            )));
        }

        Ok(())
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_name: DEFAULT_ADMIN_NAME.to_string(),
            admin_phone: DEFAULT_ADMIN_PHONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// A placeholder admin record was inserted.
    Created,
    /// An admin record already existed and was left untouched.
    AlreadyPresent { password_set: bool },
}

#[derive(Debug, Clone)]
pub struct SeedReport {
    pub outcome: SeedOutcome,
    pub admin_email: String,
    pub collections: Vec<&'static str>,
    pub indexes: Vec<String>,
    pub admin_role: Role,
    pub admin_created_at: DateTime<Utc>,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database initialized successfully")?;
        writeln!(f, "Collections: {}", self.collections.join(", "))?;
        writeln!(f, "Indexes: {}", self.indexes.join(", "))?;
        writeln!(f, "Admin email: {}", self.admin_email)?;
        if self.admin_role != Role::Admin {
            writeln!(
                f,
                "Warning: the existing record for {} has role {}, not admin",
                self.admin_email, self.admin_role
            )?;
        }

        match self.outcome {
            SeedOutcome::Created => {
                writeln!(f, "Admin record created with a placeholder password (login disabled)")?;
                write!(
                    f,
                    "Set the real admin password via the /register endpoint or `bhumi reset-password`"
                )
            }
            SeedOutcome::AlreadyPresent { password_set: true } => write!(
                f,
                "Admin record already exists (created {}), left unchanged",
                self.admin_created_at
            ),
            SeedOutcome::AlreadyPresent {
                password_set: false,
            } => write!(
                f,
                "Admin record already exists (created {}) but still has no password; \
                 set it via the /register endpoint or `bhumi reset-password`",
                self.admin_created_at
            ),
        }
    }
}

/// Make the store ready for first use.
///
/// Collections and indexes are created before anything is inserted, and the
/// admin record is only inserted when no record with that email exists, so a
/// second run changes nothing.
///
/// # Errors
/// Any storage failure aborts the run; nothing is retried.
#[instrument(skip(store))]
pub async fn seed<S>(store: &S, config: &SeedConfig) -> Result<SeedReport, CredentialError>
where
    S: CredentialStore + ?Sized,
{
    config.validate()?;

    store.ensure_schema().await?;

    let indexes = store.indexes().await?;
    if let Some(missing) = missing_indexes(&indexes).first() {
        return Err(CredentialError::IndexMissing((*missing).to_string()));
    }

    info!("schema ready, indexes: {:?}", indexes);

    let (outcome, admin_role, admin_created_at) = match store
        .find_by_email(&config.admin_email)
        .await?
    {
        Some(existing) => {
            if existing.role == Role::Admin {
                info!("admin {} already present, leaving it untouched", existing.email);
            } else {
                warn!(
                    "{} already exists with role {}, leaving it untouched",
                    existing.email, existing.role
                );
            }
            (
                SeedOutcome::AlreadyPresent {
                    password_set: !existing.has_placeholder_password(),
                },
                existing.role,
                existing.created_at,
            )
        }
        None => {
            let admin = UserCredential::new(
                config.admin_name.as_str(),
                &config.admin_email,
                config.admin_phone.as_str(),
                PLACEHOLDER_HASH,
                Role::Admin,
            );
            store.create(&admin).await?;

            info!("admin {} created with placeholder password", admin.email);
            (SeedOutcome::Created, admin.role, admin.created_at)
        }
    };

    Ok(SeedReport {
        outcome,
        admin_email: normalize_email(&config.admin_email),
        collections: COLLECTIONS.to_vec(),
        indexes,
        admin_role,
        admin_created_at,
    })
}
