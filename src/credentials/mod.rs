pub mod error;
pub mod hasher;

pub use self::error::{CredentialError, HashingError};
pub use self::hasher::{is_placeholder, PasswordHasher, PLACEHOLDER_HASH};

use chrono::{DateTime, Utc};
use regex::Regex;
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    Standard,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "standard" => Ok(Self::Standard),
            other => Err(CredentialError::InvalidRole(other.to_string())),
        }
    }
}

/// A row of the `users` collection.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserCredential {
    /// Build a new, not yet persisted record. The email is normalized.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: &str,
        phone: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: normalize_email(email),
            phone: phone.into(),
            password_hash: password_hash.into(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// True while the record still carries the seed placeholder.
    #[must_use]
    pub fn has_placeholder_password(&self) -> bool {
        is_placeholder(&self.password_hash)
    }
}

// Hand-written so the hash never ends up in logs.
impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Normalize an email for lookups and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
