//! Persistence for [`UserCredential`] records.

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

use crate::credentials::{CredentialError, UserCredential};
use async_trait::async_trait;

pub const USERS: &str = "users";
pub const GALLERIES: &str = "galleries";

/// Collections created by [`CredentialStore::ensure_schema`], in creation order.
pub const COLLECTIONS: [&str; 2] = [USERS, GALLERIES];

/// An index the seed routine guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub collection: &'static str,
    pub field: &'static str,
    pub descending: bool,
    pub unique: bool,
}

pub const USERS_EMAIL_KEY: IndexSpec = IndexSpec {
    name: "users_email_key",
    collection: USERS,
    field: "email",
    descending: false,
    unique: true,
};

pub const USERS_CREATED_AT_IDX: IndexSpec = IndexSpec {
    name: "users_created_at_idx",
    collection: USERS,
    field: "created_at",
    descending: true,
    unique: false,
};

pub const GALLERIES_CREATED_AT_IDX: IndexSpec = IndexSpec {
    name: "galleries_created_at_idx",
    collection: GALLERIES,
    field: "created_at",
    descending: true,
    unique: false,
};

pub const REQUIRED_INDEXES: [IndexSpec; 3] =
    [USERS_EMAIL_KEY, USERS_CREATED_AT_IDX, GALLERIES_CREATED_AT_IDX];

/// Single-record atomic operations over the `users` collection.
///
/// Email uniqueness is the store's job: two concurrent `create` calls for the
/// same address must leave one winner and one [`CredentialError::DuplicateKey`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create the collections, then their indexes. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), CredentialError>;

    /// Names of the [`REQUIRED_INDEXES`] that currently exist.
    async fn indexes(&self) -> Result<Vec<String>, CredentialError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, CredentialError>;

    async fn create(&self, user: &UserCredential) -> Result<(), CredentialError>;

    /// Persist a mutated record and refresh its `updated_at`.
    async fn save(&self, user: &mut UserCredential) -> Result<(), CredentialError>;
}

/// Names from [`REQUIRED_INDEXES`] that are not in `present`.
#[must_use]
pub fn missing_indexes(present: &[String]) -> Vec<&'static str> {
    REQUIRED_INDEXES
        .iter()
        .map(|index| index.name)
        .filter(|name| !present.iter().any(|p| p == name))
        .collect()
}
