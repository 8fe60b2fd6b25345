//! `sqlx` backed store.

use super::{CredentialStore, COLLECTIONS, REQUIRED_INDEXES, USERS};
use crate::credentials::{normalize_email, CredentialError, UserCredential};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, instrument, Instrument};

const UNIQUE_VIOLATION: &str = "23505";
const UNDEFINED_TABLE: &str = "42P01";

// Collections first: every index below depends on its table.
const SCHEMA: [&str; 5] = [
    r"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        name          TEXT NOT NULL DEFAULT '',
        email         TEXT NOT NULL,
        phone         TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'standard' CHECK (role IN ('admin', 'standard')),
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    r"
    CREATE TABLE IF NOT EXISTS galleries (
        id          UUID PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        image_urls  TEXT[] NOT NULL DEFAULT '{}',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)",
    "CREATE INDEX IF NOT EXISTS users_created_at_idx ON users (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS galleries_created_at_idx ON galleries (created_at DESC)",
];

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database behind `dsn`.
    ///
    /// # Errors
    /// Returns [`CredentialError::StorageConnection`] if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self, CredentialError> {
        let pool = PgPool::connect(dsn)
            .await
            .map_err(CredentialError::StorageConnection)?;

        debug!("connected to database");

        Ok(Self { pool })
    }

    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close every pooled connection so the process can exit cleanly.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_sqlstate(err, UNIQUE_VIOLATION)
}

fn has_sqlstate(err: &sqlx::Error, state: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == state),
        _ => false,
    }
}

/// Map a query failure onto the error taxonomy.
fn storage_error(err: sqlx::Error, operation: &'static str, email: &str) -> CredentialError {
    if is_unique_violation(&err) {
        return CredentialError::DuplicateKey(email.to_string());
    }

    if has_sqlstate(&err, UNDEFINED_TABLE) {
        return CredentialError::SchemaMissing(USERS.to_string());
    }

    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => CredentialError::StorageConnection(err),
        source => CredentialError::Storage { operation, source },
    }
}

fn query_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn user_from_row(row: &PgRow) -> Result<UserCredential, CredentialError> {
    let role: String = row.get("role");

    Ok(UserCredential {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        role: role.parse()?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl CredentialStore for PgStore {
    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<(), CredentialError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(query_span("CREATE", statement))
                .await
                .map_err(|err| storage_error(err, "create schema", ""))?;
        }

        debug!("collections: {:?}", COLLECTIONS);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn indexes(&self) -> Result<Vec<String>, CredentialError> {
        let query = r"
            SELECT indexname::text AS indexname FROM pg_indexes
            WHERE schemaname = current_schema() AND indexname = ANY($1)
            ORDER BY indexname
        ";
        let names: Vec<&str> = REQUIRED_INDEXES.iter().map(|index| index.name).collect();

        let rows = sqlx::query(query)
            .bind(names)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .map_err(|err| storage_error(err, "list indexes", ""))?;

        Ok(rows.iter().map(|row| row.get("indexname")).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, CredentialError> {
        let query = r"
            SELECT id, name, email, phone, password_hash, role, created_at, updated_at
            FROM users WHERE email = $1
        ";
        let email = normalize_email(email);

        let row = sqlx::query(query)
            .bind(&email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .map_err(|err| storage_error(err, "look up user", &email))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn create(&self, user: &UserCredential) -> Result<(), CredentialError> {
        let query = r"
            INSERT INTO users
                (id, name, email, phone, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ";
        let email = normalize_email(&user.email);

        sqlx::query(query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .map_err(|err| storage_error(err, "create user", &email))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn save(&self, user: &mut UserCredential) -> Result<(), CredentialError> {
        let query = r"
            UPDATE users
            SET name = $2, email = $3, phone = $4, password_hash = $5, role = $6,
                updated_at = GREATEST($7, created_at)
            WHERE id = $1
            RETURNING created_at, updated_at
        ";
        let email = normalize_email(&user.email);
        // same clock as `create`, which writes client timestamps
        let now = Utc::now();

        let row = sqlx::query(query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .map_err(|err| storage_error(err, "save user", &email))?
            .ok_or_else(|| CredentialError::NotFound(email.clone()))?;

        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        user.email = email;
        user.created_at = created_at;
        user.updated_at = updated_at;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(TestDbError { code: Some(code) }))
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        assert!(is_unique_violation(&db_error("23505")));
        assert!(!is_unique_violation(&db_error("99999")));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn unique_violation_maps_to_duplicate_key() {
        let err = storage_error(db_error("23505"), "create user", "a@example.com");
        assert!(matches!(err, CredentialError::DuplicateKey(e) if e == "a@example.com"));
    }

    #[test]
    fn undefined_table_maps_to_schema_missing() {
        let err = storage_error(db_error("42P01"), "look up user", "a@example.com");
        assert!(matches!(err, CredentialError::SchemaMissing(c) if c == "users"));
    }

    #[test]
    fn pool_failures_map_to_connection_errors() {
        let err = storage_error(sqlx::Error::PoolTimedOut, "look up user", "");
        assert!(matches!(err, CredentialError::StorageConnection(_)));
    }

    #[test]
    fn other_errors_keep_the_operation() {
        let err = storage_error(sqlx::Error::RowNotFound, "save user", "");
        assert!(matches!(
            err,
            CredentialError::Storage {
                operation: "save user",
                ..
            }
        ));
    }

    #[test]
    fn schema_creates_tables_before_indexes() {
        let first_index = SCHEMA
            .iter()
            .position(|s| s.contains("INDEX"))
            .unwrap_or(SCHEMA.len());
        assert!(SCHEMA[..first_index]
            .iter()
            .all(|s| s.contains("CREATE TABLE")));
        for index in REQUIRED_INDEXES {
            assert!(
                SCHEMA[first_index..].iter().any(|s| s.contains(index.name)),
                "missing DDL for {}",
                index.name
            );
        }
    }
}
