use thiserror::Error;

/// Failures raised by the password hasher.
#[derive(Debug, Error)]
pub enum HashingError {
    #[error("password must not be empty")]
    EmptyInput,
    #[error("password is {0} bytes long, bcrypt accepts at most 72")]
    TooLong(usize),
    #[error("bcrypt cost {0} is outside the supported range 4..=31")]
    InvalidCost(u32),
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Every way the seed and reset routines can fail.
///
/// None of these are recovered locally: the routine stops and the error is
/// handed back to the caller.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no user with email {0}")]
    NotFound(String),
    #[error("a user with email {0} already exists")]
    DuplicateKey(String),
    #[error("cannot connect to the database: {0}")]
    StorageConnection(#[source] sqlx::Error),
    #[error("database error while trying to {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("collection {0} does not exist, run `bhumi seed` first")]
    SchemaMissing(String),
    #[error("required index {0} is missing")]
    IndexMissing(String),
    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashingError),
    #[error("unknown role {0:?}")]
    InvalidRole(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
