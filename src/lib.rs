//! # Bhumi (credential bootstrap & reset tooling)
//!
//! `bhumi` provisions and maintains the operator accounts of the Bhumi Interior
//! site. It is a pair of one-shot administrative routines, not a server.
//!
//! ## Seeding
//!
//! `bhumi seed` makes the user store ready for first use: it creates the
//! `users` and `galleries` collections, then their indexes (the unique index on
//! `email` is what enforces one record per address), and finally inserts an
//! admin record carrying a placeholder password hash. The placeholder is not a
//! login credential; the real password is set through the site's registration
//! endpoint or with `bhumi reset-password`. Running the seed twice is safe.
//!
//! ## Password reset
//!
//! `bhumi reset-password` looks up a user by email, hashes the supplied
//! password with bcrypt and saves it. A missing user is a hard failure.
//!
//! Both routines return typed results; only the binary turns a failure into a
//! non-zero exit status.

pub mod cli;
pub mod credentials;
pub mod reset;
pub mod seed;
pub mod store;
pub mod vault;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
