use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Points at an env file to load instead of searching for `.env`.
pub const ENV_FILE_VAR: &str = "BHUMI_ENV_FILE";

/// Map verbosity count to tracing level
const fn get_verbosity_level(verbosity: u8) -> Option<tracing::Level> {
    match verbosity {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Load `KEY=value` pairs from an env file into the process environment.
///
/// Variables that are already set are kept. Without `path`, `.env` is looked
/// up from the current directory upwards. A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(_)) => Ok(None),
        Err(e) => Err(e).context("failed to load env file"),
    }
}

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if argument parsing, logging initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    // before parsing, so clap sees the file's BHUMI_* values
    let env_file = std::env::var_os(ENV_FILE_VAR).map(PathBuf::from);
    let env_file = load_env_file(env_file.as_deref())?;

    let matches = commands::new().get_matches();

    let verbosity_level = get_verbosity_level(
        matches
            .get_one::<u8>(commands::ARG_VERBOSITY)
            .copied()
            .unwrap_or(0),
    );

    telemetry::init(verbosity_level)?;

    if let Some(path) = env_file {
        debug!("loaded environment from {}", path.display());
    }

    let action = dispatch::handler(&matches)?;

    Ok(action)
}
