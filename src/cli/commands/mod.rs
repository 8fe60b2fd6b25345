pub mod vault;

use crate::{reset::DEFAULT_RESET_EMAIL, seed};
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_SEED: &str = "seed";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

pub const ARG_DSN: &str = "dsn";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ADMIN_NAME: &str = "admin-name";
pub const ARG_ADMIN_PHONE: &str = "admin-phone";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_VERBOSITY: &str = "verbosity";

// Index is the `-v` count that selects the level.
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

// Keep in sync with `credentials::hasher::DEFAULT_COST`.
const DEFAULT_BCRYPT_COST: &str = "10";

/// `BHUMI_LOG_LEVEL` accepts a level name or the equivalent `-v` count.
fn log_level_parser() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim().to_lowercase();

        level
            .parse::<u8>()
            .ok()
            .filter(|count| usize::from(*count) < LOG_LEVELS.len())
            .or_else(|| {
                LOG_LEVELS
                    .iter()
                    .position(|name| *name == level)
                    .and_then(|index| u8::try_from(index).ok())
            })
            .ok_or_else(|| format!("invalid log level, expected one of {}", LOG_LEVELS.join(", ")))
    })
}

fn verbosity_arg() -> Arg {
    Arg::new(ARG_VERBOSITY)
        .short('v')
        .long("verbose")
        .help("Raise log verbosity, repeat for more (default: errors only)")
        .env("BHUMI_LOG_LEVEL")
        .global(true)
        .action(ArgAction::Count)
        .value_parser(log_level_parser())
}

fn seed_command() -> Command {
    Command::new(CMD_SEED)
        .about("Create collections, indexes and the placeholder admin record")
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Email of the admin record to provision")
                .env("BHUMI_ADMIN_EMAIL")
                .default_value(seed::DEFAULT_ADMIN_EMAIL),
        )
        .arg(
            Arg::new(ARG_ADMIN_NAME)
                .long(ARG_ADMIN_NAME)
                .help("Display name of the admin record")
                .env("BHUMI_ADMIN_NAME")
                .default_value(seed::DEFAULT_ADMIN_NAME),
        )
        .arg(
            Arg::new(ARG_ADMIN_PHONE)
                .long(ARG_ADMIN_PHONE)
                .help("Phone number of the admin record")
                .env("BHUMI_ADMIN_PHONE")
                .default_value(seed::DEFAULT_ADMIN_PHONE),
        )
}

fn reset_password_command() -> Command {
    Command::new(CMD_RESET_PASSWORD)
        .about("Set a new password for an existing user")
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long(ARG_EMAIL)
                .help("Email of the user whose password is reset")
                .env("BHUMI_RESET_EMAIL")
                .default_value(DEFAULT_RESET_EMAIL),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("New password (prefer BHUMI_RESET_PASSWORD to keep it out of shell history)")
                .env("BHUMI_RESET_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor (4-31)")
                .env("BHUMI_BCRYPT_COST")
                .default_value(DEFAULT_BCRYPT_COST)
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("bhumi")
        .about("Credential bootstrap and reset for the Bhumi Interior site")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "Database connection string. With --vault-url, username/password are injected from Vault DB creds, so they are not required in the DSN.",
                )
                .env("BHUMI_DSN")
                .hide_env_values(true)
                .global(true),
        )
        .arg(verbosity_arg())
        .subcommand(seed_command())
        .subcommand(reset_password_command());

    vault::with_args(command)
}
