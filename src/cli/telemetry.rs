use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Build the log filter: `RUST_LOG` wins, otherwise the CLI verbosity.
///
/// # Errors
///
/// Returns an error if a built-in directive fails to parse
pub fn filter(verbosity_level: Option<Level>) -> Result<EnvFilter> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("sqlx=warn".parse()?)
        .add_directive("hyper=error".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Initialize logging to stderr so operator output on stdout stays readable.
///
/// # Errors
///
/// Returns an error if the subscriber was already set
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false);

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(filter(verbosity_level)?);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
