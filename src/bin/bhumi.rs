use anyhow::Result;
use bhumi::cli;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    // Any error bubbles up here and exits with status 1.
    action.execute().await?;

    Ok(())
}
