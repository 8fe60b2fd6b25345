use crate::cli::actions::{reset, seed, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Seed(args) => seed::execute(args).await,
        Action::ResetPassword(args) => reset::execute(args).await,
    }
}
