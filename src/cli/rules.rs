//! Rules command implementation.

use super::{CliError, load_rules};
use std::path::PathBuf;

/// Print the rules in force as pretty JSON.
///
/// # Errors
///
/// Returns an error if the rules file cannot be read or is invalid.
pub(crate) fn execute(path: Option<PathBuf>) -> Result<(), CliError> {
    let rules = load_rules(path.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}
