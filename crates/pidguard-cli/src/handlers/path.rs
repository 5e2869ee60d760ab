//! Path command handler.

use anyhow::Result;
use pidguard_core::{PidFileError, PidFileOptions};
use pidguard_runtime::paths;

use crate::error::CliError;

/// Print the pidfile path the options resolve to.
///
/// Resolution creates the pid directory when it is missing.
pub fn execute(options: &PidFileOptions) -> Result<()> {
    let path = paths::resolve_for(options).map_err(|e| CliError::from(PidFileError::from(e)))?;
    println!("{}", path.display());
    Ok(())
}
