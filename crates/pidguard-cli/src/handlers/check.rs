//! Check command handler.

use anyhow::Result;
use pidguard_core::{CheckResult, PidFileOptions};
use pidguard_runtime::PidFile;
use tracing::debug;

use crate::error::CliError;

/// Report the pidfile state without taking it.
///
/// A pidfile held by a live process surfaces as a conflict error.
pub fn execute(options: PidFileOptions) -> Result<CheckResult> {
    let mut pidfile = PidFile::new(options);
    let result = pidfile.check().map_err(CliError::from)?;
    debug!(path = ?pidfile.filename(), %result, "check finished");

    println!("{result}");
    Ok(result)
}
