//! Clean command handler.

use std::time::Duration;

use anyhow::Result;
use pidguard_core::{CheckResult, PidFileOptions};
use pidguard_runtime::PidFile;

use crate::error::CliError;

/// Remove a stale pidfile, or one untouched for `timeout_secs`.
pub fn execute(options: PidFileOptions, timeout_secs: Option<u64>) -> Result<Option<CheckResult>> {
    let mut pidfile = PidFile::new(options);
    let outcome = pidfile
        .clean(timeout_secs.map(Duration::from_secs))
        .map_err(CliError::from)?;

    let path = pidfile
        .filename()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match outcome {
        Some(CheckResult::Clean) => println!("removed {path}"),
        Some(CheckResult::NoFile) => println!("nothing to clean: {path} does not exist"),
        Some(other) => println!("kept {path}: {other}"),
        None => println!("kept {path}: owner is still running"),
    }
    Ok(outcome)
}
