//! Run command handler.
//!
//! Holds the pidfile for the lifetime of a child command and propagates the
//! child's exit status.

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};

use anyhow::Result;
use pidguard_core::PidFileOptions;
use pidguard_runtime::with_pidfile;
use tracing::{debug, info};

use crate::error::CliError;

/// Run `command` while holding the pidfile; returns the exit code to use.
pub fn execute(options: PidFileOptions, command: &[String]) -> Result<u8> {
    let Some((program, args)) = command.split_first() else {
        return Err(CliError::Process("no command given".to_string()).into());
    };

    let status = with_pidfile(options, |pidfile| {
        info!(path = ?pidfile.filename(), pid = pidfile.pid(), %program, "holding pidfile");
        Command::new(program)
            .args(args)
            .status()
            .map_err(|e| CliError::Process(format!("failed to run {program}: {e}")))
    })?;

    debug!(?status, "command finished");
    Ok(exit_code(status))
}

/// Shell convention: the child's code, or 128 + signal number.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code & 0xff).unwrap_or(1);
    }
    status
        .signal()
        .and_then(|sig| u8::try_from(128 + sig).ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_from_status() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        // killed by SIGTERM
        assert_eq!(exit_code(ExitStatus::from_raw(15)), 143);
    }
}
