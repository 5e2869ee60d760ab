//! CLI-specific error types and mappings.
//!
//! Maps pidfile failures to sysexits-style exit codes so shell callers can
//! tell "another instance is running" apart from real failures.

use pidguard_core::PidFileError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Another live process holds the pidfile.
    #[error("{0}")]
    Conflict(PidFileError),

    /// The pidfile directory is unusable.
    #[error("{0}")]
    Directory(PidFileError),

    /// Any other pidfile failure.
    #[error("{0}")]
    PidFile(PidFileError),

    /// The wrapped command could not be started.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h:
    /// - 75: another instance holds the pidfile (EX_TEMPFAIL)
    /// - 73: pidfile directory cannot be created or used (EX_CANTCREAT)
    /// - 74: pidfile I/O failure (EX_IOERR)
    /// - 71: the wrapped command failed to start (EX_OSERR)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Conflict(_) => 75,
            Self::Directory(_) => 73,
            Self::PidFile(_) => 74,
            Self::Process(_) => 71,
        }
    }
}

impl From<PidFileError> for CliError {
    fn from(err: PidFileError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err)
        } else if matches!(err, PidFileError::DirectoryPermission(_)) {
            Self::Directory(err)
        } else {
            Self::PidFile(err)
        }
    }
}

/// Exit code for an error that reached `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pidguard_core::PathError;
    use std::path::PathBuf;

    #[test]
    fn test_conflicts_map_to_tempfail() {
        let err = CliError::from(PidFileError::AlreadyRunning {
            path: PathBuf::from("/run/x.pid"),
            pid: 42,
        });
        assert_eq!(err.exit_code(), 75);

        let err = CliError::from(PidFileError::AlreadyLocked {
            path: PathBuf::from("/run/x.pid"),
            pid: None,
        });
        assert_eq!(err.exit_code(), 75);
    }

    #[test]
    fn test_directory_errors_map_to_cantcreat() {
        let err = CliError::from(PidFileError::DirectoryPermission(PathError::EmptyName));
        assert_eq!(err.exit_code(), 73);
    }

    #[test]
    fn test_exit_code_through_anyhow() {
        let err = anyhow::Error::new(CliError::Process("spawn failed".into()));
        assert_eq!(exit_code_for(&err), 71);
        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), 1);
    }
}
