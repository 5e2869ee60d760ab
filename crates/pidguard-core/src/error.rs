//! Error types for pidfile resolution and lifecycle operations.
//!
//! Two families are exposed:
//! - [`PathError`]: the pid directory or name cannot be used (environment errors)
//! - [`PidFileError`]: everything a pidfile operation can fail with, including
//!   the conflict errors that mean "another live instance owns this pidfile"
//!
//! Informational outcomes (no file, empty file, stale file) are never errors;
//! see [`CheckResult`](crate::CheckResult).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving the pidfile directory and name.
#[derive(Debug, Error)]
pub enum PathError {
    /// An empty pidname was provided.
    #[error("Pidfile name cannot be empty")]
    EmptyName,

    /// No pidname was given and the invoking executable has no usable name.
    #[error("Cannot determine the invoking executable name")]
    NoExecutableName,

    /// A path was expected to be a directory but was not.
    #[error("Pid file directory {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to create the pid directory.
    #[error("Failed to create pid file directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// The pid directory cannot be listed.
    #[error("Pid file directory {path} cannot be read: {reason}")]
    NotReadable { path: PathBuf, reason: String },

    /// The pid directory cannot be written to.
    #[error("Pid file directory {path} cannot be written to: {reason}")]
    NotWritable { path: PathBuf, reason: String },

    /// Failed to get the current working directory for a relative directory.
    #[error("Cannot determine current directory: {0}")]
    CurrentDirError(String),
}

/// Errors returned by pidfile operations.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The advisory lock on the pidfile is held by another open descriptor.
    #[error("{} is already locked{}", path.display(), locked_by(*pid))]
    AlreadyLocked { path: PathBuf, pid: Option<u32> },

    /// The pidfile names a live process other than the caller.
    #[error("Program already running with pid {pid} ({})", path.display())]
    AlreadyRunning { path: PathBuf, pid: u32 },

    /// The pidfile exists but its content is not a process id.
    #[error("Pidfile {} is unreadable: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// The pid directory cannot be used.
    #[error(transparent)]
    DirectoryPermission(#[from] PathError),

    /// An I/O operation on the pidfile failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The termination signal disposition could not be queried or changed.
    #[error("Failed to register termination signal handler: {0}")]
    Signal(String),
}

impl PidFileError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means another live instance owns the pidfile.
    ///
    /// Conflict errors are the caller's to act on (exit, wait, escalate);
    /// everything else points at the environment.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyLocked { .. } | Self::AlreadyRunning { .. })
    }

    /// The pid of the conflicting process, when known.
    pub const fn conflicting_pid(&self) -> Option<u32> {
        match self {
            Self::AlreadyLocked { pid, .. } => *pid,
            Self::AlreadyRunning { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

fn locked_by(pid: Option<u32>) -> String {
    pid.map_or_else(String::new, |pid| format!(" by pid {pid}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_are_classified() {
        let locked = PidFileError::AlreadyLocked {
            path: PathBuf::from("/run/app.pid"),
            pid: Some(42),
        };
        let running = PidFileError::AlreadyRunning {
            path: PathBuf::from("/run/app.pid"),
            pid: 7,
        };
        let env = PidFileError::from(PathError::EmptyName);

        assert!(locked.is_conflict());
        assert!(running.is_conflict());
        assert!(!env.is_conflict());
        assert_eq!(locked.conflicting_pid(), Some(42));
        assert_eq!(running.conflicting_pid(), Some(7));
        assert_eq!(env.conflicting_pid(), None);
    }

    #[test]
    fn messages_name_the_pidfile() {
        let locked = PidFileError::AlreadyLocked {
            path: PathBuf::from("/run/app.pid"),
            pid: None,
        };
        assert_eq!(locked.to_string(), "/run/app.pid is already locked");

        let locked = PidFileError::AlreadyLocked {
            path: PathBuf::from("/run/app.pid"),
            pid: Some(12),
        };
        assert_eq!(locked.to_string(), "/run/app.pid is already locked by pid 12");

        let running = PidFileError::AlreadyRunning {
            path: PathBuf::from("/run/app.pid"),
            pid: 12,
        };
        assert!(running.to_string().contains("already running with pid 12"));
    }
}
