//! Informational outcomes of pidfile inspection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of a non-mutating pidfile inspection (`check`) or a `clean` pass.
///
/// These are benign states, reported as values. The one state that needs
/// caller action ("a different live process owns the file") is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    /// The pidfile exists but holds no process id.
    Empty,
    /// The pidfile does not exist.
    NoFile,
    /// The pidfile names the calling process.
    SamePid,
    /// The pidfile names a process that is no longer running.
    NotRunning,
    /// A stale pidfile was removed.
    Clean,
}

pub const PID_CHECK_EMPTY: CheckResult = CheckResult::Empty;
pub const PID_CHECK_NOFILE: CheckResult = CheckResult::NoFile;
pub const PID_CHECK_SAMEPID: CheckResult = CheckResult::SamePid;
pub const PID_CHECK_NOTRUNNING: CheckResult = CheckResult::NotRunning;
pub const PID_CHECK_CLEAN: CheckResult = CheckResult::Clean;

impl CheckResult {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NoFile => "nofile",
            Self::SamePid => "samepid",
            Self::NotRunning => "notrunning",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
