//! Core domain types for pidguard.
//!
//! This crate holds the pure parts of pidfile management: configuration,
//! inspection results, name normalization and the error taxonomy. Everything
//! that touches the filesystem, locks or signals lives in `pidguard-runtime`.
#![deny(unused_crate_dependencies)]

pub mod check;
pub mod error;
pub mod naming;
pub mod options;

pub use check::{
    CheckResult, PID_CHECK_CLEAN, PID_CHECK_EMPTY, PID_CHECK_NOFILE, PID_CHECK_NOTRUNNING,
    PID_CHECK_SAMEPID,
};
pub use error::{PathError, PidFileError};
pub use naming::{PID_SUFFIX, default_pidname, pidfile_name};
pub use options::{DEFAULT_CHMOD, PID_DIR_ENV, PidFileOptions, TermHandlerFn, TermSignalPolicy};
