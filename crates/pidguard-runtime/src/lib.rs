//! Pidfile runtime: path resolution, advisory locking, liveness checks and
//! SIGTERM cleanup.
//!
//! ```no_run
//! use pidguard_core::PidFileOptions;
//! use pidguard_runtime::PidFile;
//!
//! let _pidfile = PidFile::acquire(PidFileOptions::named("my-daemon"))?;
//! // ... run the daemon; the pidfile is removed when `_pidfile` drops ...
//! # Ok::<(), pidguard_core::PidFileError>(())
//! ```
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(not(unix))]
compile_error!("pidguard-runtime requires a POSIX host with flock(2) and signals");

pub mod paths;
pub mod pidfile;
pub mod signal;
mod wrapper;

#[cfg(test)]
mod test_utils;

pub use pidfile::{PidFile, PidFileGuard, PidFileState, pid_exists};
pub use signal::{TermDisposition, current_disposition};
pub use wrapper::{pidfile_guarded, with_pidfile};

// Re-export the domain types callers need alongside the runtime
pub use pidguard_core::{CheckResult, PathError, PidFileError, PidFileOptions, TermSignalPolicy};
