//! Pidfile path resolution.
//!
//! Turns a pidname, an optional directory and the suffix policy into the
//! absolute path a `PidFile` operates on.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - An explicit directory is created if missing; probed defaults never are
//! - Name normalization is pure and lives in `pidguard-core`

mod candidates;
mod ensure;

use std::env;
use std::path::{Path, PathBuf};

use pidguard_core::{PathError, PidFileOptions, pidfile_name};
use tracing::debug;

pub use candidates::{candidate_dirs, default_pid_dir};
pub use ensure::{ensure_directory, is_usable_dir, verify_access};

/// Compute the absolute pidfile path.
///
/// - `piddir` is used as-is (created if missing) and wins over `force_tmpdir`
/// - otherwise `force_tmpdir` selects the system temp directory
/// - otherwise the first usable [`candidate_dirs`] entry, else the temp directory
pub fn resolve_pidfile_path(
    pidname: Option<&str>,
    piddir: Option<&Path>,
    enforce_dotpid_postfix: bool,
    force_tmpdir: bool,
) -> Result<PathBuf, PathError> {
    let name = pidfile_name(pidname, enforce_dotpid_postfix)?;

    let dir = match piddir {
        Some(dir) => absolutize(dir)?,
        None if force_tmpdir => env::temp_dir(),
        None => default_pid_dir(),
    };
    ensure_directory(&dir)?;

    let path = dir.join(name);
    debug!(path = %path.display(), "resolved pidfile path");
    Ok(path)
}

/// [`resolve_pidfile_path`] driven by a full set of options.
pub fn resolve_for(options: &PidFileOptions) -> Result<PathBuf, PathError> {
    resolve_pidfile_path(
        options.pidname.as_deref(),
        options.piddir.as_deref(),
        options.enforce_dotpid_postfix,
        options.force_tmpdir,
    )
}

fn absolutize(dir: &Path) -> Result<PathBuf, PathError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(dir))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
