//! Default pid directory probing.

use std::env;
use std::path::PathBuf;

use nix::unistd::geteuid;
use pidguard_core::PID_DIR_ENV;

use super::ensure::is_usable_dir;

/// Ordered candidate directories for pidfiles when none is configured.
///
/// Resolution order:
/// 1. `PIDGUARD_PID_DIR` environment variable
/// 2. `XDG_RUNTIME_DIR`
/// 3. `/run/user/<euid>`, `/var/run/user/<euid>`
/// 4. `/run`, `/var/run`
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(6);

    if let Some(dir) = env::var_os(PID_DIR_ENV).filter(|v| !v.is_empty()) {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(runtime) = dirs::runtime_dir() {
        candidates.push(runtime);
    }

    let uid = geteuid();
    candidates.push(PathBuf::from(format!("/run/user/{uid}")));
    candidates.push(PathBuf::from(format!("/var/run/user/{uid}")));
    candidates.push(PathBuf::from("/run"));
    candidates.push(PathBuf::from("/var/run"));

    candidates
}

/// First usable candidate directory, else the system temp directory.
pub fn default_pid_dir() -> PathBuf {
    candidate_dirs()
        .into_iter()
        .find(|dir| is_usable_dir(dir))
        .unwrap_or_else(env::temp_dir)
}
