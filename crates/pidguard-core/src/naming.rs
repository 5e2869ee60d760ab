//! Pidfile name normalization.

use std::env;
use std::path::Path;

use crate::error::PathError;

/// Suffix appended to pidfile names unless disabled.
pub const PID_SUFFIX: &str = ".pid";

/// Compute the pidfile's file name.
///
/// An explicit `pidname` gets the `.pid` suffix when `enforce_dotpid_postfix`
/// is set and the name does not already end with it. The default name, derived
/// from the invoking executable, always carries the suffix.
pub fn pidfile_name(pidname: Option<&str>, enforce_dotpid_postfix: bool) -> Result<String, PathError> {
    let Some(name) = pidname else {
        return Ok(format!("{}{PID_SUFFIX}", default_pidname()?));
    };

    if name.trim().is_empty() {
        return Err(PathError::EmptyName);
    }

    if enforce_dotpid_postfix && !name.ends_with(PID_SUFFIX) {
        Ok(format!("{name}{PID_SUFFIX}"))
    } else {
        Ok(name.to_string())
    }
}

/// Base name of the invoking program.
///
/// Resolution order:
/// 1. `argv[0]`
/// 2. `std::env::current_exe()`
pub fn default_pidname() -> Result<String, PathError> {
    let from_args = env::args_os()
        .next()
        .and_then(|arg0| Path::new(&arg0).file_name().map(|n| n.to_string_lossy().into_owned()));

    if let Some(name) = from_args.filter(|n| !n.is_empty()) {
        return Ok(name);
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|n| !n.is_empty())
        .ok_or(PathError::NoExecutableName)
}
