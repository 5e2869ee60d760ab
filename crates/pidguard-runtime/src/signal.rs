//! Process-wide SIGTERM registration.
//!
//! A process has one SIGTERM disposition, shared by every `PidFile` in it.
//! The cleanup handler installed here unlinks every pidfile the process
//! currently owns (skipping any path that no longer names the inode we
//! claimed), restores the default disposition and re-raises SIGTERM so
//! the process still terminates the way the sender expects.
//!
//! # Signal safety
//! The handler never allocates and never blocks: owned paths are kept as
//! pre-built `CString`s, the registry is only `try_lock`ed and the only
//! calls made are `stat`, `unlink`, `sigaction` and `raise`. If the signal
//! lands while the registry is being updated, cleanup is skipped and the
//! process simply terminates.
//!
//! The previous disposition is not restored when a pidfile closes.

use std::ffi::{CString, c_int};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use std::sync::{Mutex, PoisonError};

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::stat;
use nix::unistd;
use pidguard_core::{PidFileError, TermHandlerFn, TermSignalPolicy};
use tracing::{debug, warn};

use crate::pidfile::FileId;

struct OwnedPidfile {
    path: CString,
    id: FileId,
}

/// Pidfiles owned by this process, unlinked by the cleanup handler.
static OWNED_PIDFILES: Mutex<Vec<OwnedPidfile>> = Mutex::new(Vec::new());

/// Current SIGTERM disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermDisposition {
    /// `SIG_DFL`: terminate without cleanup.
    Default,
    /// `SIG_IGN`.
    Ignore,
    /// The pidfile cleanup handler from this crate.
    Library,
    /// Any other handler, identified by address.
    Custom(usize),
}

impl TermDisposition {
    /// Whether the disposition is exactly `handler`.
    pub fn is_handler(self, handler: TermHandlerFn) -> bool {
        matches!(self, Self::Custom(addr) if addr == handler as usize)
    }
}

/// Read the SIGTERM disposition without changing it.
pub fn current_disposition() -> Result<TermDisposition, PidFileError> {
    let raw = query_sigterm().map_err(|e| PidFileError::Signal(e.to_string()))?;

    Ok(if raw == libc::SIG_DFL {
        TermDisposition::Default
    } else if raw == libc::SIG_IGN {
        TermDisposition::Ignore
    } else if raw == library_handler_addr() {
        TermDisposition::Library
    } else {
        TermDisposition::Custom(raw)
    })
}

/// Apply a registration policy.
///
/// Returns the disposition in effect afterwards.
pub fn register(policy: TermSignalPolicy) -> Result<TermDisposition, PidFileError> {
    let current = current_disposition()?;

    let install_library = match policy {
        TermSignalPolicy::Skip => false,
        TermSignalPolicy::Custom(handler) => {
            install_term_handler(handler)?;
            debug!("installed caller-supplied SIGTERM handler");
            return current_disposition();
        }
        TermSignalPolicy::Auto => current == TermDisposition::Default,
        TermSignalPolicy::Register => {
            !matches!(current, TermDisposition::Ignore | TermDisposition::Library)
        }
    };

    if install_library {
        set_sigterm(SigHandler::Handler(cleanup_and_terminate))?;
        debug!(previous = ?current, "installed pidfile SIGTERM handler");
        return Ok(TermDisposition::Library);
    }

    Ok(current)
}

/// Install `handler` as the SIGTERM handler.
pub fn install_term_handler(handler: TermHandlerFn) -> Result<(), PidFileError> {
    set_sigterm(SigHandler::Handler(handler))
}

/// Set SIGTERM to `SIG_IGN`.
pub fn ignore_term_signal() -> Result<(), PidFileError> {
    set_sigterm(SigHandler::SigIgn)
}

/// Set SIGTERM back to `SIG_DFL`.
pub fn restore_default_term_signal() -> Result<(), PidFileError> {
    set_sigterm(SigHandler::SigDfl)
}

/// Add `path`, claimed as inode `id`, to the set unlinked on SIGTERM.
pub(crate) fn track(path: &Path, id: FileId) {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        warn!(path = %path.display(), "pidfile path contains NUL, not tracked for SIGTERM cleanup");
        return;
    };

    let mut owned = OWNED_PIDFILES.lock().unwrap_or_else(PoisonError::into_inner);
    match owned.iter_mut().find(|entry| entry.path == c_path) {
        Some(entry) => entry.id = id,
        None => owned.push(OwnedPidfile { path: c_path, id }),
    }
}

/// Remove `path` from the set unlinked on SIGTERM, unless it is now
/// tracked for a different inode.
pub(crate) fn untrack(path: &Path, id: FileId) {
    let bytes = path.as_os_str().as_bytes();
    let mut owned = OWNED_PIDFILES.lock().unwrap_or_else(PoisonError::into_inner);
    owned.retain(|entry| entry.path.as_bytes() != bytes || entry.id != id);
}

#[cfg(test)]
pub(crate) fn tracked_id(path: &Path) -> Option<FileId> {
    let bytes = path.as_os_str().as_bytes();
    OWNED_PIDFILES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|entry| entry.path.as_bytes() == bytes)
        .map(|entry| entry.id)
}

#[cfg(test)]
pub(crate) fn is_tracked(path: &Path) -> bool {
    tracked_id(path).is_some()
}

/// Unlink every tracked path that still names the claimed inode.
fn unlink_owned(owned: &[OwnedPidfile]) {
    for entry in owned {
        let path = entry.path.as_c_str();
        if stat::stat(path).is_ok_and(|st| entry.id.matches(&st)) {
            let _ = unistd::unlink(path);
        }
    }
}

extern "C" fn cleanup_and_terminate(_signum: c_int) {
    if let Ok(owned) = OWNED_PIDFILES.try_lock() {
        unlink_owned(&owned);
    }

    let _ = set_sigterm(SigHandler::SigDfl);
    let _ = signal::raise(Signal::SIGTERM);
}

fn library_handler_addr() -> usize {
    cleanup_and_terminate as TermHandlerFn as usize
}

#[allow(unsafe_code)]
fn set_sigterm(handler: SigHandler) -> Result<(), PidFileError> {
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: every handler installed here is either SIG_DFL/SIG_IGN, the
    // async-signal-safe cleanup handler above, or a caller-supplied handler
    // whose safety is the caller's contract.
    unsafe { signal::sigaction(Signal::SIGTERM, &action) }
        .map(drop)
        .map_err(|errno| PidFileError::Signal(errno.desc().to_string()))
}

#[allow(unsafe_code)]
fn query_sigterm() -> io::Result<libc::sighandler_t> {
    let mut current = MaybeUninit::<libc::sigaction>::zeroed();
    // SAFETY: with a null `act`, sigaction only writes the current
    // disposition into `current`, which is valid writable storage.
    let rc = unsafe { libc::sigaction(libc::SIGTERM, ptr::null(), current.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: zero-initialized and filled by a successful sigaction call.
    Ok(unsafe { current.assume_init() }.sa_sigaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pidfile::LockHandle;
    use crate::test_utils::signal_lock;

    extern "C" fn noop(_: c_int) {}
    extern "C" fn custom(_: c_int) {}

    #[test]
    fn auto_installs_over_default() {
        let _guard = signal_lock();
        restore_default_term_signal().unwrap();

        assert_eq!(register(TermSignalPolicy::Auto).unwrap(), TermDisposition::Library);
        assert_eq!(current_disposition().unwrap(), TermDisposition::Library);
    }

    #[test]
    fn auto_preserves_custom_and_ignore() {
        let _guard = signal_lock();

        install_term_handler(noop).unwrap();
        register(TermSignalPolicy::Auto).unwrap();
        assert!(current_disposition().unwrap().is_handler(noop));

        ignore_term_signal().unwrap();
        register(TermSignalPolicy::Auto).unwrap();
        assert_eq!(current_disposition().unwrap(), TermDisposition::Ignore);

        restore_default_term_signal().unwrap();
    }

    #[test]
    fn register_replaces_custom_but_not_ignore() {
        let _guard = signal_lock();

        install_term_handler(custom).unwrap();
        register(TermSignalPolicy::Register).unwrap();
        let after = current_disposition().unwrap();
        assert!(!after.is_handler(custom));
        assert_eq!(after, TermDisposition::Library);

        ignore_term_signal().unwrap();
        register(TermSignalPolicy::Register).unwrap();
        assert_eq!(current_disposition().unwrap(), TermDisposition::Ignore);

        restore_default_term_signal().unwrap();
    }

    #[test]
    fn skip_leaves_disposition_alone() {
        let _guard = signal_lock();

        install_term_handler(noop).unwrap();
        register(TermSignalPolicy::Skip).unwrap();
        assert!(current_disposition().unwrap().is_handler(noop));

        restore_default_term_signal().unwrap();
        register(TermSignalPolicy::Skip).unwrap();
        assert_eq!(current_disposition().unwrap(), TermDisposition::Default);
    }

    #[test]
    fn custom_handler_is_installed_verbatim_over_ignore() {
        let _guard = signal_lock();

        ignore_term_signal().unwrap();
        register(TermSignalPolicy::Custom(noop)).unwrap();
        assert!(current_disposition().unwrap().is_handler(noop));

        restore_default_term_signal().unwrap();
    }

    #[test]
    fn tracking_is_idempotent() {
        let path = Path::new("/tmp/pidguard-track-test.pid");
        let first = FileId { dev: 1, ino: 10 };
        let second = FileId { dev: 1, ino: 11 };
        track(path, first);
        track(path, second);
        assert_eq!(tracked_id(path), Some(second));

        untrack(path, first);
        assert_eq!(tracked_id(path), Some(second));
        untrack(path, second);
        assert!(!is_tracked(path));
    }

    #[test]
    fn cleanup_skips_replaced_pidfile() {
        let tmp = tempfile::tempdir().unwrap();
        let ours = tmp.path().join("ours.pid");
        let replaced = tmp.path().join("replaced.pid");

        let ours_handle = LockHandle::open(&ours, 0o644).unwrap();
        let old_handle = LockHandle::open(&replaced, 0o644).unwrap();
        let old_id = old_handle.file_id().unwrap();
        drop(old_handle);
        std::fs::remove_file(&replaced).unwrap();
        let _successor = LockHandle::open(&replaced, 0o644).unwrap();

        let owned = [
            OwnedPidfile {
                path: CString::new(ours.as_os_str().as_bytes()).unwrap(),
                id: ours_handle.file_id().unwrap(),
            },
            OwnedPidfile {
                path: CString::new(replaced.as_os_str().as_bytes()).unwrap(),
                id: old_id,
            },
        ];
        unlink_owned(&owned);

        assert!(!ours.exists());
        assert!(replaced.exists(), "a successor's pidfile survives cleanup");
    }
}
