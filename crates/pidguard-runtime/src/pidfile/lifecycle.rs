//! The pidfile lifecycle: setup, create, check, clean and close.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, SystemTime};

use pidguard_core::{CheckResult, PidFileError, PidFileOptions};
use tracing::{debug, info, warn};

use super::content::parse_pid;
use super::lock::{FileId, LockHandle, read_content_at};
use super::verify::pid_exists;
use crate::paths;
use crate::signal;

/// Where a [`PidFile`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidFileState {
    /// Constructed; path not resolved yet.
    Uninitialized,
    /// Path resolved and descriptor open.
    Setup,
    /// `create()` succeeded.
    Active,
    /// Closed, or a `create()` failed. `create()` may be called again.
    Closed,
}

/// A pidfile claiming single-instance execution for the current process.
///
/// Once [`create`](Self::create) succeeds, the file holds exactly
/// `"<pid>\n"` and, with locking enabled, this instance holds an exclusive
/// `flock` on it. [`close`](Self::close) (or drop) releases the lock and
/// removes the file if this instance wrote it.
///
/// Cleanup on drop does not run on `std::process::exit` or on an abort;
/// SIGTERM is covered by the registered handler.
pub struct PidFile {
    options: PidFileOptions,
    filename: Option<PathBuf>,
    pid: u32,
    handle: Option<LockHandle>,
    state: PidFileState,
    owner: bool,
    claimed: Option<FileId>,
}

impl PidFile {
    pub fn new(options: PidFileOptions) -> Self {
        Self {
            options,
            filename: None,
            pid: process::id(),
            handle: None,
            state: PidFileState::Uninitialized,
            owner: false,
            claimed: None,
        }
    }

    /// Create a pidfile and return it active.
    ///
    /// The returned value is the scoped form: dropping it closes the pidfile.
    pub fn acquire(options: PidFileOptions) -> Result<Self, PidFileError> {
        let mut pidfile = Self::new(options);
        pidfile.create()?;
        Ok(pidfile)
    }

    pub const fn options(&self) -> &PidFileOptions {
        &self.options
    }

    /// Resolved path, once `setup`, `check`, `clean` or `create` ran.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Pid this instance writes and compares against.
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    pub const fn state(&self) -> PidFileState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PidFileState::Active
    }

    /// Whether `close` will delete the file.
    pub const fn is_owner(&self) -> bool {
        self.owner
    }

    /// Resolve the path (once) and open the descriptor if it is not open.
    pub fn setup(&mut self) -> Result<(), PidFileError> {
        let path = self.resolve()?;

        if self.handle.is_none() {
            debug!(path = %path.display(), "pidfile setup");
            let handle = LockHandle::open(&path, self.options.chmod)
                .map_err(|e| PidFileError::io(&path, e))?;
            self.handle = Some(handle);
        }

        if self.state != PidFileState::Active {
            self.state = PidFileState::Setup;
        }
        Ok(())
    }

    /// Lock the pidfile, validate its content and record our pid.
    ///
    /// Fails with `AlreadyLocked` when another descriptor holds the lock and
    /// with `AlreadyRunning` when the file names another live process. Under
    /// `allow_samepid` a file already naming this process is accepted as is.
    ///
    /// On an active instance the claim is re-attempted through a fresh
    /// descriptor, so a second `create()` conflicts with the first unless
    /// same-pid rules apply. A failed re-attempt leaves the instance active.
    pub fn create(&mut self) -> Result<(), PidFileError> {
        if self.state == PidFileState::Active {
            return self.recreate();
        }

        self.setup()?;
        let path = self.resolve()?;
        let mut handle = match self.handle.take() {
            Some(handle) => handle,
            None => LockHandle::open(&path, self.options.chmod)
                .map_err(|e| PidFileError::io(&path, e))?,
        };

        debug!(path = %path.display(), pid = self.pid, "create pidfile");
        match self.claim(&mut handle, &path) {
            Ok(claimed) => {
                self.handle = Some(handle);
                self.activate(claimed, &path)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "pidfile create failed");
                if let Err(release_err) = handle.release() {
                    warn!(path = %path.display(), error = %release_err, "failed to release pidfile descriptor");
                }
                self.state = PidFileState::Closed;
                Err(e)
            }
        }
    }

    fn recreate(&mut self) -> Result<(), PidFileError> {
        let path = self.resolve()?;
        debug!(path = %path.display(), "re-create active pidfile");

        let mut probe =
            LockHandle::open(&path, self.options.chmod).map_err(|e| PidFileError::io(&path, e))?;
        let claimed = self.claim(&mut probe, &path)?;

        if claimed.is_some() {
            // The probe won the lock, so the old descriptor no longer guards the path.
            if let Some(old) = self.handle.replace(probe) {
                old.release().map_err(|e| PidFileError::io(&path, e))?;
            }
            self.activate(claimed, &path)
        } else {
            probe.release().map_err(|e| PidFileError::io(&path, e))
        }
    }

    /// Returns the claimed file's id when our pid was written, `None` on a
    /// same-pid pass.
    fn claim(&self, handle: &mut LockHandle, path: &Path) -> Result<Option<FileId>, PidFileError> {
        let locked = if self.options.lock_pidfile {
            let locked = handle
                .try_lock_exclusive()
                .map_err(|e| PidFileError::io(path, e))?;
            if !locked && !self.options.allow_samepid {
                return Err(PidFileError::AlreadyLocked {
                    path: path.to_path_buf(),
                    pid: recorded_pid(handle),
                });
            }
            locked
        } else {
            true
        };

        let content = handle.read_content().map_err(|e| PidFileError::io(path, e))?;
        if self.inspect(path, &content)? == CheckResult::SamePid {
            debug!(path = %path.display(), "pidfile already records this process");
            return Ok(None);
        }

        if !locked {
            return Err(PidFileError::AlreadyLocked {
                path: path.to_path_buf(),
                pid: recorded_pid(handle),
            });
        }

        handle
            .apply_permissions(self.options.chmod, self.options.gid)
            .map_err(|e| PidFileError::io(path, e))?;
        handle
            .write_pid(self.pid)
            .map_err(|e| PidFileError::io(path, e))?;
        let id = handle.file_id().map_err(|e| PidFileError::io(path, e))?;
        Ok(Some(id))
    }

    fn activate(&mut self, claimed: Option<FileId>, path: &Path) -> Result<(), PidFileError> {
        self.state = PidFileState::Active;
        let Some(id) = claimed else {
            return Ok(());
        };

        self.owner = true;
        self.claimed = Some(id);
        signal::track(path, id);
        match signal::register(self.options.register_term_signal_handler) {
            Ok(disposition) => {
                info!(path = %path.display(), pid = self.pid, ?disposition, "pidfile created");
                Ok(())
            }
            Err(e) => self.abandon_claim(e),
        }
    }

    /// Undo a claim whose activation failed: the file is removed, the
    /// instance closed and `err` returned.
    pub(super) fn abandon_claim(&mut self, err: PidFileError) -> Result<(), PidFileError> {
        warn!(path = ?self.filename, error = %err, "pidfile activation failed, releasing claim");
        if let Err(close_err) = self.close() {
            warn!(error = %close_err, "failed to close pidfile after activation error");
        }
        Err(err)
    }

    /// Inspect the pidfile without modifying it.
    ///
    /// Returns `NoFile`, `Empty`, `SamePid` (only under `allow_samepid`) or
    /// `NotRunning`; a different live pid is an `AlreadyRunning` error. Without
    /// `allow_samepid` the caller's own pid counts as a live owner too.
    ///
    /// The file is always read by path, never through the held descriptor,
    /// so a pidfile deleted behind our back reports `NoFile`.
    pub fn check(&mut self) -> Result<CheckResult, PidFileError> {
        let path = self.resolve()?;
        debug!(path = %path.display(), "check pidfile");

        let Some(content) = read_content_at(&path).map_err(|e| PidFileError::io(&path, e))? else {
            return Ok(CheckResult::NoFile);
        };
        self.inspect(&path, &content)
    }

    fn inspect(&self, path: &Path, content: &str) -> Result<CheckResult, PidFileError> {
        let pid = match parse_pid(content) {
            Ok(Some(pid)) => pid,
            Ok(None) => return Ok(CheckResult::Empty),
            Err(reason) => {
                return Err(PidFileError::Unreadable {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        };

        if self.options.allow_samepid && pid == self.pid {
            return Ok(CheckResult::SamePid);
        }

        if pid_exists(pid) {
            Err(PidFileError::AlreadyRunning {
                path: path.to_path_buf(),
                pid,
            })
        } else {
            Ok(CheckResult::NotRunning)
        }
    }

    /// Remove the pidfile when it is safe to.
    ///
    /// - no file / empty file: reported, nothing removed
    /// - our own pid: `SamePid`, file left in place
    /// - a dead pid: removed (`Clean`) once the file is older than `timeout`
    /// - a different live pid: `None`, unless a non-zero `timeout` was given
    ///   and the file has not been touched for that long, in which case it is
    ///   treated as abandoned and removed
    ///
    /// `None` means nothing was done.
    pub fn clean(&mut self, timeout: Option<Duration>) -> Result<Option<CheckResult>, PidFileError> {
        let path = self.resolve()?;
        debug!(path = %path.display(), ?timeout, "clean pidfile");

        let Some(content) = read_content_at(&path).map_err(|e| PidFileError::io(&path, e))? else {
            return Ok(Some(CheckResult::NoFile));
        };

        let pid = match parse_pid(&content) {
            Ok(Some(pid)) => pid,
            Ok(None) => return Ok(Some(CheckResult::Empty)),
            Err(reason) => return Err(PidFileError::Unreadable { path, reason }),
        };

        if pid == self.pid {
            return Ok(Some(CheckResult::SamePid));
        }

        let timeout = timeout.unwrap_or_default();
        let expired = file_age(&path).map_err(|e| PidFileError::io(&path, e))? >= timeout;
        let removable = if pid_exists(pid) {
            !timeout.is_zero() && expired
        } else {
            expired
        };

        if !removable {
            debug!(path = %path.display(), pid, "pidfile not removable yet");
            return Ok(None);
        }

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(PidFileError::io(&path, e)),
        }
        info!(path = %path.display(), pid, "removed stale pidfile");
        Ok(Some(CheckResult::Clean))
    }

    /// Release the lock, close the descriptor and delete the file if this
    /// instance created it.
    ///
    /// Safe to call repeatedly and after a failed `create()`. The file is
    /// unlinked while the lock is still held, and only if the path still
    /// names the inode this instance claimed; a pidfile recreated by a
    /// successor after ours was cleaned away is left alone.
    pub fn close(&mut self) -> Result<(), PidFileError> {
        if self.handle.is_none() && !self.owner {
            if self.state != PidFileState::Uninitialized {
                self.state = PidFileState::Closed;
            }
            return Ok(());
        }

        debug!(path = ?self.filename, owner = self.owner, "closing pidfile");
        let mut result = Ok(());

        if self.owner {
            self.owner = false;
            let claimed = self.claimed.take();
            if let Some(path) = self.filename.as_deref() {
                if let Some(id) = claimed {
                    signal::untrack(path, id);
                }
                result = remove_if_ours(path, claimed);
            }
        }

        if let Some(handle) = self.handle.take() {
            let path = handle.path().to_path_buf();
            if let Err(e) = handle.release() {
                result = result.and(Err(PidFileError::io(path, e)));
            }
        }

        self.state = PidFileState::Closed;
        result
    }

    fn resolve(&mut self) -> Result<PathBuf, PidFileError> {
        if let Some(path) = &self.filename {
            return Ok(path.clone());
        }
        let path = paths::resolve_for(&self.options)?;
        self.filename = Some(path.clone());
        Ok(path)
    }

    #[cfg(test)]
    pub(crate) fn set_pid(&mut self, pid: u32) {
        self.pid = pid;
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close pidfile on drop");
        }
    }
}

impl std::fmt::Debug for PidFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidFile")
            .field("filename", &self.filename)
            .field("pid", &self.pid)
            .field("state", &self.state)
            .field("owner", &self.owner)
            .field("claimed", &self.claimed)
            .finish_non_exhaustive()
    }
}

fn recorded_pid(handle: &LockHandle) -> Option<u32> {
    handle
        .read_content()
        .ok()
        .and_then(|content| parse_pid(&content).ok().flatten())
}

/// Unlink `path` only while it is still the file this instance claimed.
fn remove_if_ours(path: &Path, claimed: Option<FileId>) -> Result<(), PidFileError> {
    let current = FileId::at_path(path).map_err(|e| PidFileError::io(path, e))?;
    match current {
        None => Ok(()),
        Some(id) if Some(id) != claimed => {
            warn!(path = %path.display(), "pidfile was replaced by another instance, leaving it in place");
            Ok(())
        }
        Some(_) => match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed pidfile");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PidFileError::io(path, e)),
        },
    }
}

fn file_age(path: &Path) -> io::Result<Duration> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default())
}
