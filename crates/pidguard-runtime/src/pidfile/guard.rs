//! Scoped pidfile ownership.

use std::ops::{Deref, DerefMut};

use pidguard_core::PidFileError;
use tracing::warn;

use super::lifecycle::PidFile;

/// Keeps a [`PidFile`] created for as long as the guard lives.
///
/// Returned by [`PidFile::guard`]. Dropping the guard closes the pidfile;
/// use [`PidFileGuard::close`] to observe close errors instead of logging them.
#[must_use = "the pidfile is closed as soon as the guard is dropped"]
pub struct PidFileGuard<'a> {
    pidfile: &'a mut PidFile,
}

impl PidFile {
    /// Create the pidfile and tie its lifetime to the returned guard.
    pub fn guard(&mut self) -> Result<PidFileGuard<'_>, PidFileError> {
        self.create()?;
        Ok(PidFileGuard { pidfile: self })
    }
}

impl PidFileGuard<'_> {
    /// Close the pidfile now, surfacing any error.
    pub fn close(self) -> Result<(), PidFileError> {
        // Drop runs afterwards and finds nothing left to close.
        self.pidfile.close()
    }
}

impl Deref for PidFileGuard<'_> {
    type Target = PidFile;

    fn deref(&self) -> &Self::Target {
        self.pidfile
    }
}

impl DerefMut for PidFileGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.pidfile
    }
}

impl Drop for PidFileGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.pidfile.close() {
            warn!(error = %e, "failed to close pidfile guard");
        }
    }
}
