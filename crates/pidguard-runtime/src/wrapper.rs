//! Run an operation while holding a pidfile.
//!
//! The pidfile is created before the operation runs and closed on every exit
//! path. Conflicts from `create()` reach the caller unchanged, as do the
//! operation's own errors.

use pidguard_core::{PidFileError, PidFileOptions};
use tracing::warn;

use crate::pidfile::PidFile;

/// Run `op` between `create()` and `close()` of a pidfile built from `options`.
///
/// If `op` fails, its error is returned and a close error is only logged.
/// If `op` succeeds, a close error is returned instead of the value.
pub fn with_pidfile<T, E, F>(options: PidFileOptions, op: F) -> Result<T, E>
where
    F: FnOnce(&PidFile) -> Result<T, E>,
    E: From<PidFileError>,
{
    let mut pidfile = PidFile::new(options);
    pidfile.create()?;

    let outcome = op(&pidfile);
    let closed = pidfile.close();

    match outcome {
        Ok(value) => {
            closed?;
            Ok(value)
        }
        Err(e) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "failed to close pidfile after operation error");
            }
            Err(e)
        }
    }
}

/// Wrap a zero-argument operation so each call runs under a fresh pidfile.
///
/// ```no_run
/// use pidguard_core::{PidFileError, PidFileOptions};
/// use pidguard_runtime::pidfile_guarded;
///
/// let mut nightly = pidfile_guarded(PidFileOptions::named("nightly-sync"), || {
///     // exclusive work
///     Ok::<_, PidFileError>(())
/// });
/// nightly()?;
/// # Ok::<(), PidFileError>(())
/// ```
pub fn pidfile_guarded<T, E, F>(options: PidFileOptions, mut op: F) -> impl FnMut() -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: From<PidFileError>,
{
    move || with_pidfile(options.clone(), |_| op())
}
