//! Open pidfile descriptor and its exclusive advisory lock.
//!
//! Format: single-line text file
//! ```text
//! <pid>
//! ```

use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt, fchown};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nix::sys::stat::FileStat;
use tracing::trace;

/// Upper bound on bytes read when inspecting a pidfile.
const READ_LIMIT: u64 = 32;

/// Device and inode of a pidfile.
///
/// A successor that recreates the pidfile after ours was removed gets a new
/// inode, so comparing ids tells our file apart from theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileId {
    pub(crate) dev: u64,
    pub(crate) ino: u64,
}

impl FileId {
    fn from_metadata(meta: &Metadata) -> Self {
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    /// Id of whatever is at `path` now; `Ok(None)` if nothing is.
    pub fn at_path(path: &Path) -> io::Result<Option<Self>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(Self::from_metadata(&meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether a raw `stat(2)` result describes this file.
    #[allow(clippy::unnecessary_cast, clippy::cast_sign_loss)]
    pub(crate) const fn matches(self, stat: &FileStat) -> bool {
        stat.st_dev as u64 == self.dev && stat.st_ino as u64 == self.ino
    }
}

enum Descriptor {
    Open(File),
    Locked(Flock<File>),
}

impl Descriptor {
    fn file(&self) -> &File {
        match self {
            Self::Open(file) => file,
            Self::Locked(lock) => &**lock,
        }
    }
}

/// Exclusive owner of one open pidfile descriptor.
///
/// The lock is a `flock(2)` lock: it belongs to this open file description,
/// so a second `LockHandle` on the same path contends with it even inside
/// the same process. Dropping the handle releases lock and descriptor.
pub struct LockHandle {
    path: PathBuf,
    descriptor: Option<Descriptor>,
}

impl LockHandle {
    /// Open `path` for read and update, creating it with `mode` if absent.
    ///
    /// Existing content is preserved; nothing is locked yet.
    pub fn open(path: &Path, mode: u32) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(mode)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            descriptor: Some(Descriptor::Open(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn is_locked(&self) -> bool {
        matches!(self.descriptor, Some(Descriptor::Locked(_)))
    }

    /// Try to take the exclusive lock without blocking.
    ///
    /// Returns `Ok(false)` when another descriptor holds it. Re-locking a
    /// handle that already holds the lock succeeds.
    pub fn try_lock_exclusive(&mut self) -> io::Result<bool> {
        let descriptor = self.descriptor.take().ok_or_else(closed)?;

        let file = match descriptor {
            Descriptor::Locked(lock) => {
                self.descriptor = Some(Descriptor::Locked(lock));
                return Ok(true);
            }
            Descriptor::Open(file) => file,
        };

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                trace!(path = %self.path.display(), "acquired pidfile lock");
                self.descriptor = Some(Descriptor::Locked(lock));
                Ok(true)
            }
            Err((file, errno)) => {
                self.descriptor = Some(Descriptor::Open(file));
                if errno == Errno::EWOULDBLOCK {
                    Ok(false)
                } else {
                    Err(io::Error::from(errno))
                }
            }
        }
    }

    /// Drop the lock, keeping the descriptor open.
    pub fn unlock(&mut self) -> io::Result<()> {
        match self.descriptor.take() {
            Some(Descriptor::Locked(lock)) => match lock.unlock() {
                Ok(file) => {
                    self.descriptor = Some(Descriptor::Open(file));
                    Ok(())
                }
                Err((lock, errno)) => {
                    self.descriptor = Some(Descriptor::Locked(lock));
                    Err(io::Error::from(errno))
                }
            },
            other => {
                self.descriptor = other;
                Ok(())
            }
        }
    }

    /// Read the head of the file from offset 0.
    pub fn read_content(&self) -> io::Result<String> {
        read_head(self.file()?)
    }

    /// Replace the file content with `"<pid>\n"` and flush it to disk.
    pub fn write_pid(&self, pid: u32) -> io::Result<()> {
        let mut file = self.file()?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{pid}")?;
        file.flush()?;
        file.sync_data()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Device and inode of the open descriptor (`fstat`).
    pub fn file_id(&self) -> io::Result<FileId> {
        self.file()?.metadata().map(|meta| FileId::from_metadata(&meta))
    }

    /// Apply permission bits and, if given, group ownership to the descriptor.
    pub fn apply_permissions(&self, mode: u32, gid: Option<u32>) -> io::Result<()> {
        let file = self.file()?;
        file.set_permissions(Permissions::from_mode(mode))?;
        if gid.is_some() {
            fchown(file, None, gid)?;
        }
        Ok(())
    }

    /// Unlock (if locked) and close the descriptor.
    pub fn release(mut self) -> io::Result<()> {
        self.unlock()?;
        self.descriptor = None;
        trace!(path = %self.path.display(), "released pidfile descriptor");
        Ok(())
    }

    fn file(&self) -> io::Result<&File> {
        self.descriptor.as_ref().map(Descriptor::file).ok_or_else(closed)
    }
}

/// Read the head of the pidfile at `path` without creating it.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_content_at(path: &Path) -> io::Result<Option<String>> {
    match File::open(path) {
        Ok(file) => read_head(&file).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn read_head(mut file: &File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::with_capacity(READ_LIMIT as usize);
    file.take(READ_LIMIT).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn closed() -> io::Error {
    io::Error::other("pidfile descriptor already closed")
}
