//! PID file management for single-instance processes.
//!
//! Provides the pidfile lifecycle, advisory locking and liveness checks.
//!
//! # Safety guarantees
//! - The pid is only written by the descriptor holding the exclusive lock
//!   (or, with locking disabled, after the content shows no live owner)
//! - The file is unlinked before the lock is released, never after
//! - Only the instance that wrote the pid deletes the file

mod content;
mod guard;
mod lifecycle;
mod lock;
mod verify;


pub use content::parse_pid;
pub use guard::PidFileGuard;
pub use lifecycle::{PidFile, PidFileState};
pub use lock::{FileId, LockHandle, read_content_at};
pub use verify::pid_exists;
