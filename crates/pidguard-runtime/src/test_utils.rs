//! Test utilities for tests that touch process-wide state.
//!
//! Environment variables and the SIGTERM disposition are shared by every
//! test thread in the binary. Tests that read or write either must hold the
//! matching lock.

use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes tests that depend on `PIDGUARD_PID_DIR`.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that create pidfiles or inspect the SIGTERM disposition.
pub static SIGNAL_LOCK: Mutex<()> = Mutex::new(());

/// Acquire [`SIGNAL_LOCK`], ignoring poison left by a failed test.
pub fn signal_lock() -> MutexGuard<'static, ()> {
    SIGNAL_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RAII guard that restores an environment variable to its original value on drop.
pub struct EnvVarGuard {
    key: String,
    previous: Option<String>,
}

impl EnvVarGuard {
    /// Set an environment variable and return a guard that will restore it.
    #[allow(unsafe_code)]
    pub fn set(key: &str, value: &str) -> Self {
        let previous = env::var(key).ok();
        unsafe {
            env::set_var(key, value);
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvVarGuard {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if let Some(ref value) = self.previous {
            unsafe {
                env::set_var(&self.key, value);
            }
        } else {
            unsafe {
                env::remove_var(&self.key);
            }
        }
    }
}
