//! Pidfile configuration.
//!
//! `PidFileOptions` is a plain value type: all OS interaction happens in the
//! runtime crate. It deserializes with defaults so daemons can embed it in
//! their own config files.

use std::ffi::c_int;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default permission bits applied to a claimed pidfile.
pub const DEFAULT_CHMOD: u32 = 0o644;

/// Environment variable overriding the probed default pid directory.
pub const PID_DIR_ENV: &str = "PIDGUARD_PID_DIR";

/// Raw termination handler, as installed with `sigaction`.
pub type TermHandlerFn = extern "C" fn(c_int);

/// What to do with the SIGTERM disposition when a pidfile is created.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSignalPolicy {
    /// Install the cleanup handler only if SIGTERM still has its default
    /// disposition. Custom handlers and `SIG_IGN` are left alone.
    #[default]
    Auto,
    /// Install the cleanup handler unless SIGTERM is ignored.
    Register,
    /// Leave the SIGTERM disposition untouched.
    Skip,
    /// Install this handler verbatim. The handler is responsible for any
    /// cleanup it wants.
    #[serde(skip)]
    Custom(TermHandlerFn),
}

impl From<bool> for TermSignalPolicy {
    fn from(register: bool) -> Self {
        if register { Self::Register } else { Self::Skip }
    }
}

impl From<TermHandlerFn> for TermSignalPolicy {
    fn from(handler: TermHandlerFn) -> Self {
        Self::Custom(handler)
    }
}

/// Configuration for a single pidfile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PidFileOptions {
    /// Logical name; defaults to the invoking executable's base name.
    pub pidname: Option<String>,

    /// Target directory; probed from conventional locations when unset.
    pub piddir: Option<PathBuf>,

    /// Append `.pid` to `pidname` unless already present.
    pub enforce_dotpid_postfix: bool,

    /// Skip directory probing and use the system temp directory.
    pub force_tmpdir: bool,

    /// Permission bits applied when the pidfile is claimed.
    pub chmod: u32,

    /// Take an exclusive advisory lock. When disabled only the recorded pid
    /// guards against a second instance.
    pub lock_pidfile: bool,

    /// Let the owning process re-acquire its own pidfile.
    pub allow_samepid: bool,

    /// Group ownership applied when the pidfile is claimed.
    pub gid: Option<u32>,

    /// SIGTERM handling policy.
    pub register_term_signal_handler: TermSignalPolicy,
}

impl Default for PidFileOptions {
    fn default() -> Self {
        Self {
            pidname: None,
            piddir: None,
            enforce_dotpid_postfix: true,
            force_tmpdir: false,
            chmod: DEFAULT_CHMOD,
            lock_pidfile: true,
            allow_samepid: false,
            gid: None,
            register_term_signal_handler: TermSignalPolicy::Auto,
        }
    }
}

impl PidFileOptions {
    /// Options with a logical name and every other field at its default.
    pub fn named(pidname: impl Into<String>) -> Self {
        Self::default().with_pidname(pidname)
    }

    #[must_use]
    pub fn with_pidname(mut self, pidname: impl Into<String>) -> Self {
        self.pidname = Some(pidname.into());
        self
    }

    #[must_use]
    pub fn with_piddir(mut self, piddir: impl Into<PathBuf>) -> Self {
        self.piddir = Some(piddir.into());
        self
    }

    #[must_use]
    pub const fn with_enforce_dotpid_postfix(mut self, enforce: bool) -> Self {
        self.enforce_dotpid_postfix = enforce;
        self
    }

    #[must_use]
    pub const fn with_force_tmpdir(mut self, force: bool) -> Self {
        self.force_tmpdir = force;
        self
    }

    #[must_use]
    pub const fn with_chmod(mut self, mode: u32) -> Self {
        self.chmod = mode;
        self
    }

    #[must_use]
    pub const fn with_lock_pidfile(mut self, lock: bool) -> Self {
        self.lock_pidfile = lock;
        self
    }

    #[must_use]
    pub const fn with_allow_samepid(mut self, allow: bool) -> Self {
        self.allow_samepid = allow;
        self
    }

    #[must_use]
    pub const fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    #[must_use]
    pub fn with_term_signal(mut self, policy: impl Into<TermSignalPolicy>) -> Self {
        self.register_term_signal_handler = policy.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn noop(_: c_int) {}

    #[test]
    fn defaults_match_documented_values() {
        let options = PidFileOptions::default();
        assert!(options.pidname.is_none());
        assert!(options.piddir.is_none());
        assert!(options.enforce_dotpid_postfix);
        assert!(!options.force_tmpdir);
        assert_eq!(options.chmod, 0o644);
        assert!(options.lock_pidfile);
        assert!(!options.allow_samepid);
        assert!(options.gid.is_none());
        assert!(matches!(
            options.register_term_signal_handler,
            TermSignalPolicy::Auto
        ));
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let json = r#"{"pidname": "worker", "lock_pidfile": false, "register_term_signal_handler": "skip"}"#;
        let options: PidFileOptions = serde_json::from_str(json).expect("deserialize");

        assert_eq!(options.pidname.as_deref(), Some("worker"));
        assert!(!options.lock_pidfile);
        assert!(options.enforce_dotpid_postfix);
        assert_eq!(options.chmod, DEFAULT_CHMOD);
        assert!(matches!(
            options.register_term_signal_handler,
            TermSignalPolicy::Skip
        ));
    }

    #[test]
    fn policy_conversions() {
        assert!(matches!(TermSignalPolicy::from(true), TermSignalPolicy::Register));
        assert!(matches!(TermSignalPolicy::from(false), TermSignalPolicy::Skip));

        let options = PidFileOptions::named("svc").with_term_signal(noop as TermHandlerFn);
        match options.register_term_signal_handler {
            TermSignalPolicy::Custom(handler) => {
                assert_eq!(handler as usize, noop as TermHandlerFn as usize);
            }
            other => panic!("expected custom policy, got {other:?}"),
        }
    }
}
