//! Process liveness probing.

use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;

/// Check if a PID denotes a live process.
///
/// Uses `kill` with the null signal, which performs the permission and
/// existence checks without delivering anything.
///
/// # Caveats
/// The kernel recycles PIDs. A stale pidfile whose PID was reused by an
/// unrelated process reads as alive. This race is inherent to pidfiles.
pub fn pid_exists(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false, // No such process
        Err(_) => true,             // Process exists but we lack permission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_exists_for_self() {
        assert!(pid_exists(std::process::id()));
    }

    #[test]
    fn pid_exists_false_for_impossible_pid() {
        assert!(!pid_exists(999_999_999));
    }

    #[test]
    fn pid_zero_is_never_alive() {
        // kill(0, ..) targets the process group, not a pid
        assert!(!pid_exists(0));
    }

    #[test]
    fn reaped_child_is_not_alive() {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("failed to spawn true");
        let pid = child.id();
        child.wait().expect("wait");

        assert!(!pid_exists(pid));
    }
}
