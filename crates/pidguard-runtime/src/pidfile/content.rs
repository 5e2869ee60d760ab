//! Pidfile content parsing.

/// Parse the pid recorded in a pidfile.
///
/// Only the first line counts. Returns `Ok(None)` for an empty or
/// whitespace-only file and `Err(reason)` when the line is not a pid.
pub fn parse_pid(content: &str) -> Result<Option<u32>, String> {
    let line = content.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    line.parse::<u32>()
        .map(Some)
        .map_err(|e| format!("invalid pid {line:?}: {e}"))
}
