//! Handler behaviour against real pidfiles in a temp directory.

use std::fs;

use pidguard_cli::{CliError, PidFileArgs, exit_code_for, handlers};
use pidguard_core::{CheckResult, PidFileOptions, TermSignalPolicy};
use pidguard_runtime::PidFile;

fn options(dir: &tempfile::TempDir) -> PidFileOptions {
    PidFileArgs {
        name: Some("clitest".into()),
        dir: Some(dir.path().to_path_buf()),
        ..PidFileArgs::default()
    }
    .to_options()
    .with_term_signal(TermSignalPolicy::Skip)
}

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

#[test]
fn check_reports_missing_and_stale_files() {
    let tmp = tempfile::tempdir().unwrap();
    assert_eq!(handlers::check::execute(options(&tmp)).unwrap(), CheckResult::NoFile);

    fs::write(tmp.path().join("clitest.pid"), "999999999\n").unwrap();
    assert_eq!(handlers::check::execute(options(&tmp)).unwrap(), CheckResult::NotRunning);
}

#[test]
fn clean_removes_stale_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("clitest.pid");
    fs::write(&path, "999999999\n").unwrap();

    let outcome = handlers::clean::execute(options(&tmp), None).unwrap();
    assert_eq!(outcome, Some(CheckResult::Clean));
    assert!(!path.exists());
}

#[test]
fn run_propagates_exit_code_and_removes_pidfile() {
    let tmp = tempfile::tempdir().unwrap();

    assert_eq!(handlers::run::execute(options(&tmp), &command(&["true"])).unwrap(), 0);
    assert_eq!(
        handlers::run::execute(options(&tmp), &command(&["sh", "-c", "exit 3"])).unwrap(),
        3
    );
    assert!(!tmp.path().join("clitest.pid").exists());
}

#[test]
fn run_sees_pidfile_while_command_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("clitest.pid");
    let script = format!("test \"$(cat {})\" = \"$PPID\"", path.display());

    let code = handlers::run::execute(options(&tmp), &command(&["sh", "-c", &script])).unwrap();
    assert_eq!(code, 0);
}

#[test]
fn run_conflicts_with_held_pidfile() {
    let tmp = tempfile::tempdir().unwrap();
    let _held = PidFile::acquire(options(&tmp)).unwrap();

    let err = handlers::run::execute(options(&tmp), &command(&["true"])).unwrap_err();
    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Conflict(_))));
    assert_eq!(exit_code_for(&err), 75);
}

#[test]
fn run_reports_unstartable_command() {
    let tmp = tempfile::tempdir().unwrap();

    let err = handlers::run::execute(options(&tmp), &command(&["/nonexistent/pidguard-cmd"]))
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 71);
    assert!(!tmp.path().join("clitest.pid").exists());
}
