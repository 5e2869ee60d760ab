//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure, the subcommands and the
//! pidfile options they share.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pidguard_core::PidFileOptions;

/// Command-line interface for inspecting and holding pidfiles.
#[derive(Parser, Debug)]
#[command(name = "pidguard")]
#[command(about = "Guard single-instance execution with a pidfile")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Pidfile location options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PidFileArgs {
    /// Pidfile name (defaults to the program name)
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Directory holding the pidfile (created if missing)
    #[arg(short = 'd', long = "dir")]
    pub dir: Option<PathBuf>,

    /// Do not append `.pid` to the name
    #[arg(long = "no-suffix")]
    pub no_suffix: bool,

    /// Use the system temp directory instead of probing run directories
    #[arg(long = "tmpdir")]
    pub tmpdir: bool,
}

impl PidFileArgs {
    pub fn to_options(&self) -> PidFileOptions {
        let mut options = PidFileOptions::default()
            .with_enforce_dotpid_postfix(!self.no_suffix)
            .with_force_tmpdir(self.tmpdir);
        options.pidname.clone_from(&self.name);
        options.piddir.clone_from(&self.dir);
        options
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved pidfile path
    Path {
        #[command(flatten)]
        pidfile: PidFileArgs,
    },

    /// Report whether the pidfile is free, stale or held
    Check {
        #[command(flatten)]
        pidfile: PidFileArgs,
    },

    /// Remove the pidfile if its owner is gone
    Clean {
        #[command(flatten)]
        pidfile: PidFileArgs,

        /// Only remove files untouched for this many seconds
        #[arg(long = "timeout", value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Hold the pidfile while running a command
    Run {
        #[command(flatten)]
        pidfile: PidFileArgs,

        /// Check the recorded pid instead of taking an flock
        #[arg(long = "no-lock")]
        no_lock: bool,

        /// Accept a pidfile that already records this process
        #[arg(long = "allow-samepid")]
        allow_samepid: bool,

        /// Command to run, after `--`
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_collects_trailing_command() {
        let cli = Cli::parse_from([
            "pidguard", "-v", "run", "--name", "backup", "--no-lock", "--", "sleep", "5",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                pidfile,
                no_lock,
                allow_samepid,
                command,
            } => {
                assert_eq!(pidfile.name.as_deref(), Some("backup"));
                assert!(no_lock);
                assert!(!allow_samepid);
                assert_eq!(command, vec!["sleep".to_string(), "5".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_args_map_to_options() {
        let args = PidFileArgs {
            name: Some("svc".into()),
            dir: Some(PathBuf::from("/tmp/svc")),
            no_suffix: true,
            tmpdir: false,
        };
        let options = args.to_options();
        assert_eq!(options.pidname.as_deref(), Some("svc"));
        assert_eq!(options.piddir, Some(PathBuf::from("/tmp/svc")));
        assert!(!options.enforce_dotpid_postfix);
        assert!(options.lock_pidfile);
    }
}
