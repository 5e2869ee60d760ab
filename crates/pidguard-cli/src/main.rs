//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pidguard_cli::{Cli, Commands, exit_code_for, handlers};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(command: Commands) -> anyhow::Result<u8> {
    match command {
        Commands::Path { pidfile } => handlers::path::execute(&pidfile.to_options()).map(|()| 0),
        Commands::Check { pidfile } => handlers::check::execute(pidfile.to_options()).map(|_| 0),
        Commands::Clean { pidfile, timeout } => {
            handlers::clean::execute(pidfile.to_options(), timeout).map(|_| 0)
        }
        Commands::Run {
            pidfile,
            no_lock,
            allow_samepid,
            command,
        } => {
            let options = pidfile
                .to_options()
                .with_lock_pidfile(!no_lock)
                .with_allow_samepid(allow_samepid);
            handlers::run::execute(options, &command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
