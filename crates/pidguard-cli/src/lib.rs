//! Command-line front end for pidguard.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by main.rs only
use tracing_subscriber as _;

pub mod error;
pub mod handlers;
pub mod parser;

pub use error::{CliError, exit_code_for};
pub use parser::{Cli, Commands, PidFileArgs};
