//! Command handlers, one module per subcommand.

pub mod check;
pub mod clean;
pub mod path;
pub mod run;
