//! CLI argument parsing and TOML configuration loading, the ambient surface
//! named in the external interfaces section but otherwise out of scope for
//! the core.

mod cli;
mod config;
mod exit_code;

pub use cli::{Cli, Command};
pub use config::NodeConfig;
pub use exit_code::ExitCode;
