//! The node executable's entry point, kept separate from `main.rs` so
//! tests can drive it with an in-process [`Cli`] instead of real argv and
//! `std::process::exit`.

pub mod subcommand;

use dbft_app_config::{Cli, Command, ExitCode};

/// Dispatches a parsed [`Cli`] invocation to its subcommand.
pub fn run_app(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config } => subcommand::run::run(&config),
        Command::Init { config, force } => subcommand::init::init(&config, force),
        Command::VerifyConfig { config } => subcommand::verify_config(&config),
    }
}
