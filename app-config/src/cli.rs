use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The dBFT node's command-line entry point.
#[derive(Debug, Parser)]
#[command(name = "dbftd", about = "A dBFT consensus node")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Starts the node: loads the config, wires the pool and consensus
    /// tasks, and runs until shutdown.
    Run {
        #[arg(short, long, default_value = "dbft.toml")]
        config: PathBuf,
    },
    /// Writes a default config file to `path`, refusing to overwrite an
    /// existing one unless `--force` is given.
    Init {
        #[arg(short, long, default_value = "dbft.toml")]
        config: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Loads and validates a config file without starting the node.
    VerifyConfig {
        #[arg(short, long, default_value = "dbft.toml")]
        config: PathBuf,
    },
}
