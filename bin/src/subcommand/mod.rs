pub mod init;
pub mod run;

use dbft_app_config::{ExitCode, NodeConfig};
use dbft_logger::info;
use std::path::Path;

/// Loads and validates a config file without starting the node.
pub fn verify_config(path: &Path) -> ExitCode {
    match NodeConfig::load(path) {
        Ok(_) => {
            info!(target: "dbft_bin", path = %path.display(), "config is valid");
            ExitCode::Ok
        }
        Err(code) => code,
    }
}
