use dbft_app_config::{ExitCode, NodeConfig};
use dbft_logger::{error, info};
use std::path::Path;

/// Writes a default config file to `path`. Refuses to overwrite an existing
/// file unless `force` is set.
pub fn init(path: &Path, force: bool) -> ExitCode {
    if path.exists() && !force {
        error!(target: "dbft_bin", path = %path.display(), "refusing to overwrite existing config, pass --force");
        return ExitCode::Config;
    }

    let config = NodeConfig::default();
    let rendered = match toml::to_string_pretty(&config) {
        Ok(text) => text,
        Err(e) => {
            error!(target: "dbft_bin", error = %e, "failed to serialize default config");
            return ExitCode::Failure;
        }
    };

    if let Err(e) = std::fs::write(path, rendered) {
        error!(target: "dbft_bin", error = %e, "failed to write config file");
        return ExitCode::Failure;
    }

    info!(target: "dbft_bin", path = %path.display(), "wrote default config");
    ExitCode::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbft.toml");
        assert_eq!(init(&path, false), ExitCode::Ok);
        assert_eq!(init(&path, false), ExitCode::Config);
        assert_eq!(init(&path, true), ExitCode::Ok);
    }

    #[test]
    fn written_config_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbft.toml");
        init(&path, false);
        let loaded = NodeConfig::load(&path).unwrap();
        assert_eq!(loaded.consensus.n, NodeConfig::default().consensus.n);
    }
}
