use crate::exit_code::ExitCode;
use dbft_consensus::ConsensusConfig;
use dbft_logger::LoggerConfig;
use dbft_tx_pool::TxPoolConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The node's full TOML configuration: one nested table per subsystem,
/// loaded once at startup and handed to each component's constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NodeConfig {
    pub consensus: ConsensusConfig,
    pub tx_pool: TxPoolConfig,
    pub logger: LoggerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            consensus: ConsensusConfig::default(),
            tx_pool: TxPoolConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Reads and parses the TOML config file at `path`. A missing or
    /// malformed file is a config error (`ExitCode::Config`), never a
    /// runtime fault.
    pub fn load(path: &Path) -> Result<NodeConfig, ExitCode> {
        let text = std::fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks `serde` can't express: the local seat must be a
    /// valid index into the consensus set.
    fn validate(&self) -> Result<(), ExitCode> {
        if self.consensus.local_seat >= self.consensus.n {
            return Err(ExitCode::Config);
        }
        if self.consensus.n == 0 {
            return Err(ExitCode::Config);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_seat_is_rejected() {
        let mut config = NodeConfig::default();
        config.consensus.local_seat = config.consensus.n;
        assert_eq!(config.validate(), Err(ExitCode::Config));
    }

    #[test]
    fn parses_a_minimal_toml_document() {
        let toml = r#"
            [consensus]
            n = 7
            local_seat = 2
        "#;
        let config: NodeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.consensus.n, 7);
        assert_eq!(config.consensus.local_seat, 2);
        // Untouched sections fall back to their defaults.
        assert_eq!(config.tx_pool.max_pool, TxPoolConfig::default().max_pool);
    }
}
