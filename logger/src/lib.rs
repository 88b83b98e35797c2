//! Structured logging facade.
//!
//! Every other crate logs through the re-exported `tracing` macros rather
//! than printing directly, so that a single call in the node's entry point
//! controls format, filtering, and destination for the whole process.

pub use tracing::{debug, error, info, span, trace, warn, Level};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// Logger configuration, deserialized from the node's TOML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `tracing-subscriber` env-filter directive string, e.g. `"info,dbft_consensus=debug"`.
    pub filter: String,
    /// Whether to emit ANSI color codes (disabled automatically for non-ttys).
    pub color: bool,
    /// Emit machine-readable logs with explicit field names instead of a
    /// human-oriented single line.
    pub structured: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            filter: "info".to_owned(),
            color: true,
            structured: false,
        }
    }
}

/// A guard that keeps the global subscriber installed; dropping it does
/// nothing special today but mirrors the shape of the teacher's setup guard
/// so a future flush-on-drop sink can be added without touching call sites.
pub struct LoggerGuard;

/// Installs the process-wide tracing subscriber from `config`.
///
/// Must be called at most once per process; re-initializing is a logic
/// error in the same sense the node's validator registry forbids
/// reinitialization (see design notes).
pub fn init(config: &LoggerConfig) -> Result<LoggerGuard, String> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| format!("invalid logger filter {:?}: {}", config.filter, e))?;

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_ansi(config.color)
        .with_target(true);

    let result = if config.structured {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    result.map_err(|e| format!("logger already initialized: {}", e))?;
    Ok(LoggerGuard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.filter, "info");
        assert!(cfg.color);
    }
}
