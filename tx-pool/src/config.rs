use serde::{Deserialize, Serialize};

/// Pool-wide limits and timeouts, loaded from the node's TOML config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TxPoolConfig {
    /// Hard cap on the number of admitted entries (`MAX_POOL`). `submit`
    /// fails with pool-full once this is reached; there is no LRU or
    /// fee-based preemption in this core.
    pub max_pool: usize,
    /// Simultaneous-pending cap per sender (`MAX_PER_SENDER`).
    pub max_per_sender: usize,
    /// Upper bound on how many ready hashes `take` returns (`MAX_BLOCK_TX`).
    pub max_block_tx: usize,
    /// How long a validator has to answer before its verdict is treated as
    /// a synthesized fail (`VERIFY_TIMEOUT`).
    pub verify_timeout_ms: u64,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        TxPoolConfig {
            max_pool: 10_000,
            max_per_sender: 64,
            max_block_tx: 4_000,
            verify_timeout_ms: 2_000,
        }
    }
}
