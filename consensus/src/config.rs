use serde::{Deserialize, Serialize};

/// Tunables for the consensus engine. Defaults are sane for a 4-node test
/// network; production deployments size `n` to their validator set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConsensusConfig {
    /// Number of consensus seats, `N = 3f + 1`.
    pub n: u16,
    /// This node's fixed seat index, `0..n`.
    pub local_seat: u16,
    /// Minimum spacing between blocks.
    pub block_time_min_ms: u64,
    /// Base view timeout, doubled on every view change up to
    /// `view_timeout_ceiling_doublings`.
    pub view_timeout_base_ms: u64,
    /// Number of doublings after which the view timeout stops growing.
    pub view_timeout_ceiling_doublings: u32,
    /// Maximum transactions pulled into one block proposal.
    pub max_block_tx: usize,
    /// Maximum serialized size, in bytes, of the transactions pulled into
    /// one block proposal.
    pub max_block_bytes: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            n: 4,
            local_seat: 0,
            block_time_min_ms: 15_000,
            view_timeout_base_ms: 15_000,
            view_timeout_ceiling_doublings: 3,
            max_block_tx: 4000,
            max_block_bytes: 4 * 1024 * 1024,
        }
    }
}

impl ConsensusConfig {
    /// The view timeout for `view`, doubling per view change and capped at
    /// `view_timeout_ceiling_doublings` doublings.
    pub fn view_timeout_ms(&self, view: u8) -> u64 {
        let doublings = (view as u32).min(self.view_timeout_ceiling_doublings);
        self.view_timeout_base_ms.saturating_mul(1 << doublings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_timeout_doubles_then_caps() {
        let cfg = ConsensusConfig::default();
        assert_eq!(cfg.view_timeout_ms(0), 15_000);
        assert_eq!(cfg.view_timeout_ms(1), 30_000);
        assert_eq!(cfg.view_timeout_ms(2), 60_000);
        assert_eq!(cfg.view_timeout_ms(3), 120_000);
        assert_eq!(cfg.view_timeout_ms(4), 120_000);
        assert_eq!(cfg.view_timeout_ms(200), 120_000);
    }
}
