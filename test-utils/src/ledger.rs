use dbft_error::{Error, ErrorKind};
use dbft_traits::{Block, Ledger, Snapshot};
use dbft_types::{Hash256, Height};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// An in-memory ledger: committed blocks live in a `Vec`, committed
/// transaction hashes in a `HashSet` for O(1) `contains`.
#[derive(Default)]
pub struct MockLedger {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    blocks: Vec<Block>,
    committed_hashes: HashSet<Hash256>,
}

impl MockLedger {
    /// An empty ledger at height 0.
    pub fn new() -> Self {
        MockLedger::default()
    }

    /// All blocks committed so far, in commit order.
    pub fn blocks(&self) -> Vec<Block> {
        self.inner.read().blocks.clone()
    }
}

impl Ledger for MockLedger {
    fn current_height(&self) -> Height {
        self.inner.read().blocks.len() as Height
    }

    fn snapshot_at(&self, h: Height) -> Arc<dyn Snapshot> {
        let guard = self.inner.read();
        Arc::new(MockSnapshot {
            height: h,
            committed_hashes: guard.committed_hashes.clone(),
        })
    }

    fn contains(&self, hash: &Hash256) -> bool {
        self.inner.read().committed_hashes.contains(hash)
    }

    fn commit_block(&self, block: Block) -> Result<(), Error> {
        let mut guard = self.inner.write();
        // Height 0 is the implicit, unstored genesis; the first real commit
        // lands at height 1, matching `ConsensusEngine`'s
        // `current_height() + 1` target for the block it is assembling.
        let expected = guard.blocks.len() as Height + 1;
        if block.height != expected {
            return Err(Error::new(
                ErrorKind::Fatal,
                format!(
                    "out-of-order block commit: expected height {}, got {}",
                    expected, block.height
                ),
            ));
        }
        guard.committed_hashes.extend(block.tx_hashes.iter().copied());
        guard.blocks.push(block);
        Ok(())
    }
}

/// A frozen view of [`MockLedger`] at the moment the snapshot was taken.
pub struct MockSnapshot {
    height: Height,
    committed_hashes: HashSet<Hash256>,
}

impl Snapshot for MockSnapshot {
    fn height(&self) -> Height {
        self.height
    }

    fn contains(&self, hash: &Hash256) -> bool {
        self.committed_hashes.contains(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbft_traits::Block as LedgerBlock;

    #[test]
    fn commit_block_is_atomic_and_ordered() {
        let ledger = MockLedger::new();
        assert_eq!(ledger.current_height(), 0);

        let tx_hash = Hash256::hash(b"tx-1");
        ledger
            .commit_block(LedgerBlock {
                height: 1,
                tx_hashes: vec![tx_hash],
                nonce: 1,
                timestamp_ms: 1,
            })
            .unwrap();

        assert_eq!(ledger.current_height(), 1);
        assert!(ledger.contains(&tx_hash));

        let out_of_order = ledger.commit_block(LedgerBlock {
            height: 5,
            tx_hashes: vec![],
            nonce: 2,
            timestamp_ms: 2,
        });
        assert!(out_of_order.is_err());
        assert_eq!(ledger.current_height(), 1);
    }
}
