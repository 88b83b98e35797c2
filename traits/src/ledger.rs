use dbft_error::Error;
use dbft_types::{Hash256, Height};
use std::sync::Arc;

/// A committed block, as the consensus engine hands it to the ledger.
///
/// The on-disk layout of a block is out of scope for the core; this is the
/// in-memory shape the consensus state machine assembles and the ledger
/// consumes atomically.
#[derive(Debug, Clone)]
pub struct Block {
    /// Height this block is committed at.
    pub height: Height,
    /// Transaction hashes included, in the order they were taken from the
    /// pool's ready sequence.
    pub tx_hashes: Vec<Hash256>,
    /// Proposer-chosen nonce, echoed from the `PrepareRequest`.
    pub nonce: u32,
    /// Proposer-chosen timestamp in milliseconds.
    pub timestamp_ms: u64,
}

/// A read-only, cheap-to-clone view of ledger state at a fixed height.
///
/// Stateful validators take a snapshot once and check every transaction in
/// their batch against it, so cloning must not touch the ledger's write
/// path or block on I/O.
pub trait Snapshot: Send + Sync {
    /// The height this snapshot was taken at.
    fn height(&self) -> Height;

    /// Whether `hash` is already present in the ledger as of this snapshot
    /// (used to reject replays of already-committed transactions).
    fn contains(&self, hash: &Hash256) -> bool;
}

/// The ledger: source of truth for committed height and block contents.
///
/// `commit_block` must be atomic — a crash must never leave the ledger
/// showing a block whose transactions were not applied, nor the reverse.
pub trait Ledger: Send + Sync {
    /// The height of the most recently committed block.
    fn current_height(&self) -> Height;

    /// A read-only snapshot of state as of height `h`. Cheap to clone.
    fn snapshot_at(&self, h: Height) -> Arc<dyn Snapshot>;

    /// Whether a transaction with this hash has already been committed at
    /// any height.
    fn contains(&self, hash: &Hash256) -> bool;

    /// Atomically applies `block`, advancing `current_height` by one.
    fn commit_block(&self, block: Block) -> Result<(), Error>;
}
