//! Shared value types: transactions, hashes, and the small vocabulary of
//! enums the pool and the consensus engine both speak.
//!
//! The core treats transaction payloads as opaque — this crate never
//! inspects `Transaction::payload`, it only provides hashing and equality.

mod hash;
mod transaction;

pub use hash::Hash256;
pub use transaction::{SenderId, Transaction};

/// Block height. Monotonically increasing, starts at 0 for genesis.
pub type Height = u64;

/// Consensus view number within a height. Resets to 0 on every new height.
pub type ViewNumber = u8;

/// Fixed seat index of a consensus participant, `0..N`.
pub type Seat = u16;

/// The category a validator belongs to (see `ValidatorWorkers`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidatorCategory {
    /// Checks that do not depend on ledger state: signature, size, structure.
    Stateless,
    /// Checks against a ledger snapshot: balance, nonce, contract existence.
    Stateful,
}

/// The outcome of one validator's check of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The transaction passed this validator's checks.
    Pass,
    /// The transaction was rejected, with a short machine-readable reason.
    Fail(String),
}

impl Verdict {
    /// `true` for [`Verdict::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Lifecycle state of one pool entry (see `TxEntry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Submitted, waiting on at least one stateless verdict.
    AwaitingStateless,
    /// Passed all stateless checks, waiting on at least one stateful verdict.
    AwaitingStateful,
    /// Passed all registered categories at the current height; eligible for
    /// block assembly.
    Ready,
    /// A validator reported a failure; the entry is gone from the pool.
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_is_pass() {
        assert!(Verdict::Pass.is_pass());
        assert!(!Verdict::Fail("bad nonce".into()).is_pass());
    }
}
