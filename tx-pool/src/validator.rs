use dbft_traits::Snapshot;
use dbft_types::{Transaction, ValidatorCategory, Verdict};
use std::collections::HashSet;

/// A stateless or stateful check over a transaction and a state snapshot.
///
/// Implementations must be pure: given the same transaction and snapshot
/// they always return the same verdict, and they must not mutate anything
/// reachable from either argument. The pool invokes workers concurrently and
/// assumes no shared mutable state beyond the snapshot handle.
pub trait Validator: Send + Sync {
    /// Stable identifier, used to key collected verdicts and for
    /// idempotent (un)registration.
    fn id(&self) -> &str;

    /// The category this worker belongs to.
    fn category(&self) -> ValidatorCategory;

    /// Transaction type tags this worker knows how to check. An empty set
    /// means "all types".
    fn supported_tx_types(&self) -> &HashSet<u8>;

    /// Checks `tx` against `snapshot`. Stateless workers may ignore
    /// `snapshot` entirely; stateful workers check it for nonce
    /// monotonicity, balance, contract existence, and similar predicates.
    fn check(&self, tx: &Transaction, snapshot: &dyn Snapshot) -> Verdict;
}

/// `true` if `validator` declares support for `type_tag` (or supports all
/// types).
pub fn supports(validator: &dyn Validator, type_tag: u8) -> bool {
    let types = validator.supported_tx_types();
    types.is_empty() || types.contains(&type_tag)
}
