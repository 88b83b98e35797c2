use dbft_types::{Height, Transaction, TxState, ValidatorCategory, Verdict};
use rustc_hash::FxHashMap;
use std::collections::HashSet;

/// The pool's record for one admitted transaction.
///
/// An entry is [`TxState::Ready`] iff every registered validator category
/// has reported at least one [`Verdict::Pass`] for it at the current ledger
/// height, and [`TxState::Rejected`] as soon as any validator reports a
/// fail — see the data model's invariant.
#[derive(Debug, Clone)]
pub struct TxEntry {
    tx: Transaction,
    /// Categories that have not yet reported a pass for this entry.
    pending: HashSet<ValidatorCategory>,
    /// Every verdict collected so far, keyed by the reporting validator id,
    /// kept for audit/logging even after the category it belongs to has
    /// already been satisfied by an earlier pass.
    verdicts: FxHashMap<String, Verdict>,
    /// Millisecond timestamp this entry was admitted.
    pub admitted_at_ms: u64,
    /// Ledger height this entry's verification is pinned to. A verdict
    /// reporting a different height is stale and must be ignored.
    pub height: Height,
    state: TxState,
}

impl TxEntry {
    /// Creates a new entry in [`TxState::AwaitingStateless`], pending both
    /// categories (stateful verification starts only once stateless passes).
    pub fn new(tx: Transaction, admitted_at_ms: u64, height: Height) -> Self {
        let mut pending = HashSet::with_capacity(2);
        pending.insert(ValidatorCategory::Stateless);
        TxEntry {
            tx,
            pending,
            verdicts: FxHashMap::default(),
            admitted_at_ms,
            height,
            state: TxState::AwaitingStateless,
        }
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Records `verdict` from `verifier_id` in `category`. Returns the new
    /// state. Callers must have already checked the verdict's height
    /// against the current ledger height (stale verdicts never reach here).
    pub fn record_verdict(
        &mut self,
        verifier_id: &str,
        category: ValidatorCategory,
        verdict: Verdict,
    ) -> TxState {
        self.verdicts.insert(verifier_id.to_owned(), verdict.clone());

        if !verdict.is_pass() {
            self.state = TxState::Rejected;
            return self.state;
        }

        if self.pending.remove(&category) {
            if category == ValidatorCategory::Stateless {
                // First stateless pass: stop waiting on stateless, start
                // waiting on stateful.
                self.pending.insert(ValidatorCategory::Stateful);
                self.state = TxState::AwaitingStateful;
            }
        }

        if self.pending.is_empty() {
            self.state = TxState::Ready;
        }
        self.state
    }

    /// Categories still awaiting a first pass.
    pub fn pending_categories(&self) -> impl Iterator<Item = &ValidatorCategory> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbft_types::SenderId;

    fn tx() -> Transaction {
        Transaction::new(1, 0, vec![1, 2, 3], SenderId([9u8; 20]))
    }

    #[test]
    fn passes_in_both_categories_reach_ready() {
        let mut entry = TxEntry::new(tx(), 0, 0);
        assert_eq!(entry.state(), TxState::AwaitingStateless);

        let state = entry.record_verdict("stateless-1", ValidatorCategory::Stateless, Verdict::Pass);
        assert_eq!(state, TxState::AwaitingStateful);

        let state = entry.record_verdict("stateful-1", ValidatorCategory::Stateful, Verdict::Pass);
        assert_eq!(state, TxState::Ready);
    }

    #[test]
    fn any_fail_rejects_regardless_of_category() {
        let mut entry = TxEntry::new(tx(), 0, 0);
        let state = entry.record_verdict(
            "stateless-1",
            ValidatorCategory::Stateless,
            Verdict::Fail("bad signature".into()),
        );
        assert_eq!(state, TxState::Rejected);
    }

    #[test]
    fn second_stateless_pass_does_not_regress_state() {
        let mut entry = TxEntry::new(tx(), 0, 0);
        entry.record_verdict("stateless-1", ValidatorCategory::Stateless, Verdict::Pass);
        let state = entry.record_verdict("stateless-2", ValidatorCategory::Stateless, Verdict::Pass);
        assert_eq!(state, TxState::AwaitingStateful);
    }
}
