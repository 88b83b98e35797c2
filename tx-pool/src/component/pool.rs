use super::entry::TxEntry;
use crate::config::TxPoolConfig;
use dbft_types::{Hash256, Height, SenderId, Transaction, TxState, ValidatorCategory, Verdict};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// The outcome of [`Pool::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Duplicate,
    PoolFull,
    SenderQuota,
    InvalidShape,
}

/// A snapshot of pool contents returned by read-only queries; cheap to hand
/// across the dispatcher boundary because it borrows nothing back into the
/// pool.
#[derive(Debug, Clone)]
pub struct PoolQuery {
    pub size: usize,
    pub ready_len: usize,
    pub hashes: Vec<Hash256>,
}

/// The bounded, deduplicating set of admitted transactions.
///
/// Invariants (see data model): no two entries share a hash; the ready
/// sequence is a subset of the map; size never exceeds `max_pool`;
/// per-sender pending never exceeds `max_per_sender`.
pub struct Pool {
    config: TxPoolConfig,
    entries: FxHashMap<Hash256, TxEntry>,
    ready: VecDeque<Hash256>,
    per_sender: FxHashMap<SenderId, usize>,
    current_height: Height,
}

impl Pool {
    pub fn new(config: TxPoolConfig) -> Self {
        Pool {
            config,
            entries: FxHashMap::default(),
            ready: VecDeque::new(),
            per_sender: FxHashMap::default(),
            current_height: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_height(&self) -> Height {
        self.current_height
    }

    /// Sets the height new submissions and verdicts are pinned to. Called
    /// by the dispatcher when it learns of a new committed height.
    pub fn set_current_height(&mut self, height: Height) {
        self.current_height = height;
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash256) -> Option<&TxEntry> {
        self.entries.get(hash)
    }

    /// Admits `tx` from `sender` at the pool's current height.
    pub fn submit(&mut self, tx: Transaction, now_ms: u64) -> SubmitOutcome {
        if tx.size() == 0 {
            return SubmitOutcome::InvalidShape;
        }

        let hash = tx.hash();
        if self.entries.contains_key(&hash) {
            return SubmitOutcome::Duplicate;
        }
        if self.entries.len() >= self.config.max_pool {
            return SubmitOutcome::PoolFull;
        }
        let sender = tx.sender;
        let pending_for_sender = *self.per_sender.get(&sender).unwrap_or(&0);
        if pending_for_sender >= self.config.max_per_sender {
            return SubmitOutcome::SenderQuota;
        }

        let entry = TxEntry::new(tx, now_ms, self.current_height);
        self.entries.insert(hash, entry);
        *self.per_sender.entry(sender).or_insert(0) += 1;
        SubmitOutcome::Accepted
    }

    /// Applies a verifier's verdict. Stale verdicts (reporting a height
    /// below the pool's current height) are ignored without touching any
    /// invariant.
    ///
    /// Returns the entry's new state, or `None` if the hash is unknown
    /// (e.g. it was already cleaned up by a prior commit) or the verdict
    /// was stale.
    pub fn record_verdict(
        &mut self,
        hash: &Hash256,
        verifier_id: &str,
        category: ValidatorCategory,
        height: Height,
        verdict: Verdict,
    ) -> Option<TxState> {
        let entry = self.entries.get_mut(hash)?;
        if height != entry.height {
            return None;
        }
        let new_state = entry.record_verdict(verifier_id, category, verdict);
        match new_state {
            TxState::Ready => self.insert_ready(*hash),
            TxState::Rejected => self.remove(hash),
            _ => {}
        }
        Some(new_state)
    }

    /// Inserts `hash` into the ready sequence keeping it ordered by
    /// admission time, tying on hash (§4.1's `take` ordering). Verdicts
    /// complete on independent `tokio::spawn` tasks with no ordering
    /// guarantee, so arrival order cannot be used as a proxy for admission
    /// order.
    fn insert_ready(&mut self, hash: Hash256) {
        let Some(key) = self.entries.get(&hash).map(|e| (e.admitted_at_ms, hash)) else {
            return;
        };
        let pos = self
            .ready
            .iter()
            .position(|h| {
                self.entries
                    .get(h)
                    .map(|e| key < (e.admitted_at_ms, *h))
                    .unwrap_or(false)
            })
            .unwrap_or(self.ready.len());
        self.ready.insert(pos, hash);
    }

    /// Removes an entry (on rejection, or when its transaction has been
    /// committed). Decrements the sender's pending counter.
    fn remove(&mut self, hash: &Hash256) {
        if let Some(entry) = self.entries.remove(hash) {
            let sender = entry.tx().sender;
            if let Some(count) = self.per_sender.get_mut(&sender) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.per_sender.remove(&sender);
                }
            }
        }
    }

    /// Returns a prefix of the ready sequence honoring `max_count` and
    /// `max_bytes`. Does not remove entries — removal happens on
    /// [`Pool::clean`] once the block actually commits.
    pub fn take(&self, max_count: usize, max_bytes: usize) -> Vec<Hash256> {
        let mut out = Vec::new();
        let mut bytes = 0usize;
        for hash in self.ready.iter() {
            if out.len() >= max_count || out.len() >= self.config.max_block_tx {
                break;
            }
            let Some(entry) = self.entries.get(hash) else {
                continue;
            };
            let size = entry.tx().size();
            if bytes + size > max_bytes && !out.is_empty() {
                break;
            }
            bytes += size;
            out.push(*hash);
        }
        out
    }

    /// Removes committed transactions from the pool. Entries that were
    /// still pending (not yet ready) and whose stateful verdict was tied to
    /// the height that just advanced are re-queued for stateful
    /// re-verification by resetting them to `AwaitingStateful` at the new
    /// height; callers must re-dispatch them to stateful workers.
    pub fn clean(&mut self, committed: &[Hash256]) -> Vec<Hash256> {
        for hash in committed {
            self.remove(hash);
            self.ready.retain(|h| h != hash);
        }

        let mut to_redispatch = Vec::new();
        for (hash, entry) in self.entries.iter_mut() {
            if entry.state() == TxState::AwaitingStateful && entry.height != self.current_height {
                entry.height = self.current_height;
                to_redispatch.push(*hash);
            }
        }
        to_redispatch
    }

    /// Hashes of entries that have not yet reached `Ready` or `Rejected`
    /// (rejected entries are removed immediately and never observable here).
    pub fn query_pending(&self) -> Vec<Hash256> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state() != TxState::Ready)
            .map(|(h, _)| *h)
            .collect()
    }

    /// A read-only snapshot of the pool's ready contents, up to `max_count`
    /// hashes (0 means unlimited).
    pub fn query_ready(&self, max_count: usize) -> PoolQuery {
        let hashes: Vec<Hash256> = if max_count == 0 {
            self.ready.iter().copied().collect()
        } else {
            self.ready.iter().take(max_count).copied().collect()
        };
        PoolQuery {
            size: self.entries.len(),
            ready_len: self.ready.len(),
            hashes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbft_types::SenderId;

    fn tx(nonce: u64, sender_byte: u8) -> Transaction {
        Transaction::new(1, nonce, vec![1, 2, 3], SenderId([sender_byte; 20]))
    }

    fn small_config() -> TxPoolConfig {
        TxPoolConfig {
            max_pool: 2,
            max_per_sender: 1,
            max_block_tx: 10,
            verify_timeout_ms: 100,
        }
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mut pool = Pool::new(TxPoolConfig::default());
        let t = tx(0, 1);
        assert_eq!(pool.submit(t.clone(), 0), SubmitOutcome::Accepted);
        assert_eq!(pool.submit(t, 0), SubmitOutcome::Duplicate);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn pool_full_is_deterministic() {
        let mut pool = Pool::new(small_config());
        assert_eq!(pool.submit(tx(0, 1), 0), SubmitOutcome::Accepted);
        assert_eq!(pool.submit(tx(0, 2), 0), SubmitOutcome::Accepted);
        assert_eq!(pool.submit(tx(0, 3), 0), SubmitOutcome::PoolFull);
    }

    #[test]
    fn sender_quota_is_enforced() {
        let mut pool = Pool::new(small_config());
        assert_eq!(pool.submit(tx(0, 1), 0), SubmitOutcome::Accepted);
        assert_eq!(pool.submit(tx(1, 1), 0), SubmitOutcome::SenderQuota);
    }

    #[test]
    fn ready_on_both_categories_and_take_respects_caps() {
        let mut pool = Pool::new(TxPoolConfig::default());
        let hash = {
            let t = tx(0, 1);
            let h = t.hash();
            pool.submit(t, 0);
            h
        };
        pool.record_verdict(&hash, "v1", ValidatorCategory::Stateless, 0, Verdict::Pass);
        pool.record_verdict(&hash, "v2", ValidatorCategory::Stateful, 0, Verdict::Pass);

        let ready = pool.take(10, 1 << 20);
        assert_eq!(ready, vec![hash]);
    }

    #[test]
    fn stale_verdict_is_ignored() {
        let mut pool = Pool::new(TxPoolConfig::default());
        pool.set_current_height(5);
        let t = tx(0, 1);
        let hash = t.hash();
        pool.submit(t, 0);

        let result = pool.record_verdict(&hash, "v1", ValidatorCategory::Stateless, 4, Verdict::Pass);
        assert!(result.is_none());
        assert_eq!(pool.get(&hash).unwrap().state(), dbft_types::TxState::AwaitingStateless);
    }

    #[test]
    fn fail_removes_entry_and_frees_sender_quota() {
        let mut pool = Pool::new(small_config());
        let t = tx(0, 1);
        let hash = t.hash();
        pool.submit(t, 0);
        pool.record_verdict(
            &hash,
            "v1",
            ValidatorCategory::Stateless,
            0,
            Verdict::Fail("bad".into()),
        );
        assert!(!pool.contains(&hash));
        // Sender quota freed: a new tx from the same sender is accepted.
        assert_eq!(pool.submit(tx(1, 1), 0), SubmitOutcome::Accepted);
    }

    #[test]
    fn clean_removes_committed_and_preserves_others() {
        let mut pool = Pool::new(TxPoolConfig::default());
        let t1 = tx(0, 1);
        let h1 = t1.hash();
        pool.submit(t1, 0);
        pool.record_verdict(&h1, "v1", ValidatorCategory::Stateless, 0, Verdict::Pass);
        pool.record_verdict(&h1, "v2", ValidatorCategory::Stateful, 0, Verdict::Pass);

        pool.clean(&[h1]);
        assert!(!pool.contains(&h1));
        assert_eq!(pool.take(10, 1 << 20).len(), 0);
    }
}
