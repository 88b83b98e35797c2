//! End-to-end scenarios for the transaction admission pipeline, mirroring
//! the concrete scenarios in the governing design (S1-S3).

use dbft_test_utils::{MockClock, MockLedger};
use dbft_traits::Snapshot;
use dbft_tx_pool::{PoolDispatcher, SubmitOutcome, TxPoolConfig, Validator};
use dbft_types::{SenderId, Transaction, ValidatorCategory, Verdict};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

struct AlwaysPass {
    id: String,
    category: ValidatorCategory,
}

impl Validator for AlwaysPass {
    fn id(&self) -> &str {
        &self.id
    }
    fn category(&self) -> ValidatorCategory {
        self.category
    }
    fn supported_tx_types(&self) -> &HashSet<u8> {
        static EMPTY: std::sync::OnceLock<HashSet<u8>> = std::sync::OnceLock::new();
        EMPTY.get_or_init(HashSet::new)
    }
    fn check(&self, _tx: &Transaction, _snapshot: &dyn Snapshot) -> Verdict {
        Verdict::Pass
    }
}

struct AlwaysFail {
    id: String,
    category: ValidatorCategory,
}

impl Validator for AlwaysFail {
    fn id(&self) -> &str {
        &self.id
    }
    fn category(&self) -> ValidatorCategory {
        self.category
    }
    fn supported_tx_types(&self) -> &HashSet<u8> {
        static EMPTY: std::sync::OnceLock<HashSet<u8>> = std::sync::OnceLock::new();
        EMPTY.get_or_init(HashSet::new)
    }
    fn check(&self, _tx: &Transaction, _snapshot: &dyn Snapshot) -> Verdict {
        Verdict::Fail("stateful check failed".to_owned())
    }
}

fn tx(nonce: u64) -> Transaction {
    Transaction::new(1, nonce, vec![1, 2, 3, 4], SenderId([7u8; 20]))
}

#[tokio::test]
async fn s1_submit_path_all_four_become_ready_in_admission_order() {
    let ledger = Arc::new(MockLedger::new());
    let clock = Arc::new(MockClock::new(0));
    let metrics = Arc::new(dbft_traits::NullMetrics);
    let (dispatcher, controller) =
        PoolDispatcher::new(TxPoolConfig::default(), ledger, clock, metrics);
    tokio::spawn(dispatcher.run());

    controller.register_validator(Arc::new(AlwaysPass {
        id: "stateless-1".into(),
        category: ValidatorCategory::Stateless,
    }));
    controller.register_validator(Arc::new(AlwaysPass {
        id: "stateful-1".into(),
        category: ValidatorCategory::Stateful,
    }));

    let mut expected_hashes = Vec::new();
    for n in 0..4 {
        let t = tx(n);
        expected_hashes.push(t.hash());
        let outcome = controller.submit_tx(t).await;
        assert_eq!(outcome, SubmitOutcome::Accepted);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    let (hashes, txs) = controller.propose_block(10, 1 << 20).await;
    assert_eq!(hashes, expected_hashes);
    assert_eq!(txs.len(), 4);
}

#[tokio::test]
async fn s2_duplicate_submission_is_rejected_and_size_stays_one() {
    let ledger = Arc::new(MockLedger::new());
    let clock = Arc::new(MockClock::new(0));
    let metrics = Arc::new(dbft_traits::NullMetrics);
    let (dispatcher, controller) =
        PoolDispatcher::new(TxPoolConfig::default(), ledger, clock, metrics);
    tokio::spawn(dispatcher.run());

    controller.register_validator(Arc::new(AlwaysPass {
        id: "stateless-1".into(),
        category: ValidatorCategory::Stateless,
    }));

    let t = tx(0);
    assert_eq!(controller.submit_tx(t.clone()).await, SubmitOutcome::Accepted);
    assert_eq!(
        controller.submit_tx(t).await,
        SubmitOutcome::Duplicate
    );

    let snapshot = controller.pool_snapshot().await.unwrap();
    assert_eq!(snapshot.size, 1);
}

#[tokio::test]
async fn s3_stateful_failure_rejects_and_excludes_from_proposal() {
    let ledger = Arc::new(MockLedger::new());
    let clock = Arc::new(MockClock::new(0));
    let metrics = Arc::new(dbft_traits::NullMetrics);
    let (dispatcher, controller) =
        PoolDispatcher::new(TxPoolConfig::default(), ledger, clock, metrics);
    tokio::spawn(dispatcher.run());

    controller.register_validator(Arc::new(AlwaysPass {
        id: "stateless-1".into(),
        category: ValidatorCategory::Stateless,
    }));
    controller.register_validator(Arc::new(AlwaysFail {
        id: "stateful-1".into(),
        category: ValidatorCategory::Stateful,
    }));

    let t = tx(0);
    assert_eq!(controller.submit_tx(t).await, SubmitOutcome::Accepted);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let (hashes, _) = controller.propose_block(10, 1 << 20).await;
    assert!(hashes.is_empty());
}
