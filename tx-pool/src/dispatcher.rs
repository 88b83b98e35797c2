//! The Pool Dispatcher: a single-inbox message broker that serializes all
//! access to the [`Pool`]. It is the only writer; every other subsystem
//! (network ingress, RPC, consensus) talks to it by sending a
//! [`DispatcherMessage`] and, where a reply is expected, awaiting a oneshot
//! channel — the same shape as the teacher's request/response controller
//! pattern, adapted to `tokio` channels throughout since validator dispatch
//! is inherently asynchronous.

use crate::component::{Pool, PoolQuery, SubmitOutcome};
use crate::config::TxPoolConfig;
use crate::registry::ValidatorRegistry;
use crate::validator::Validator;
use dbft_logger::{debug, info, warn};
use dbft_systemtime::Clock;
use dbft_traits::{Ledger, Metrics};
use dbft_types::{Hash256, Height, Transaction, TxState, ValidatorCategory, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Messages the dispatcher accepts, matching the kinds named in the
/// component design.
pub enum DispatcherMessage {
    SubmitTx {
        tx: Transaction,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    VerifyResponse {
        hash: Hash256,
        verifier_id: String,
        category: ValidatorCategory,
        height: Height,
        verdict: Verdict,
    },
    GetPoolSnapshot {
        reply: oneshot::Sender<PoolQuery>,
    },
    GetPendingSnapshot {
        reply: oneshot::Sender<Vec<Hash256>>,
    },
    ProposeBlock {
        max_count: usize,
        max_bytes: usize,
        reply: oneshot::Sender<(Vec<Hash256>, Vec<Transaction>)>,
    },
    NewHeight {
        height: Height,
        committed: Vec<Hash256>,
    },
    RegisterValidator {
        validator: Arc<dyn Validator>,
    },
    UnregisterValidator {
        id: String,
    },
    Stop {
        ack: oneshot::Sender<()>,
    },
}

/// A cheap-to-clone handle used by ingress, RPC, and consensus to talk to
/// the dispatcher. Holding a clone does not keep the dispatcher task alive
/// by itself — it is dropped when the owning task is, same as a normal
/// channel sender.
#[derive(Clone)]
pub struct TxPoolController {
    inbox: mpsc::UnboundedSender<DispatcherMessage>,
}

impl TxPoolController {
    /// `submitTx` — the ingress/RPC-facing entry point.
    pub async fn submit_tx(&self, tx: Transaction) -> SubmitOutcome {
        let (reply, rx) = oneshot::channel();
        if self
            .inbox
            .send(DispatcherMessage::SubmitTx { tx, reply })
            .is_err()
        {
            return SubmitOutcome::InvalidShape;
        }
        rx.await.unwrap_or(SubmitOutcome::InvalidShape)
    }

    /// `proposeBlock` — the block-producer-facing entry point.
    pub async fn propose_block(
        &self,
        max_count: usize,
        max_bytes: usize,
    ) -> (Vec<Hash256>, Vec<Transaction>) {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(DispatcherMessage::ProposeBlock {
            max_count,
            max_bytes,
            reply,
        });
        rx.await.unwrap_or_default()
    }

    pub async fn pool_snapshot(&self) -> Option<PoolQuery> {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(DispatcherMessage::GetPoolSnapshot { reply });
        rx.await.ok()
    }

    pub async fn pending_snapshot(&self) -> Vec<Hash256> {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .inbox
            .send(DispatcherMessage::GetPendingSnapshot { reply });
        rx.await.unwrap_or_default()
    }

    pub fn new_height(&self, height: Height, committed: Vec<Hash256>) {
        let _ = self
            .inbox
            .send(DispatcherMessage::NewHeight { height, committed });
    }

    pub fn register_validator(&self, validator: Arc<dyn Validator>) {
        let _ = self
            .inbox
            .send(DispatcherMessage::RegisterValidator { validator });
    }

    pub fn unregister_validator(&self, id: impl Into<String>) {
        let _ = self.inbox.send(DispatcherMessage::UnregisterValidator {
            id: id.into(),
        });
    }

    /// Asks the dispatcher to drain its inbox, abandon in-flight
    /// verification, and shut down. Waits for the acknowledgment.
    pub async fn stop(&self) {
        let (ack, rx) = oneshot::channel();
        if self.inbox.send(DispatcherMessage::Stop { ack }).is_ok() {
            let _ = rx.await;
        }
    }
}

/// The dispatcher task itself. Owns the [`Pool`] and the
/// [`ValidatorRegistry`]; nothing outside this struct ever mutates pool
/// state directly.
pub struct PoolDispatcher {
    pool: Pool,
    registry: ValidatorRegistry,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn Metrics>,
    config: TxPoolConfig,
    inbox: mpsc::UnboundedReceiver<DispatcherMessage>,
    self_tx: mpsc::UnboundedSender<DispatcherMessage>,
}

impl PoolDispatcher {
    /// Builds a dispatcher and the controller handle used to talk to it.
    /// Call [`PoolDispatcher::run`] (typically via `tokio::spawn`) to start
    /// processing messages.
    pub fn new(
        config: TxPoolConfig,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn Metrics>,
    ) -> (Self, TxPoolController) {
        let (self_tx, inbox) = mpsc::unbounded_channel();
        let current_height = ledger.current_height();
        let mut pool = Pool::new(config);
        pool.set_current_height(current_height);
        let dispatcher = PoolDispatcher {
            pool,
            registry: ValidatorRegistry::new(),
            ledger,
            clock,
            metrics,
            config,
            inbox,
            self_tx: self_tx.clone(),
        };
        (dispatcher, TxPoolController { inbox: self_tx })
    }

    /// Runs the dispatcher until a `Stop` message arrives or every
    /// controller handle has been dropped.
    pub async fn run(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            match msg {
                DispatcherMessage::SubmitTx { tx, reply } => self.on_submit_tx(tx, reply),
                DispatcherMessage::VerifyResponse {
                    hash,
                    verifier_id,
                    category,
                    height,
                    verdict,
                } => self.on_verify_response(hash, verifier_id, category, height, verdict),
                DispatcherMessage::GetPoolSnapshot { reply } => {
                    let _ = reply.send(self.pool.query_ready(0));
                }
                DispatcherMessage::GetPendingSnapshot { reply } => {
                    let _ = reply.send(self.pool.query_pending());
                }
                DispatcherMessage::ProposeBlock {
                    max_count,
                    max_bytes,
                    reply,
                } => {
                    let hashes = self.pool.take(max_count, max_bytes);
                    let txs = hashes
                        .iter()
                        .filter_map(|h| self.pool.get(h))
                        .map(|e| e.tx().clone())
                        .collect();
                    let _ = reply.send((hashes, txs));
                }
                DispatcherMessage::NewHeight { height, committed } => {
                    self.on_new_height(height, committed)
                }
                DispatcherMessage::RegisterValidator { validator } => {
                    self.on_register_validator(validator)
                }
                DispatcherMessage::UnregisterValidator { id } => {
                    self.registry.unregister(&id);
                }
                DispatcherMessage::Stop { ack } => {
                    info!(target: "dbft_tx_pool", "dispatcher stopping, draining inbox");
                    self.inbox.close();
                    while self.inbox.try_recv().is_ok() {}
                    let _ = ack.send(());
                    break;
                }
            }
        }
    }

    fn on_submit_tx(&mut self, tx: Transaction, reply: oneshot::Sender<SubmitOutcome>) {
        let now = self.clock.now_ms();
        let hash = tx.hash();
        let type_tag = tx.type_tag;
        let outcome = self.pool.submit(tx, now);
        if outcome == SubmitOutcome::Accepted {
            self.metrics.counter("tx_pool_accepted", 1);
            self.dispatch_verification(hash, type_tag, ValidatorCategory::Stateless);
        }
        let _ = reply.send(outcome);
    }

    fn on_verify_response(
        &mut self,
        hash: Hash256,
        verifier_id: String,
        category: ValidatorCategory,
        height: Height,
        verdict: Verdict,
    ) {
        let type_tag = self.pool.get(&hash).map(|e| e.tx().type_tag);
        let Some(type_tag) = type_tag else {
            return;
        };
        let new_state = self
            .pool
            .record_verdict(&hash, &verifier_id, category, height, verdict);
        match new_state {
            Some(TxState::AwaitingStateful) => {
                self.dispatch_verification(hash, type_tag, ValidatorCategory::Stateful)
            }
            Some(TxState::Ready) => {
                debug!(target: "dbft_tx_pool", "tx {} ready", hash);
                self.metrics.counter("tx_pool_ready", 1);
            }
            Some(TxState::Rejected) => {
                self.metrics.counter("tx_pool_rejected", 1);
            }
            _ => {}
        }
    }

    fn on_new_height(&mut self, height: Height, committed: Vec<Hash256>) {
        self.pool.set_current_height(height);
        let to_redispatch = self.pool.clean(&committed);
        for hash in to_redispatch {
            if let Some(type_tag) = self.pool.get(&hash).map(|e| e.tx().type_tag) {
                self.dispatch_verification(hash, type_tag, ValidatorCategory::Stateful);
            }
        }
    }

    fn on_register_validator(&mut self, validator: Arc<dyn Validator>) {
        let category = validator.category();
        self.registry.register(validator);
        // Newly registered workers may unblock entries that were stuck in
        // `Awaiting*` with no worker to dispatch to.
        let stuck: Vec<(Hash256, u8)> = self
            .pool
            .query_pending()
            .into_iter()
            .filter_map(|h| {
                let entry = self.pool.get(&h)?;
                let needs_category = entry
                    .pending_categories()
                    .any(|c| *c == category);
                needs_category.then(|| (h, entry.tx().type_tag))
            })
            .collect();
        for (hash, type_tag) in stuck {
            self.dispatch_verification(hash, type_tag, category);
        }
    }

    fn dispatch_verification(&self, hash: Hash256, type_tag: u8, category: ValidatorCategory) {
        let workers = self.registry.workers_for(category, type_tag);
        if workers.is_empty() {
            warn!(
                target: "dbft_tx_pool",
                "no {:?} worker registered yet, tx {} stays pending", category, hash
            );
            return;
        }
        let Some(entry) = self.pool.get(&hash) else {
            return;
        };
        let tx = entry.tx().clone();
        let height = entry.height;
        let snapshot = self.ledger.snapshot_at(height);
        let timeout = Duration::from_millis(self.config.verify_timeout_ms);

        for worker in workers {
            let tx = tx.clone();
            let snapshot = snapshot.clone();
            let self_tx = self.self_tx.clone();
            let verifier_id = worker.id().to_owned();
            tokio::spawn(async move {
                let verdict = match tokio::time::timeout(timeout, async {
                    worker.check(&tx, snapshot.as_ref())
                })
                .await
                {
                    Ok(verdict) => verdict,
                    Err(_) => Verdict::Fail("verify-timeout".to_owned()),
                };
                let _ = self_tx.send(DispatcherMessage::VerifyResponse {
                    hash,
                    verifier_id,
                    category,
                    height,
                    verdict,
                });
            });
        }
    }
}
