//! The dBFT round-based state machine itself.
//!
//! One [`ConsensusEngine`] per node, driven by [`ConsensusEngine::run`] as a
//! single task with a private inbox (bridged from the [`Network`]
//! collaborator) plus a view timer — the same actor shape the pool
//! dispatcher uses, adapted to a protocol with an explicit round clock
//! instead of a pure message queue.

use crate::codec::{decode, encode, Writer};
use crate::config::ConsensusConfig;
use crate::context::{ConsensusContext, Role};
use crate::error::ProtocolError;
use crate::messages::{ConsensusMessage, Header, SeatSignature};
use dbft_error::Error as NodeError;
use dbft_logger::{debug, info, warn};
use dbft_systemtime::Clock;
use dbft_traits::{Block, KeyStore, Ledger, MessageKind, Metrics, Network, Signature};
use dbft_tx_pool::TxPoolController;
use dbft_types::Hash256;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// State of the local replica for the current `(height, view)`, per the
/// component design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initial,
    BackupWaiting,
    PrimaryProposing,
    PrepareSent,
    CommitReady,
    BlockSent,
}

/// Computes the digest a `PrepareRequest`'s contents are signed over,
/// shared by the proposer (signs `miner_sig`) and every backup (signs the
/// matching `PrepareResponse`).
fn prepare_digest(header: Header, nonce: u32, timestamp_ms: u64, tx_hashes: &[Hash256]) -> Hash256 {
    let mut w = Writer::new();
    w.write_u8(header.view_number);
    w.write_u16(header.seat);
    w.write_u32(nonce);
    w.write_u64(timestamp_ms);
    w.write_varuint(tx_hashes.len() as u64);
    for hash in tx_hashes {
        w.write_bytes(hash.as_bytes());
    }
    Hash256::hash(&w.into_bytes())
}

/// Bridges a [`Network`] subscription (a `crossbeam_channel`, since the
/// transport is synchronous) into a `tokio` inbox the engine's `select!`
/// loop can await. One forwarding thread per message kind.
fn bridge(network: &dyn Network, kind: MessageKind) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (cb_tx, cb_rx) = crossbeam_channel::unbounded();
    network.subscribe(kind, cb_tx);
    let (tokio_tx, tokio_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while let Ok(payload) = cb_rx.recv() {
            if tokio_tx.send(payload).is_err() {
                break;
            }
        }
    });
    tokio_rx
}

pub struct ConsensusEngine {
    config: ConsensusConfig,
    ctx: ConsensusContext,
    pool: TxPoolController,
    ledger: Arc<dyn Ledger>,
    keystore: Arc<dyn KeyStore>,
    network: Arc<dyn Network>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn Metrics>,
    state: EngineState,
    last_commit_ms: u64,
    deadline_ms: u64,
    /// Nonces seen in an accepted `PrepareRequest`, own or peer's, across
    /// the engine's lifetime — guards the "nonce unused" check in
    /// `on_prepare_request` against replay.
    used_nonces: HashSet<u32>,
}

impl ConsensusEngine {
    pub fn new(
        config: ConsensusConfig,
        pool: TxPoolController,
        ledger: Arc<dyn Ledger>,
        keystore: Arc<dyn KeyStore>,
        network: Arc<dyn Network>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        let height = ledger.current_height() + 1;
        let ctx = ConsensusContext::new(height, config.n, config.local_seat);
        let now = clock.now_ms();
        ConsensusEngine {
            config,
            ctx,
            pool,
            ledger,
            keystore,
            network,
            clock,
            metrics,
            state: EngineState::Initial,
            last_commit_ms: now,
            deadline_ms: now,
            used_nonces: HashSet::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn reset_deadline(&mut self) {
        let timeout = self.config.view_timeout_ms(self.ctx.view);
        self.deadline_ms = self.clock.now_ms() + timeout;
    }

    /// Drives the engine forever, reacting to network messages and the view
    /// timer. Returns only on a fatal ledger error, which the caller
    /// propagates to the process supervisor.
    pub async fn run(mut self) -> Result<(), NodeError> {
        let mut change_view_rx = bridge(self.network.as_ref(), MessageKind::ChangeView);
        let mut prepare_request_rx = bridge(self.network.as_ref(), MessageKind::PrepareRequest);
        let mut prepare_response_rx = bridge(self.network.as_ref(), MessageKind::PrepareResponse);
        let mut block_signatures_rx = bridge(self.network.as_ref(), MessageKind::BlockSignatures);

        self.start_round().await?;

        loop {
            let now = self.clock.now_ms();
            let wait = Duration::from_millis(self.deadline_ms.saturating_sub(now));

            tokio::select! {
                Some(bytes) = change_view_rx.recv() => {
                    if let Ok(ConsensusMessage::ChangeView { header, new_view_number }) = decode(&bytes) {
                        self.on_change_view(header, new_view_number).await?;
                    }
                }
                Some(bytes) = prepare_request_rx.recv() => {
                    if let Ok(ConsensusMessage::PrepareRequest { header, nonce, timestamp_ms, tx_hashes, miner_sig }) = decode(&bytes) {
                        self.on_prepare_request(header, nonce, timestamp_ms, tx_hashes, miner_sig).await?;
                    }
                }
                Some(bytes) = prepare_response_rx.recv() => {
                    if let Ok(ConsensusMessage::PrepareResponse { header, sig }) = decode(&bytes) {
                        self.on_prepare_response(header, sig).await?;
                    }
                }
                Some(bytes) = block_signatures_rx.recv() => {
                    let _ = bytes; // the engine reaches BLOCK_SENT via its own quorum count, not peer relay
                }
                _ = tokio::time::sleep(wait) => {
                    if self.clock.now_ms() >= self.deadline_ms {
                        self.on_timer_expired().await?;
                    }
                }
            }
        }
    }

    async fn start_round(&mut self) -> Result<(), NodeError> {
        self.reset_deadline();
        match self.ctx.role() {
            Role::Primary => {
                self.state = EngineState::PrimaryProposing;
                self.try_propose().await?;
            }
            Role::Backup => {
                self.state = EngineState::BackupWaiting;
            }
        }
        Ok(())
    }

    async fn try_propose(&mut self) -> Result<(), NodeError> {
        let now = self.clock.now_ms();
        let block_time_elapsed = now.saturating_sub(self.last_commit_ms) >= self.config.block_time_min_ms;
        let pool_nonempty = self
            .pool
            .pool_snapshot()
            .await
            .map(|q| q.ready_len > 0)
            .unwrap_or(false);
        if !block_time_elapsed && !pool_nonempty {
            return Ok(());
        }

        let (hashes, _txs) = self
            .pool
            .propose_block(self.config.max_block_tx, self.config.max_block_bytes)
            .await;

        let nonce = rand::random::<u32>();
        self.used_nonces.insert(nonce);
        let timestamp_ms = now.max(self.last_commit_ms + 1);
        let header = Header {
            view_number: self.ctx.view,
            seat: self.ctx.local_seat,
        };
        let digest = prepare_digest(header, nonce, timestamp_ms, &hashes);
        let miner_sig = self.keystore.sign(digest.as_bytes());

        self.ctx.set_local_proposal(nonce, timestamp_ms, hashes.clone());
        let msg = ConsensusMessage::PrepareRequest {
            header,
            nonce,
            timestamp_ms,
            tx_hashes: hashes,
            miner_sig: miner_sig.clone(),
        };
        self.ctx
            .accept_prepare_request(msg.clone())
            .expect("primary is the first to accept its own proposal for this (H, v)");
        self.ctx
            .record_signature(self.ctx.local_seat, miner_sig)
            .expect("local seat has not signed yet this round");

        info!(target: "dbft_consensus", height = self.ctx.height, view = self.ctx.view, "broadcasting prepare request");
        self.network
            .broadcast(MessageKind::PrepareRequest, encode(&msg));
        self.state = EngineState::PrepareSent;
        self.maybe_commit().await
    }

    async fn on_prepare_request(
        &mut self,
        header: Header,
        nonce: u32,
        timestamp_ms: u64,
        tx_hashes: Vec<Hash256>,
        miner_sig: Signature,
    ) -> Result<(), NodeError> {
        if header.view_number != self.ctx.view {
            return Ok(());
        }
        let expected_primary = self.ctx.primary_seat();
        if header.seat != expected_primary {
            let err = ProtocolError::WrongPrimary {
                got: header.seat,
                expected: expected_primary,
            };
            warn!(target: "dbft_consensus", error = %err, "dropping prepare request");
            return Ok(());
        }
        if timestamp_ms <= self.last_commit_ms {
            warn!(target: "dbft_consensus", error = %ProtocolError::NonMonotonicTimestamp, "dropping prepare request");
            return Ok(());
        }
        if self.used_nonces.contains(&nonce) {
            let err = ProtocolError::NonceAlreadyUsed { nonce };
            warn!(target: "dbft_consensus", error = %err, "dropping prepare request");
            return Ok(());
        }

        let known = self.known_hashes().await;
        if tx_hashes.iter().any(|h| !known.contains(h)) {
            warn!(target: "dbft_consensus", error = %ProtocolError::MissingTransactions, "dropping prepare request");
            return Ok(());
        }

        let msg = ConsensusMessage::PrepareRequest {
            header,
            nonce,
            timestamp_ms,
            tx_hashes: tx_hashes.clone(),
            miner_sig: miner_sig.clone(),
        };
        match self.ctx.accept_prepare_request(msg) {
            Ok(()) => {}
            Err(e) => {
                warn!(target: "dbft_consensus", error = %e, "dropping duplicate prepare request");
                return Ok(());
            }
        }
        self.used_nonces.insert(nonce);

        let digest = prepare_digest(header, nonce, timestamp_ms, &tx_hashes);
        let sig = self.keystore.sign(digest.as_bytes());
        let response_header = Header {
            view_number: self.ctx.view,
            seat: self.ctx.local_seat,
        };
        let response = ConsensusMessage::PrepareResponse {
            header: response_header,
            sig: sig.clone(),
        };
        self.network
            .broadcast(MessageKind::PrepareResponse, encode(&response));

        if let Err(e) = self.ctx.record_signature(self.ctx.local_seat, sig) {
            warn!(target: "dbft_consensus", error = %e, "local signature rejected as equivocation");
        }
        if let Err(e) = self.ctx.record_signature(header.seat, miner_sig) {
            warn!(target: "dbft_consensus", error = %e, "primary signature rejected as equivocation");
        }
        self.state = EngineState::PrepareSent;
        self.maybe_commit().await
    }

    async fn on_prepare_response(&mut self, header: Header, sig: Signature) -> Result<(), NodeError> {
        if header.view_number != self.ctx.view {
            return Ok(());
        }
        if let Err(e) = self.ctx.record_signature(header.seat, sig) {
            warn!(target: "dbft_consensus", error = %e, "equivocating prepare response ignored for quorum");
            return Ok(());
        }
        self.maybe_commit().await
    }

    async fn on_change_view(&mut self, header: Header, new_view_number: u8) -> Result<(), NodeError> {
        if new_view_number <= self.ctx.view {
            return Ok(());
        }
        let count = self.ctx.record_view_change_vote(header.seat, new_view_number);
        if count >= self.ctx.quorum() {
            info!(target: "dbft_consensus", new_view = new_view_number, "view change quorum reached");
            self.ctx.advance_view(new_view_number);
            self.start_round().await?;
        }
        Ok(())
    }

    async fn on_timer_expired(&mut self) -> Result<(), NodeError> {
        if matches!(self.state, EngineState::CommitReady | EngineState::BlockSent) {
            return Ok(());
        }
        let new_view = self.ctx.view.wrapping_add(1);
        info!(target: "dbft_consensus", height = self.ctx.height, view = self.ctx.view, new_view, "view timer expired");
        let header = Header {
            view_number: self.ctx.view,
            seat: self.ctx.local_seat,
        };
        let msg = ConsensusMessage::ChangeView {
            header,
            new_view_number: new_view,
        };
        self.network.broadcast(MessageKind::ChangeView, encode(&msg));
        let count = self.ctx.record_view_change_vote(self.ctx.local_seat, new_view);
        self.reset_deadline();
        if count >= self.ctx.quorum() {
            self.ctx.advance_view(new_view);
            self.start_round().await?;
        }
        Ok(())
    }

    /// The set of hashes the pool currently knows about, pending or ready —
    /// what `on_prepare_request` checks proposed hashes against.
    async fn known_hashes(&self) -> std::collections::HashSet<Hash256> {
        let mut known: std::collections::HashSet<Hash256> =
            self.pool.pending_snapshot().await.into_iter().collect();
        if let Some(ready) = self.pool.pool_snapshot().await {
            known.extend(ready.hashes);
        }
        known
    }

    async fn maybe_commit(&mut self) -> Result<(), NodeError> {
        if !matches!(self.state, EngineState::PrepareSent | EngineState::PrimaryProposing) {
            return Ok(());
        }
        if !self.ctx.has_quorum() {
            return Ok(());
        }
        self.state = EngineState::CommitReady;
        debug!(target: "dbft_consensus", height = self.ctx.height, "quorum reached, committing");

        let block = Block {
            height: self.ctx.height,
            tx_hashes: self.ctx.selected_tx_hashes().to_vec(),
            nonce: self.ctx.nonce(),
            timestamp_ms: self.ctx.timestamp_ms(),
        };
        let committed_hashes = block.tx_hashes.clone();
        self.ledger.commit_block(block)?;

        let sigs: Vec<SeatSignature> = self
            .ctx
            .signatures()
            .into_iter()
            .map(|(seat, signature)| SeatSignature { seat, signature })
            .collect();
        let header = Header {
            view_number: self.ctx.view,
            seat: self.ctx.local_seat,
        };
        let msg = ConsensusMessage::BlockSignatures { header, sigs };
        self.network
            .broadcast(MessageKind::BlockSignatures, encode(&msg));

        self.metrics.counter("consensus_blocks_committed", 1);
        self.pool.new_height(self.ctx.height, committed_hashes);
        self.last_commit_ms = self.clock.now_ms();
        self.state = EngineState::BlockSent;
        self.ctx.advance_height(self.ctx.height + 1);
        self.start_round().await
    }

    #[cfg(test)]
    fn ctx(&self) -> &ConsensusContext {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbft_test_utils::{MockClock, MockKeyStore, MockLedger, MockNetwork};
    use dbft_traits::NullMetrics;
    use dbft_tx_pool::{PoolDispatcher, TxPoolConfig};

    fn engine_with(n: u16, local_seat: u16) -> (ConsensusEngine, Arc<MockLedger>) {
        let ledger = Arc::new(MockLedger::new());
        let clock = Arc::new(MockClock::new(0));
        let keystore = Arc::new(MockKeyStore::new(local_seat as u8));
        let network = Arc::new(MockNetwork::new());
        let metrics: Arc<dyn Metrics> = Arc::new(NullMetrics);
        let (dispatcher, pool) = PoolDispatcher::new(
            TxPoolConfig::default(),
            ledger.clone() as Arc<dyn Ledger>,
            clock.clone() as Arc<dyn Clock>,
            metrics.clone(),
        );
        tokio::spawn(dispatcher.run());
        let config = ConsensusConfig {
            n,
            local_seat,
            block_time_min_ms: 0,
            ..ConsensusConfig::default()
        };
        let engine = ConsensusEngine::new(
            config,
            pool,
            ledger.clone() as Arc<dyn Ledger>,
            keystore,
            network,
            clock,
            metrics,
        );
        (engine, ledger)
    }

    #[tokio::test]
    async fn lone_primary_commits_an_empty_block_immediately() {
        let (mut engine, ledger) = engine_with(1, 0);
        engine.start_round().await.unwrap();
        assert_eq!(engine.state(), EngineState::BlockSent);
        assert_eq!(ledger.current_height(), 1);
    }

    #[tokio::test]
    async fn s5_view_change_quorum_rotates_primary() {
        // N=4, local seat is a backup (seat 1); the primary (seat 0) never
        // proposes, so three ChangeView(1) votes (including the local one)
        // must reach quorum before the round advances.
        let (mut engine, _ledger) = engine_with(4, 1);
        engine.start_round().await.unwrap();
        assert_eq!(engine.state(), EngineState::BackupWaiting);
        assert_eq!(engine.ctx().view, 0);

        engine.on_timer_expired().await.unwrap(); // local vote: 1/3
        engine
            .on_change_view(Header { view_number: 0, seat: 2 }, 1)
            .await
            .unwrap(); // 2/3
        assert_eq!(engine.ctx().view, 0, "quorum not yet reached");

        engine
            .on_change_view(Header { view_number: 0, seat: 3 }, 1)
            .await
            .unwrap(); // 3/3 == quorum

        assert_eq!(engine.ctx().view, 1);
        // primary = (H - v) mod N = (1 - 1) mod 4 = 0, still not the local seat
        assert_eq!(engine.ctx().primary_seat(), 0);
        assert_eq!(engine.state(), EngineState::BackupWaiting);
    }

    #[tokio::test]
    async fn s6_equivocating_prepare_response_is_not_double_counted() {
        // N=4, local seat 0 is primary and self-counts one signature; seat 1
        // sends two different signatures for the same (H, v) before seat 2's
        // single honest vote would complete the 2f+1=3 quorum.
        let (mut engine, ledger) = engine_with(4, 0);
        engine.start_round().await.unwrap();
        assert_eq!(engine.state(), EngineState::PrepareSent); // primary's own sig: 1/3

        engine
            .on_prepare_response(Header { view_number: 0, seat: 1 }, Signature(vec![1, 0xAA]))
            .await
            .unwrap(); // 2/3
        assert_eq!(engine.state(), EngineState::PrepareSent);

        // Equivocation: seat 1 sends a second, different signature.
        engine
            .on_prepare_response(Header { view_number: 0, seat: 1 }, Signature(vec![1, 0xBB]))
            .await
            .unwrap();
        assert_eq!(
            engine.state(),
            EngineState::PrepareSent,
            "equivocating signature must not advance the count"
        );
        assert_eq!(ledger.current_height(), 0, "no premature commit");

        engine
            .on_prepare_response(Header { view_number: 0, seat: 2 }, Signature(vec![2, 0xCC]))
            .await
            .unwrap(); // 3/3, genuine quorum

        assert_eq!(engine.state(), EngineState::BlockSent);
        assert_eq!(ledger.current_height(), 1);
    }
}
