use dbft_app_config::{ExitCode, NodeConfig};
use dbft_consensus::ConsensusEngine;
use dbft_logger::{error, info};
use dbft_systemtime::Clock;
use dbft_test_utils::{MockClock, MockKeyStore, MockLedger, MockNetwork};
use dbft_traits::{Ledger, Metrics, NullMetrics};
use dbft_tx_pool::PoolDispatcher;
use std::path::Path;
use std::sync::Arc;

/// Loads the config, wires the pool dispatcher and consensus engine onto a
/// fresh `tokio` runtime, and blocks until the engine stops.
pub fn run(config_path: &Path) -> ExitCode {
    let config = match NodeConfig::load(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let _guard = match dbft_logger::init(&config.logger) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return ExitCode::Config;
        }
    };

    info!(
        target: "dbft_bin",
        seat = config.consensus.local_seat,
        n = config.consensus.n,
        "starting node"
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(target: "dbft_bin", error = %e, "failed to start async runtime");
            return ExitCode::Failure;
        }
    };
    runtime.block_on(run_async(config))
}

async fn run_async(config: NodeConfig) -> ExitCode {
    // The on-disk ledger, peer-to-peer transport, and signing key backend
    // are explicit non-goals of the core; this wires the engine against the
    // in-memory collaborators until a real backend is plugged in.
    let ledger = Arc::new(MockLedger::new());
    let clock = Arc::new(MockClock::new(dbft_systemtime::unix_time_as_millis()));
    let keystore = Arc::new(MockKeyStore::new(config.consensus.local_seat as u8));
    let network = Arc::new(MockNetwork::new());
    let metrics: Arc<dyn Metrics> = Arc::new(NullMetrics);

    let (dispatcher, pool) = PoolDispatcher::new(
        config.tx_pool,
        ledger.clone() as Arc<dyn Ledger>,
        clock.clone() as Arc<dyn Clock>,
        metrics.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());
    let pool_handle = pool.clone();

    let engine = ConsensusEngine::new(
        config.consensus,
        pool,
        ledger as Arc<dyn Ledger>,
        keystore,
        network,
        clock,
        metrics,
    );

    let result = engine.run().await;
    pool_handle.stop().await;
    let _ = dispatcher_task.await;

    match result {
        Ok(()) => ExitCode::Ok,
        Err(e) => {
            error!(target: "dbft_bin", error = %e, "consensus engine stopped");
            if e.is_fatal() {
                ExitCode::Failure
            } else {
                ExitCode::Ok
            }
        }
    }
}
