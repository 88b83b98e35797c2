//! Interfaces the core consumes from collaborators it does not implement:
//! the ledger, the key store, the network, and the metrics sink.
//!
//! The purpose statement in the governing design treats these as external
//! collaborators named only by interface — the node wires concrete
//! implementations (or, in tests, `dbft-test-utils` mocks) at the binary's
//! entry point, never inside `tx-pool` or `consensus`.

mod keystore;
mod ledger;
mod metrics;
mod network;

pub use keystore::{KeyStore, PublicKey, Signature};
pub use ledger::{Block, Ledger, Snapshot};
pub use metrics::{Metrics, NullMetrics};
pub use network::{MessageKind, Network};
