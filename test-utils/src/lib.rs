//! Deterministic test doubles for the four external collaborators named in
//! the system's external interfaces: `Ledger`, `KeyStore`, `Network`, and
//! `Clock`. Used as dev-dependencies by `tx-pool` and `consensus` so their
//! test suites never touch real I/O or real wall-clock time.

mod clock;
mod keystore;
mod ledger;
mod network;

pub use clock::MockClock;
pub use keystore::MockKeyStore;
pub use ledger::{MockLedger, MockSnapshot};
pub use network::MockNetwork;
