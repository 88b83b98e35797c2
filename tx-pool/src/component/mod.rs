mod entry;
mod pool;

pub use entry::TxEntry;
pub use pool::{Pool, PoolQuery, SubmitOutcome};
