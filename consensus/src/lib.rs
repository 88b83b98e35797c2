//! Round-based dBFT consensus: the state machine that turns a stream of
//! pool-admitted transactions into committed blocks, and the wire codec its
//! peers speak.

mod codec;
mod config;
mod context;
mod engine;
mod error;
mod messages;

pub use codec::{decode, encode};
pub use config::ConsensusConfig;
pub use context::{ConsensusContext, Role};
pub use engine::{ConsensusEngine, EngineState};
pub use error::{CodecError, ProtocolError};
pub use messages::{ConsensusMessage, Header, MessageType, SeatSignature};
