use dbft_error::{Error as NodeError, ErrorKind};
use thiserror::Error;

/// Decoding failures, kept distinct from each other the way the wire format
/// requires: a caller needs to tell "the bytes ran out" apart from "the
/// bytes are there but malformed" apart from "the bytes encode a value
/// legally but not in its canonical (shortest) form".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before a complete field could be read.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A varuint used a longer tag byte than the value required, e.g.
    /// encoding `5` with the `0xFD` 2-byte-length prefix instead of as a
    /// single byte.
    #[error("irregular data: non-canonical varuint encoding")]
    IrregularData,
    /// A field decoded to a value the format does not allow (unknown
    /// message type, wrong-length hash, etc).
    #[error("invalid field: {0}")]
    InvalidField(String),
}

impl From<CodecError> for NodeError {
    fn from(err: CodecError) -> Self {
        NodeError::with_source(ErrorKind::Shape, err.to_string(), err)
    }
}

/// Local protocol-invariant violations: conditions that are not a wire
/// decoding failure but mean the message must be dropped without changing
/// any state (safety-first, see error handling design).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("seat {seat} equivocated at height {height} view {view}")]
    Equivocation { seat: u16, height: u64, view: u8 },
    #[error("prepare request already accepted for height {height} view {view}")]
    DuplicatePrepareRequest { height: u64, view: u8 },
    #[error("prepare request signer {got} does not match expected primary seat {expected}")]
    WrongPrimary { got: u16, expected: u16 },
    #[error("prepare request references unknown transactions")]
    MissingTransactions,
    #[error("prepare request timestamp did not advance monotonically")]
    NonMonotonicTimestamp,
    #[error("prepare request nonce {nonce} has already been used")]
    NonceAlreadyUsed { nonce: u32 },
}

impl From<ProtocolError> for NodeError {
    fn from(err: ProtocolError) -> Self {
        NodeError::with_source(ErrorKind::Protocol, err.to_string(), err)
    }
}
