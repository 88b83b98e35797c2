use dbft_traits::Signature;
use dbft_types::{Hash256, Seat, ViewNumber};

/// The type byte in the common header, distinguishing the four wire
/// messages. Values match the historical dBFT wire format this protocol
/// descends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    ChangeView = 0x00,
    PrepareRequest = 0x20,
    PrepareResponse = 0x21,
    BlockSignatures = 0x30,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(MessageType::ChangeView),
            0x20 => Some(MessageType::PrepareRequest),
            0x21 => Some(MessageType::PrepareResponse),
            0x30 => Some(MessageType::BlockSignatures),
            _ => None,
        }
    }
}

/// The header every consensus message carries: type tag, view number, and
/// the sender's fixed seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub view_number: ViewNumber,
    pub seat: Seat,
}

/// One entry in a [`ConsensusMessage::BlockSignatures`] payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSignature {
    pub seat: Seat,
    pub signature: Signature,
}

/// The four wire messages exchanged by the consensus state machine.
///
/// Created on a local event, serialized via the codec, dispatched over the
/// network, and discarded after processing — these are not retained beyond
/// the round they belong to (the retained state lives in
/// [`crate::context::ConsensusContext`] instead).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusMessage {
    ChangeView {
        header: Header,
        new_view_number: ViewNumber,
    },
    PrepareRequest {
        header: Header,
        nonce: u32,
        timestamp_ms: u64,
        tx_hashes: Vec<Hash256>,
        miner_sig: Signature,
    },
    PrepareResponse {
        header: Header,
        sig: Signature,
    },
    BlockSignatures {
        header: Header,
        sigs: Vec<SeatSignature>,
    },
}

impl ConsensusMessage {
    pub fn header(&self) -> Header {
        match self {
            ConsensusMessage::ChangeView { header, .. }
            | ConsensusMessage::PrepareRequest { header, .. }
            | ConsensusMessage::PrepareResponse { header, .. }
            | ConsensusMessage::BlockSignatures { header, .. } => *header,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            ConsensusMessage::ChangeView { .. } => MessageType::ChangeView,
            ConsensusMessage::PrepareRequest { .. } => MessageType::PrepareRequest,
            ConsensusMessage::PrepareResponse { .. } => MessageType::PrepareResponse,
            ConsensusMessage::BlockSignatures { .. } => MessageType::BlockSignatures,
        }
    }
}
