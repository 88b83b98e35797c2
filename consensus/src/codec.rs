//! Bit-exact binary codec for the four consensus wire messages.
//!
//! The format is length-prefixed and little-endian throughout. Variable
//! length fields use a `varuint` length prefix: values below `0xFD` are a
//! single byte; larger values use a tag byte (`0xFD`/`0xFE`/`0xFF`)
//! followed by 2/4/8 little-endian length bytes. A `varuint` encoded with a
//! longer tag than the value strictly requires is rejected as
//! [`CodecError::IrregularData`] rather than silently accepted — decoding
//! must reject it, never normalize it.

use crate::error::CodecError;
use crate::messages::{ConsensusMessage, Header, MessageType, SeatSignature};
use dbft_traits::Signature;
use dbft_types::{Hash256, Seat, ViewNumber};

const TAG_U16: u8 = 0xFD;
const TAG_U32: u8 = 0xFE;
const TAG_U64: u8 = 0xFF;

/// An append-only byte buffer with the little-endian primitives the wire
/// format needs.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `v` using the shortest possible varuint encoding.
    pub fn write_varuint(&mut self, v: u64) {
        if v < TAG_U16 as u64 {
            self.write_u8(v as u8);
        } else if v <= u16::MAX as u64 {
            self.write_u8(TAG_U16);
            self.write_u16(v as u16);
        } else if v <= u32::MAX as u64 {
            self.write_u8(TAG_U32);
            self.write_u32(v as u32);
        } else {
            self.write_u8(TAG_U64);
            self.write_u64(v);
        }
    }

    pub fn write_varbytes(&mut self, bytes: &[u8]) {
        self.write_varuint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    fn write_header(&mut self, header: Header) {
        self.write_u8(header.view_number);
        self.write_u16(header.seat);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A forward-only cursor over a byte slice, with canonical-varuint
/// enforcement baked into every read.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.take(n)
    }

    /// Reads a varuint, rejecting any encoding longer than the value
    /// strictly requires.
    pub fn read_varuint(&mut self) -> Result<u64, CodecError> {
        let tag = self.read_u8()?;
        match tag {
            TAG_U16 => {
                let v = self.read_u16()?;
                if (v as u64) < TAG_U16 as u64 {
                    return Err(CodecError::IrregularData);
                }
                Ok(v as u64)
            }
            TAG_U32 => {
                let v = self.read_u32()?;
                if (v as u64) <= u16::MAX as u64 {
                    return Err(CodecError::IrregularData);
                }
                Ok(v as u64)
            }
            TAG_U64 => {
                let v = self.read_u64()?;
                if v <= u32::MAX as u64 {
                    return Err(CodecError::IrregularData);
                }
                Ok(v)
            }
            small => Ok(small as u64),
        }
    }

    pub fn read_varbytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_varuint()?;
        let len = usize::try_from(len)
            .map_err(|_| CodecError::InvalidField("varbytes length overflow".into()))?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn read_header(&mut self) -> Result<(MessageType, Header), CodecError> {
        let type_byte = self.read_u8()?;
        let message_type = MessageType::from_byte(type_byte)
            .ok_or_else(|| CodecError::InvalidField(format!("unknown message type {type_byte:#x}")))?;
        let view_number: ViewNumber = self.read_u8()?;
        let seat: Seat = self.read_u16()?;
        Ok((message_type, Header { view_number, seat }))
    }

    fn read_hash(&mut self) -> Result<Hash256, CodecError> {
        let bytes = self.read_bytes(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Hash256::from(arr))
    }
}

/// Encodes `msg` to its canonical wire form.
pub fn encode(msg: &ConsensusMessage) -> Vec<u8> {
    let mut w = Writer::new();
    match msg {
        ConsensusMessage::ChangeView {
            header,
            new_view_number,
        } => {
            w.write_u8(MessageType::ChangeView as u8);
            w.write_header(*header);
            w.write_u8(*new_view_number);
        }
        ConsensusMessage::PrepareRequest {
            header,
            nonce,
            timestamp_ms,
            tx_hashes,
            miner_sig,
        } => {
            w.write_u8(MessageType::PrepareRequest as u8);
            w.write_header(*header);
            w.write_u32(*nonce);
            w.write_u64(*timestamp_ms);
            w.write_varuint(tx_hashes.len() as u64);
            for hash in tx_hashes {
                w.write_bytes(hash.as_bytes());
            }
            w.write_varbytes(&miner_sig.0);
        }
        ConsensusMessage::PrepareResponse { header, sig } => {
            w.write_u8(MessageType::PrepareResponse as u8);
            w.write_header(*header);
            w.write_varbytes(&sig.0);
        }
        ConsensusMessage::BlockSignatures { header, sigs } => {
            w.write_u8(MessageType::BlockSignatures as u8);
            w.write_header(*header);
            w.write_varuint(sigs.len() as u64);
            for entry in sigs {
                w.write_u16(entry.seat);
                w.write_varbytes(&entry.signature.0);
            }
        }
    }
    w.into_bytes()
}

/// Decodes a message, requiring the entire buffer to be consumed exactly —
/// trailing bytes are as much a shape error as missing ones.
pub fn decode(bytes: &[u8]) -> Result<ConsensusMessage, CodecError> {
    let mut r = Reader::new(bytes);
    let (message_type, header) = r.read_header()?;
    let msg = match message_type {
        MessageType::ChangeView => {
            let new_view_number = r.read_u8()?;
            ConsensusMessage::ChangeView {
                header,
                new_view_number,
            }
        }
        MessageType::PrepareRequest => {
            let nonce = r.read_u32()?;
            let timestamp_ms = r.read_u64()?;
            let count = r.read_varuint()?;
            let count = usize::try_from(count)
                .map_err(|_| CodecError::InvalidField("tx count overflow".into()))?;
            let mut tx_hashes = Vec::with_capacity(count);
            for _ in 0..count {
                tx_hashes.push(r.read_hash()?);
            }
            let miner_sig = Signature(r.read_varbytes()?);
            ConsensusMessage::PrepareRequest {
                header,
                nonce,
                timestamp_ms,
                tx_hashes,
                miner_sig,
            }
        }
        MessageType::PrepareResponse => {
            let sig = Signature(r.read_varbytes()?);
            ConsensusMessage::PrepareResponse { header, sig }
        }
        MessageType::BlockSignatures => {
            let count = r.read_varuint()?;
            let count = usize::try_from(count)
                .map_err(|_| CodecError::InvalidField("signature count overflow".into()))?;
            let mut sigs = Vec::with_capacity(count);
            for _ in 0..count {
                let seat = r.read_u16()?;
                let signature = Signature(r.read_varbytes()?);
                sigs.push(SeatSignature { seat, signature });
            }
            ConsensusMessage::BlockSignatures { header, sigs }
        }
    };

    if r.remaining() != 0 {
        return Err(CodecError::InvalidField("trailing bytes after message body".into()));
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_prepare_response_is_bit_exact() {
        let header = Header {
            view_number: 3,
            seat: 5,
        };
        let sig = Signature(vec![0xAA; 64]);
        let msg = ConsensusMessage::PrepareResponse { header, sig };
        let bytes = encode(&msg);

        let mut expected = vec![0x21, 0x03, 0x05, 0x00, 0x40];
        expected.extend(std::iter::repeat(0xAA).take(64));
        assert_eq!(bytes, expected);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn round_trip_every_variant() {
        let header = Header {
            view_number: 1,
            seat: 2,
        };
        let messages = vec![
            ConsensusMessage::ChangeView {
                header,
                new_view_number: 4,
            },
            ConsensusMessage::PrepareRequest {
                header,
                nonce: 0xDEAD_BEEF,
                timestamp_ms: 1_700_000_000_000,
                tx_hashes: vec![Hash256::hash(b"a"), Hash256::hash(b"b")],
                miner_sig: Signature(vec![1, 2, 3]),
            },
            ConsensusMessage::PrepareResponse {
                header,
                sig: Signature(vec![9; 10]),
            },
            ConsensusMessage::BlockSignatures {
                header,
                sigs: vec![
                    SeatSignature {
                        seat: 0,
                        signature: Signature(vec![1]),
                    },
                    SeatSignature {
                        seat: 1,
                        signature: Signature(vec![2, 2]),
                    },
                ],
            },
        ];

        for msg in messages {
            let bytes = encode(&msg);
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded, msg);
            assert_eq!(encode(&decoded), bytes);
        }
    }

    #[test]
    fn irregular_varuint_is_rejected() {
        // 5 encoded with the 2-byte tag instead of as a single byte.
        let bytes = [TAG_U16, 5, 0];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_varuint(), Err(CodecError::IrregularData));
    }

    #[test]
    fn truncated_input_is_unexpected_eof() {
        let bytes = [0x21, 0x03, 0x05]; // header missing its last byte
        assert_eq!(decode(&bytes), Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn unknown_message_type_is_invalid_field() {
        let bytes = [0x7F, 0x00, 0x00, 0x00];
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidField(_))));
    }
}
