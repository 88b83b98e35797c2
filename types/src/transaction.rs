use crate::hash::Hash256;
use std::fmt;

/// Identity of the account that submitted a transaction.
///
/// Opaque to the core beyond equality/hashing: it is only used to key the
/// pool's per-sender pending counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SenderId(pub [u8; 20]);

impl fmt::Debug for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderId({})", hex::encode(self.0))
    }
}

/// An admitted transaction.
///
/// The core never inspects `payload` — it only asks validators "is this
/// valid?" and uses `hash`/`nonce` for indexing and ordering. Equality is
/// hash equality, matching the data model's definition.
#[derive(Clone)]
pub struct Transaction {
    /// Application-defined type tag (e.g. transfer, contract invoke).
    pub type_tag: u8,
    /// Per-sender strictly increasing sequence number.
    pub nonce: u64,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// The submitting account.
    pub sender: SenderId,
    hash: Hash256,
}

impl Transaction {
    /// Builds a transaction and computes its hash over the fields that
    /// identify it (type tag, nonce, payload, sender) — signatures and any
    /// other malleable framing are outside what the core hashes.
    pub fn new(type_tag: u8, nonce: u64, payload: Vec<u8>, sender: SenderId) -> Self {
        let mut buf = Vec::with_capacity(1 + 8 + payload.len() + 20);
        buf.push(type_tag);
        buf.extend_from_slice(&nonce.to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&sender.0);
        let hash = Hash256::hash(&buf);
        Transaction {
            type_tag,
            nonce,
            payload,
            sender,
            hash,
        }
    }

    /// The transaction's deterministic hash, used as its identity.
    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    /// Size in bytes of the payload, used against the pool's `take` byte cap.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("hash", &self.hash)
            .field("type_tag", &self.type_tag)
            .field("nonce", &self.nonce)
            .field("sender", &self.sender)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}
impl Eq for Transaction {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(byte: u8) -> SenderId {
        SenderId([byte; 20])
    }

    #[test]
    fn equality_is_hash_equality() {
        let a = Transaction::new(1, 0, vec![1, 2, 3], sender(1));
        let b = Transaction::new(1, 0, vec![1, 2, 3], sender(1));
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn distinct_nonces_hash_differently() {
        let a = Transaction::new(1, 0, vec![1, 2, 3], sender(1));
        let b = Transaction::new(1, 1, vec![1, 2, 3], sender(1));
        assert_ne!(a, b);
    }
}
