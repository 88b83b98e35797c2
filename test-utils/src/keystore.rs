use dbft_traits::{KeyStore, PublicKey, Signature};

/// A deterministic "signer": it does not implement real cryptography, it
/// derives a fixed-length tag from the seat id and the digest so that
/// distinct (seat, digest) pairs produce distinct signatures and
/// `verify` can check them without an external crypto crate.
pub struct MockKeyStore {
    seat_tag: u8,
}

impl MockKeyStore {
    /// Creates a key store for the given seat index. Two `MockKeyStore`s
    /// created with different `seat_tag`s produce different signatures over
    /// the same digest, which is what the equivocation tests rely on.
    pub fn new(seat_tag: u8) -> Self {
        MockKeyStore { seat_tag }
    }

    fn public_key(&self) -> PublicKey {
        PublicKey(vec![self.seat_tag])
    }
}

impl KeyStore for MockKeyStore {
    fn sign(&self, digest: &[u8]) -> Signature {
        let mut sig = Vec::with_capacity(digest.len() + 1);
        sig.push(self.seat_tag);
        sig.extend_from_slice(digest);
        Signature(sig)
    }

    fn verify(&self, pubkey: &PublicKey, digest: &[u8], sig: &Signature) -> bool {
        if sig.0.len() != digest.len() + 1 {
            return false;
        }
        let (tag, body) = sig.0.split_at(1);
        tag == pubkey.0.as_slice() && body == digest
    }
}

impl MockKeyStore {
    /// Exposes the public key matching this store's signatures, for tests
    /// that need to call `verify` against a peer's claimed identity.
    pub fn public_key_for(seat_tag: u8) -> PublicKey {
        PublicKey(vec![seat_tag])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let ks = MockKeyStore::new(5);
        let digest = b"hello";
        let sig = ks.sign(digest);
        assert!(ks.verify(&ks.public_key(), digest, &sig));
    }

    #[test]
    fn distinct_seats_produce_distinct_signatures() {
        let a = MockKeyStore::new(1);
        let b = MockKeyStore::new(2);
        assert_ne!(a.sign(b"x").0, b.sign(b"x").0);
    }
}
