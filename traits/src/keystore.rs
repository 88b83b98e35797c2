use std::fmt;

/// An ECDSA/EdDSA-style signature, opaque to the core beyond its bytes.
///
/// Variable length to match the wire codec's `varbytes(signature)` framing —
/// this crate does not pin a specific curve.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// A public key identifying a consensus seat or a transaction sender.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} bytes)", self.0.len())
    }
}

/// Signing and verification, kept behind a trait so the core never depends
/// on a specific cryptographic primitive (see Non-goals).
pub trait KeyStore: Send + Sync {
    /// Signs `digest` with the local node's consensus key.
    fn sign(&self, digest: &[u8]) -> Signature;

    /// Verifies that `sig` is a valid signature over `digest` under `pubkey`.
    fn verify(&self, pubkey: &PublicKey, digest: &[u8], sig: &Signature) -> bool;
}
