/// The wire message kinds the network layer can be asked to route.
///
/// The core hands the network layer already-encoded bytes — the encoding
/// itself lives in `dbft-consensus`'s codec module, not here, so this crate
/// has no dependency on the consensus wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ChangeView,
    PrepareRequest,
    PrepareResponse,
    BlockSignatures,
}

/// Gossip transport, named only by interface (see Non-goals: peer-to-peer
/// transport is out of scope for the core).
pub trait Network: Send + Sync {
    /// Broadcasts an already-encoded consensus message to all peers.
    fn broadcast(&self, kind: MessageKind, payload: Vec<u8>);

    /// Registers interest in a message kind; encoded payloads matching it
    /// are pushed into `inbox` as they arrive from peers.
    fn subscribe(&self, kind: MessageKind, inbox: crossbeam_channel::Sender<Vec<u8>>);
}
