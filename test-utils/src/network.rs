use dbft_traits::{MessageKind, Network};
use parking_lot::Mutex;
use std::collections::HashMap;

/// A loopback network: `broadcast` records the payload instead of sending it
/// anywhere, and immediately fans it out to any subscriber registered for
/// that message kind. Good enough to drive single-process dBFT tests where
/// every seat's channel lives in the same test.
#[derive(Default)]
pub struct MockNetwork {
    sent: Mutex<Vec<(MessageKind, Vec<u8>)>>,
    subscribers: Mutex<HashMap<MessageKind, Vec<crossbeam_channel::Sender<Vec<u8>>>>>,
}

impl MockNetwork {
    /// A network with no broadcasts recorded and no subscribers yet.
    pub fn new() -> Self {
        MockNetwork::default()
    }

    /// Everything broadcast so far, in broadcast order.
    pub fn sent(&self) -> Vec<(MessageKind, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

impl Network for MockNetwork {
    fn broadcast(&self, kind: MessageKind, payload: Vec<u8>) {
        self.sent.lock().push((kind, payload.clone()));
        if let Some(subs) = self.subscribers.lock().get(&kind) {
            for sub in subs {
                // A dropped receiver only means that particular peer is done
                // listening; it must not take the rest of the network down.
                let _ = sub.send(payload.clone());
            }
        }
    }

    fn subscribe(&self, kind: MessageKind, inbox: crossbeam_channel::Sender<Vec<u8>>) {
        self.subscribers.lock().entry(kind).or_default().push(inbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_subscribers() {
        let net = MockNetwork::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        net.subscribe(MessageKind::ChangeView, tx);
        net.broadcast(MessageKind::ChangeView, vec![1, 2, 3]);
        assert_eq!(rx.recv().unwrap(), vec![1, 2, 3]);
        assert_eq!(net.sent().len(), 1);
    }
}
