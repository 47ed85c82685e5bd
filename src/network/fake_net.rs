use crate::error::{BlockchainError, Result};
use crate::network::Message;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// A message scheduled for delivery on a later tick.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: String,
    pub message: Message,
}

struct NetInner {
    addresses: Vec<String>,
    queue: VecDeque<Envelope>,
}

/// In-process message bus connecting simulated participants by address.
///
/// Cloning yields another handle to the same bus. Sends only enqueue;
/// delivery happens when the scheduler pops the next envelope.
#[derive(Clone)]
pub struct FakeNet {
    inner: Arc<RwLock<NetInner>>,
}

impl Default for FakeNet {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNet {
    pub fn new() -> FakeNet {
        FakeNet {
            inner: Arc::new(RwLock::new(NetInner {
                addresses: vec![],
                queue: VecDeque::new(),
            })),
        }
    }

    pub fn register(&self, address: &str) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on network - this should never happen");
        if !inner.addresses.iter().any(|a| a == address) {
            inner.addresses.push(address.to_string());
        }
    }

    pub fn is_registered(&self, address: &str) -> bool {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on network - this should never happen");
        inner.addresses.iter().any(|a| a == address)
    }

    /// Enqueue a message for every registered participant, the sender
    /// included.
    pub fn broadcast(&self, message: Message) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on network - this should never happen");
        let recipients: Vec<String> = inner.addresses.clone();
        for to in recipients {
            inner.queue.push_back(Envelope {
                to,
                message: message.clone(),
            });
        }
    }

    /// Enqueue a message for a single participant; unknown addresses are an
    /// error surfaced to the caller.
    pub fn send_message(&self, address: &str, message: Message) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on network - this should never happen");
        if !inner.addresses.iter().any(|a| a == address) {
            return Err(BlockchainError::Network(format!(
                "Unknown address: {address}"
            )));
        }
        inner.queue.push_back(Envelope {
            to: address.to_string(),
            message,
        });
        Ok(())
    }

    /// Pop the next envelope for dispatch.
    pub fn next_delivery(&self) -> Option<Envelope> {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on network - this should never happen");
        inner.queue.pop_front()
    }

    pub fn pending_count(&self) -> usize {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on network - this should never happen");
        inner.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_every_participant() {
        let net = FakeNet::new();
        net.register("alice");
        net.register("bob");
        net.register("alice"); // duplicate registration is a no-op

        net.broadcast(Message::StartMining);
        assert_eq!(net.pending_count(), 2);

        let first = net.next_delivery().unwrap();
        let second = net.next_delivery().unwrap();
        assert_eq!(first.to, "alice");
        assert_eq!(second.to, "bob");
        assert!(net.is_idle());
    }

    #[test]
    fn test_send_message_to_unknown_address_fails() {
        let net = FakeNet::new();
        net.register("alice");

        assert!(net.send_message("bob", Message::StartMining).is_err());
        assert!(net.send_message("alice", Message::StartMining).is_ok());
        assert_eq!(net.pending_count(), 1);
    }

    #[test]
    fn test_delivery_preserves_enqueue_order() {
        let net = FakeNet::new();
        net.register("alice");

        net.send_message(
            "alice",
            Message::ProofFound {
                block: "first".to_string(),
            },
        )
        .unwrap();
        net.send_message(
            "alice",
            Message::ProofFound {
                block: "second".to_string(),
            },
        )
        .unwrap();

        match net.next_delivery().unwrap().message {
            Message::ProofFound { block } => assert_eq!(block, "first"),
            other => panic!("Unexpected message: {other:?}"),
        }
        match net.next_delivery().unwrap().message {
            Message::ProofFound { block } => assert_eq!(block, "second"),
            other => panic!("Unexpected message: {other:?}"),
        }
    }
}
