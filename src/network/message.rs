use crate::core::Transaction;
use serde::{Deserialize, Serialize};

/// Protocol events carried over the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// A signed transaction for miners to pick up.
    PostTransaction { transaction: Transaction },
    /// A sealed block, serialized; broadcast by the finder or sent
    /// directly to a node that requested it.
    ProofFound { block: String },
    /// Request for a block absent from the sender's store.
    MissingBlock { from: String, missing: String },
    /// Internal cooperative-yield signal a miner sends itself between
    /// proof-search bursts.
    StartMining,
}
