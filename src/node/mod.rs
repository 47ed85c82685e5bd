//! Node roles
//!
//! A `Client` validates blocks, follows the longest chain and posts signed
//! transactions. A `Miner` is a client that additionally assembles a
//! candidate block and searches for proofs in cooperative bursts.

pub mod client;
pub mod miner;

pub use client::Client;
pub use miner::Miner;
