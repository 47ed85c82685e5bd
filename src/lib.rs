//! # Aurum Chain - an account-based proof-of-work ledger
//!
//! A small blockchain node built around account balances rather than
//! unspent outputs: every block carries a derived `address -> gold` map and
//! a per-sender nonce map, recomputed deterministically by replaying the
//! block's transactions against its parent's snapshot.
//!
//! ## What's here
//! - **Consensus core**: transactions, blocks, canonical JSON hashing,
//!   proof-of-work against a 256-bit target
//! - **Nodes**: clients that validate, follow the longest chain and post
//!   signed transfers; miners that search for proofs in cooperative bursts
//! - **Simulated network**: an in-process bus with tick-based delivery and
//!   a single-threaded scheduler, so whole multi-party scenarios run
//!   deterministically inside one test
//! - **Wallets**: RSA keypairs with addresses derived by hashing the
//!   public key's PEM text
//!
//! ## How the code is organized
//! - `core/`: blocks, transactions, targets, consensus constants
//! - `node/`: the client and miner roles
//! - `network/`: protocol messages, the fake net, the simulation driver
//! - `wallet/`: key generation, signing, address derivation
//! - `utils/`: SHA-256 digests, RSA-SHA256 signatures, canonical JSON
//! - `config/`: env-tunable key size and mining burst length
//! - `cli/`: the `simulate`, `createwallet` and `targetinfo` commands
//!
//! Fork choice is strictly longest-chain and a block is treated as settled
//! six blocks deep; both rules live in `core` and are shared by every
//! node role.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    Block, Output, Transaction, CONFIRMED_DEPTH, DEFAULT_COINBASE_REWARD, DEFAULT_TRANSACTION_FEE,
    HIT_POW_TARGET, NEAR_MISS_POW_TARGET, POW_BASE_TARGET,
};
pub use error::{BlockchainError, Result};
pub use network::{Envelope, FakeNet, Message, Participant, Simulation};
pub use node::{Client, Miner};
pub use utils::{
    current_timestamp, generate_keypair, hash_base64, hash_hex, rsa_sha256_sign,
    rsa_sha256_verify, sha256_digest,
};
pub use wallet::{address_matches_key, calc_address, Wallet};
