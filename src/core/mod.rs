//! Core consensus functionality
//!
//! This module contains the consensus-critical pieces: transactions,
//! blocks with their derived account state, the proof-of-work targets,
//! and the shared monetary constants.

pub mod block;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use monetary::{CONFIRMED_DEPTH, DEFAULT_COINBASE_REWARD, DEFAULT_TRANSACTION_FEE};
pub use proof_of_work::{
    hash_as_int, meets_target, HIT_POW_TARGET, NEAR_MISS_POW_TARGET, POW_BASE_TARGET,
};
pub use transaction::{Output, Transaction};
