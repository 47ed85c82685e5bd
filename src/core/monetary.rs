//! Consensus constants for the gold ledger
//!
//! All participating nodes must agree on these values: they feed block
//! construction and validation, and are deliberately NOT carried on the
//! wire (see `Block::deserialize`). Amounts are denominated in "gold",
//! the single indivisible unit of the ledger.

/// Gold minted to the miner whose proof seals a block, credited when the
/// next block is constructed on top of it.
pub const DEFAULT_COINBASE_REWARD: u64 = 25;

/// Default fee attached to a posted transaction.
pub const DEFAULT_TRANSACTION_FEE: u64 = 1;

/// Number of blocks after which a block is considered unlikely to roll back.
pub const CONFIRMED_DEPTH: u64 = 6;
