use crate::core::monetary::DEFAULT_COINBASE_REWARD;
use crate::core::proof_of_work::{meets_target, HIT_POW_TARGET};
use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{current_timestamp, from_json, hash_hex, to_canonical_json};
use log::warn;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered container of transactions extending a parent block.
///
/// The serialized fields are the block's network identity; `balances`,
/// `next_nonce`, `target` and `coinbase_reward` are derived locally and
/// never travel on the wire. Each block owns an independent snapshot of the
/// derived maps - they are copied from the parent at construction, never
/// shared by reference.
#[derive(Debug, Clone)]
pub struct Block {
    prev_block_hash: String,
    chain_length: u64,
    timestamp: u64,
    reward_addr: String,
    coinbase_reward: u64,
    target: BigUint,
    proof: Option<u64>,
    transactions: Vec<(String, Transaction)>,
    balances: HashMap<String, u64>,
    next_nonce: HashMap<String, u64>,
}

// Canonical wire shape, fields in this exact order. `proof` is omitted
// entirely while the block is unsealed.
#[derive(Serialize)]
struct BlockWireRef<'a> {
    transactions: &'a [(String, Transaction)],
    #[serde(rename = "prevBlockHash")]
    prev_block_hash: &'a str,
    timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<u64>,
    #[serde(rename = "rewardAddr")]
    reward_addr: &'a str,
    #[serde(rename = "chainLength")]
    chain_length: u64,
}

#[derive(Deserialize)]
struct BlockWire {
    transactions: Vec<(String, Transaction)>,
    #[serde(rename = "prevBlockHash")]
    prev_block_hash: String,
    timestamp: u64,
    #[serde(default)]
    proof: Option<u64>,
    #[serde(rename = "rewardAddr")]
    reward_addr: String,
    #[serde(rename = "chainLength")]
    chain_length: u64,
}

impl Block {
    /// Build an unsealed block extending `prev_block` with the standard
    /// target and coinbase reward.
    pub fn new(reward_addr: &str, prev_block: Option<&Block>) -> Result<Block> {
        Self::with_target(
            reward_addr,
            prev_block,
            HIT_POW_TARGET.clone(),
            DEFAULT_COINBASE_REWARD,
        )
    }

    pub fn with_target(
        reward_addr: &str,
        prev_block: Option<&Block>,
        target: BigUint,
        coinbase_reward: u64,
    ) -> Result<Block> {
        let (prev_block_hash, chain_length) = match prev_block {
            Some(prev) => (prev.hash_val()?, prev.chain_length + 1),
            None => (String::new(), 0),
        };

        let mut balances = prev_block
            .map(|prev| prev.balances.clone())
            .unwrap_or_default();
        let next_nonce = prev_block
            .map(|prev| prev.next_nonce.clone())
            .unwrap_or_default();

        // The winner of the parent block is paid on the child's
        // construction; the genesis block pays no one.
        if let Some(prev) = prev_block {
            if !prev.reward_addr.is_empty() {
                *balances.entry(prev.reward_addr.clone()).or_insert(0) += prev.total_rewards();
            }
        }

        Ok(Block {
            prev_block_hash,
            chain_length,
            timestamp: current_timestamp()?,
            reward_addr: reward_addr.to_string(),
            coinbase_reward,
            target,
            proof: None,
            transactions: Vec::new(),
            balances,
            next_nonce,
        })
    }

    /// The unique chain root: empty reward address, starting balances
    /// installed directly. Validators detect it by its empty parent hash.
    pub fn make_genesis(starting_balances: &HashMap<String, u64>) -> Result<Block> {
        let mut genesis = Block::new("", None)?;
        genesis.balances = starting_balances.clone();
        Ok(genesis)
    }

    /// Canonical JSON text of the block. This exact byte sequence is what
    /// peers hash, so the field order and encoding must never drift.
    pub fn serialize(&self) -> Result<String> {
        to_canonical_json(&BlockWireRef {
            transactions: self.transactions.as_slice(),
            prev_block_hash: self.prev_block_hash.as_str(),
            timestamp: self.timestamp,
            proof: self.proof,
            reward_addr: self.reward_addr.as_str(),
            chain_length: self.chain_length,
        })
    }

    /// Rebuild a block from its wire form. Derived state starts empty and
    /// is recomputed by `rerun`; the target and coinbase reward are not
    /// wire-preserved and fall back to the agreed constants.
    pub fn deserialize(json: &str) -> Result<Block> {
        let wire: BlockWire = from_json(json)?;
        Ok(Block {
            prev_block_hash: wire.prev_block_hash,
            chain_length: wire.chain_length,
            timestamp: wire.timestamp,
            reward_addr: wire.reward_addr,
            coinbase_reward: DEFAULT_COINBASE_REWARD,
            target: HIT_POW_TARGET.clone(),
            proof: wire.proof,
            transactions: wire.transactions,
            balances: HashMap::new(),
            next_nonce: HashMap::new(),
        })
    }

    /// Content hash of the serialized block, hex-encoded. Doubles as the
    /// block's id.
    pub fn hash_val(&self) -> Result<String> {
        Ok(hash_hex(self.serialize()?.as_bytes()))
    }

    /// Proof-of-work check: the serialized block's hash, read as an
    /// unsigned 256-bit integer, must be strictly below the target.
    pub fn has_valid_proof(&self) -> bool {
        match self.serialize() {
            Ok(serialized) => meets_target(&serialized, &self.target),
            Err(e) => {
                log::error!("Block serialization failed during proof check: {e}");
                false
            }
        }
    }

    /// Try to admit a transaction into this block, applying its transfers
    /// to the derived state. Returns false (and logs) on the first failed
    /// admission rule; the block is unchanged in that case.
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        let tx_id = tx.id();

        if self.contains(&tx_id) {
            warn!("Rejecting duplicate transaction {tx_id}");
            return false;
        }
        if tx.get_sig().is_none() {
            warn!("Rejecting unsigned transaction {tx_id}");
            return false;
        }
        if !tx.valid_signature() {
            warn!("Rejecting transaction {tx_id}: invalid signature");
            return false;
        }
        if !tx.sufficient_funds(&self.balances) {
            warn!("Rejecting transaction {tx_id}: insufficient funds");
            return false;
        }

        let expected = self.next_nonce.get(tx.get_from()).copied().unwrap_or(0);
        if tx.get_nonce() < expected {
            warn!(
                "Rejecting transaction {tx_id}: replayed nonce {} (expected {expected})",
                tx.get_nonce()
            );
            return false;
        }
        if tx.get_nonce() > expected {
            warn!(
                "Rejecting transaction {tx_id}: out-of-order nonce {} (expected {expected})",
                tx.get_nonce()
            );
            return false;
        }
        self.next_nonce
            .insert(tx.get_from().to_string(), expected + 1);

        // Debit before credit: the sender may also appear in the outputs.
        let total = tx.total_output();
        if let Some(balance) = self.balances.get_mut(tx.get_from()) {
            *balance -= total;
        }
        for output in tx.get_outputs() {
            *self.balances.entry(output.address.clone()).or_insert(0) += output.amount;
        }

        self.transactions.push((tx_id, tx));
        true
    }

    /// Recompute the derived state by replaying every transaction against
    /// the parent's snapshot, in serialized order. Returns false on the
    /// first transaction that fails re-admission.
    pub fn rerun(&mut self, prev_block: &Block) -> bool {
        self.balances = prev_block.balances.clone();
        self.next_nonce = prev_block.next_nonce.clone();
        if !prev_block.reward_addr.is_empty() {
            *self
                .balances
                .entry(prev_block.reward_addr.clone())
                .or_insert(0) += prev_block.total_rewards();
        }

        let transactions = std::mem::take(&mut self.transactions);
        for (_, tx) in transactions {
            if !self.add_transaction(tx) {
                return false;
            }
        }
        true
    }

    /// Coinbase plus all transaction fees; credited to this block's reward
    /// address when a child block is built on top of it.
    pub fn total_rewards(&self) -> u64 {
        self.transactions
            .iter()
            .map(|(_, tx)| tx.get_fee())
            .fold(self.coinbase_reward, |acc, fee| acc + fee)
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.transactions.iter().any(|(id, _)| id == tx_id)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_empty()
    }

    pub fn get_prev_block_hash(&self) -> &str {
        self.prev_block_hash.as_str()
    }

    pub fn get_chain_length(&self) -> u64 {
        self.chain_length
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_reward_addr(&self) -> &str {
        self.reward_addr.as_str()
    }

    pub fn get_proof(&self) -> Option<u64> {
        self.proof
    }

    pub fn set_proof(&mut self, proof: u64) {
        self.proof = Some(proof);
    }

    pub fn get_target(&self) -> &BigUint {
        &self.target
    }

    pub fn get_transactions(&self) -> &[(String, Transaction)] {
        self.transactions.as_slice()
    }

    pub fn get_balances(&self) -> &HashMap<String, u64> {
        &self.balances
    }

    pub fn get_next_nonce(&self) -> &HashMap<String, u64> {
        &self.next_nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::proof_of_work::POW_BASE_TARGET;
    use crate::core::transaction::Output;
    use crate::wallet::Wallet;

    fn signed_tx(wallet: &Wallet, nonce: u64, outputs: Vec<(u64, &str)>, fee: u64) -> Transaction {
        let outputs = outputs
            .into_iter()
            .map(|(amount, address)| Output {
                amount,
                address: address.to_string(),
            })
            .collect();
        let mut tx = Transaction::new(
            wallet.get_address().to_string(),
            nonce,
            wallet.get_public_pem().to_string(),
            None,
            outputs,
            fee,
        );
        tx.sign(wallet.get_private_key()).unwrap();
        tx
    }

    fn genesis_with(wallet: &Wallet, amount: u64) -> Block {
        let mut balances = HashMap::new();
        balances.insert(wallet.get_address().to_string(), amount);
        balances.insert("ffff".to_string(), 100);
        balances.insert("face".to_string(), 99);
        Block::make_genesis(&balances).unwrap()
    }

    fn seal(block: &mut Block) {
        let mut proof = 0;
        loop {
            block.set_proof(proof);
            if block.has_valid_proof() {
                return;
            }
            proof += 1;
        }
    }

    fn easy_child(reward_addr: &str, prev: &Block) -> Block {
        Block::with_target(reward_addr, Some(prev), POW_BASE_TARGET.clone(), 25).unwrap()
    }

    #[test]
    fn test_genesis_shape() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        assert!(genesis.is_genesis());
        assert_eq!(genesis.get_chain_length(), 0);
        assert_eq!(genesis.get_prev_block_hash(), "");
        assert_eq!(genesis.get_reward_addr(), "");
        assert_eq!(genesis.balance_of(wallet.get_address()), 500);
    }

    #[test]
    fn test_child_links_to_parent() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);
        let child = easy_child(wallet.get_address(), &genesis);

        assert_eq!(child.get_chain_length(), 1);
        assert_eq!(child.get_prev_block_hash(), genesis.hash_val().unwrap());
        // Genesis has an empty reward address, so nothing is minted yet
        assert_eq!(child.balance_of(wallet.get_address()), 500);
    }

    #[test]
    fn test_reward_paid_on_next_block() {
        let wallet = Wallet::new().unwrap();
        let miner = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(miner.get_address(), &genesis);
        assert!(block.add_transaction(signed_tx(&wallet, 0, vec![(20, "ffff")], 3)));

        let next = easy_child(wallet.get_address(), &block);
        // Coinbase 25 plus the 3 gold fee
        assert_eq!(block.total_rewards(), 28);
        assert_eq!(next.balance_of(miner.get_address()), 28);
    }

    #[test]
    fn test_add_transaction_success() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        let tx = signed_tx(&wallet, 0, vec![(20, "ffff"), (40, "face")], 1);
        assert!(block.add_transaction(tx));

        assert_eq!(block.balance_of(wallet.get_address()), 439);
        assert_eq!(block.balance_of("ffff"), 120);
        assert_eq!(block.balance_of("face"), 139);
    }

    #[test]
    fn test_add_transaction_rejects_unsigned() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        let tx = Transaction::new(
            wallet.get_address().to_string(),
            0,
            wallet.get_public_pem().to_string(),
            None,
            vec![Output {
                amount: 20,
                address: "ffff".to_string(),
            }],
            1,
        );

        assert!(!block.add_transaction(tx));
        assert!(block.get_transactions().is_empty());
        assert_eq!(block.balance_of(wallet.get_address()), 500);
    }

    #[test]
    fn test_add_transaction_rejects_insufficient_funds() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        let tx = signed_tx(&wallet, 0, vec![(20_000_000_000_000, "ffff")], 1);

        assert!(!block.add_transaction(tx));
        assert!(block.get_transactions().is_empty());
    }

    #[test]
    fn test_add_transaction_rejects_duplicate_in_block() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        let tx = signed_tx(&wallet, 0, vec![(20, "ffff")], 1);
        assert!(block.add_transaction(tx.clone()));
        assert!(!block.add_transaction(tx));
        assert_eq!(block.get_transactions().len(), 1);
    }

    #[test]
    fn test_duplicate_across_blocks_is_rejected_by_nonce() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        let tx = signed_tx(&wallet, 0, vec![(20, "ffff")], 1);
        assert!(block.add_transaction(tx.clone()));

        // The nonce was consumed in the parent, so the replay fails
        let mut next = easy_child(wallet.get_address(), &block);
        assert!(!next.add_transaction(tx));
        assert!(next.get_transactions().is_empty());
    }

    #[test]
    fn test_out_of_order_nonce_is_rejected() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        assert!(!block.add_transaction(signed_tx(&wallet, 1, vec![(20, "ffff")], 1)));
        assert!(block.add_transaction(signed_tx(&wallet, 0, vec![(20, "ffff")], 1)));
        assert!(block.add_transaction(signed_tx(&wallet, 1, vec![(20, "ffff")], 1)));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        assert!(block.add_transaction(signed_tx(&wallet, 0, vec![(20, "ffff")], 1)));

        let original_balances = block.get_balances().clone();
        let original_nonces = block.get_next_nonce().clone();

        assert!(block.rerun(&genesis));
        assert_eq!(block.get_balances(), &original_balances);
        assert_eq!(block.get_next_nonce(), &original_nonces);
        // The parent's snapshot is untouched
        assert_eq!(genesis.balance_of(wallet.get_address()), 500);
    }

    #[test]
    fn test_serialize_round_trip() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let mut block = easy_child(wallet.get_address(), &genesis);
        assert!(block.add_transaction(signed_tx(&wallet, 0, vec![(20, "ffff")], 1)));
        seal(&mut block);

        let serialized = block.serialize().unwrap();
        let mut revived = Block::deserialize(&serialized).unwrap();
        // Derived state is recomputed, but the wire identity is unchanged
        assert_eq!(revived.serialize().unwrap(), serialized);
        assert_eq!(revived.hash_val().unwrap(), block.hash_val().unwrap());

        assert!(revived.rerun(&genesis));
        assert_eq!(revived.get_balances(), block.get_balances());
    }

    #[test]
    fn test_unsealed_block_omits_proof_from_wire() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        let serialized = genesis.serialize().unwrap();
        assert!(!serialized.contains("\"proof\""));

        let mut sealed_block = easy_child(wallet.get_address(), &genesis);
        sealed_block.set_proof(7);
        assert!(sealed_block.serialize().unwrap().contains("\"proof\":7"));
    }

    #[test]
    fn test_proof_validation_against_tight_target() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_with(&wallet, 500);

        // A one-bit target is unsatisfiable in practice; proof 0 must fail
        let mut block = Block::with_target(
            wallet.get_address(),
            Some(&genesis),
            BigUint::from(1u8),
            25,
        )
        .unwrap();
        block.set_proof(0);
        assert!(!block.has_valid_proof());
    }
}
