//! Test utilities for consensus testing

use crate::core::{Block, Output, Transaction, POW_BASE_TARGET};
use crate::wallet::Wallet;
use std::collections::HashMap;

pub fn output(amount: u64, address: &str) -> Output {
    Output {
        amount,
        address: address.to_string(),
    }
}

/// Build and sign a transfer from the wallet's address.
pub fn signed_transfer(
    wallet: &Wallet,
    nonce: u64,
    outputs: &[(u64, &str)],
    fee: u64,
) -> Transaction {
    let outputs = outputs
        .iter()
        .map(|(amount, address)| output(*amount, address))
        .collect();
    let mut tx = Transaction::new(
        wallet.get_address().to_string(),
        nonce,
        wallet.get_public_pem().to_string(),
        None,
        outputs,
        fee,
    );
    tx.sign(wallet.get_private_key())
        .expect("Signing with a fresh key should not fail");
    tx
}

/// Genesis block with the given starting allocations.
pub fn genesis_for(allocations: &[(&str, u64)]) -> Block {
    let balances: HashMap<String, u64> = allocations
        .iter()
        .map(|(address, amount)| (address.to_string(), *amount))
        .collect();
    Block::make_genesis(&balances).expect("Genesis construction should not fail")
}

/// Child block built against the base target, so any proof seals it.
pub fn easy_block(reward_addr: &str, prev: &Block) -> Block {
    Block::with_target(reward_addr, Some(prev), POW_BASE_TARGET.clone(), 25)
        .expect("Block construction should not fail")
}

/// Search proofs from zero until the block's target is met.
pub fn seal(block: &mut Block) {
    let mut proof = 0;
    loop {
        block.set_proof(proof);
        if block.has_valid_proof() {
            return;
        }
        proof += 1;
    }
}

/// Sealed easy-target child in one call.
pub fn sealed_easy_block(reward_addr: &str, prev: &Block) -> Block {
    let mut block = easy_block(reward_addr, prev);
    seal(&mut block);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_easy_block_is_valid_and_linked() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_for(&[(wallet.get_address(), 100)]);

        let block = sealed_easy_block(wallet.get_address(), &genesis);
        assert!(block.has_valid_proof());
        assert_eq!(block.get_chain_length(), 1);
        assert_eq!(block.get_prev_block_hash(), genesis.hash_val().unwrap());
    }

    #[test]
    fn test_signed_transfer_is_admissible() {
        let wallet = Wallet::new().unwrap();
        let genesis = genesis_for(&[(wallet.get_address(), 100)]);

        let mut block = easy_block(wallet.get_address(), &genesis);
        let tx = signed_transfer(&wallet, 0, &[(10, "ffff")], 1);
        assert!(block.add_transaction(tx));
    }
}
