use crate::core::{Block, Output, Transaction, CONFIRMED_DEPTH, DEFAULT_TRANSACTION_FEE};
use crate::error::{BlockchainError, Result};
use crate::network::{FakeNet, Message};
use crate::wallet::Wallet;
use log::{debug, error, info, warn};
use std::collections::HashMap;

/// A non-mining participant: it holds a keypair, tracks every block it has
/// validated, follows the longest chain, and posts signed transactions.
///
/// Blocks in the store are logically immutable once inserted; their derived
/// maps are never touched again.
pub struct Client {
    name: String,
    wallet: Wallet,
    /// Next outbound transaction nonce, incremented on every post.
    nonce: u64,
    /// Posted but not yet confirmed transactions, keyed by nonce. Their
    /// total spend is held back from the available balance.
    pending_outgoing: HashMap<u64, Transaction>,
    blocks: HashMap<String, Block>,
    /// Orphans waiting for a parent, keyed by the missing parent's id.
    pending_blocks: HashMap<String, Vec<Block>>,
    last_block_id: Option<String>,
    last_confirmed_id: Option<String>,
    net: FakeNet,
}

impl Client {
    pub fn new(name: &str, net: FakeNet) -> Result<Client> {
        let wallet = Wallet::new()?;
        net.register(wallet.get_address());
        Ok(Client {
            name: name.to_string(),
            wallet,
            nonce: 0,
            pending_outgoing: HashMap::new(),
            blocks: HashMap::new(),
            pending_blocks: HashMap::new(),
            last_block_id: None,
            last_confirmed_id: None,
            net,
        })
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn get_address(&self) -> &str {
        self.wallet.get_address()
    }

    pub fn get_net(&self) -> &FakeNet {
        &self.net
    }

    pub fn get_block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.get(block_id)
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.last_block_id
            .as_deref()
            .and_then(|id| self.blocks.get(id))
    }

    /// The deepest ancestor of the head still within the confirmation
    /// window; the genesis block is always confirmed.
    pub fn last_confirmed_block(&self) -> Option<&Block> {
        self.last_confirmed_id
            .as_deref()
            .and_then(|id| self.blocks.get(id))
    }

    /// Install the chain root. Fails if this client already has one.
    pub fn set_genesis_block(&mut self, genesis: Block) -> Result<()> {
        if self.last_block_id.is_some() {
            return Err(BlockchainError::InvalidBlock(
                "Genesis block already set".to_string(),
            ));
        }
        let genesis_id = genesis.hash_val()?;
        self.blocks.insert(genesis_id.clone(), genesis);
        self.last_block_id = Some(genesis_id.clone());
        self.last_confirmed_id = Some(genesis_id);
        Ok(())
    }

    /// Balance of this client on the last confirmed block.
    pub fn confirmed_balance(&self) -> u64 {
        self.last_confirmed_block()
            .map(|block| block.balance_of(self.get_address()))
            .unwrap_or(0)
    }

    /// Snapshot of every account balance on the last confirmed block. The
    /// copy keeps callers away from the stored block's derived maps.
    pub fn ledger(&self) -> HashMap<String, u64> {
        self.last_confirmed_block()
            .map(|block| block.get_balances().clone())
            .unwrap_or_default()
    }

    /// Confirmed balance minus everything already promised in pending
    /// transactions.
    pub fn available_gold(&self) -> u64 {
        let pending_spent: u64 = self
            .pending_outgoing
            .values()
            .map(|tx| tx.total_output())
            .sum();
        self.confirmed_balance().saturating_sub(pending_spent)
    }

    /// Post a transaction with the default fee.
    pub fn post_transaction(&mut self, outputs: Vec<Output>) -> Result<Transaction> {
        self.post_transaction_with_fee(outputs, DEFAULT_TRANSACTION_FEE)
    }

    /// Sign and broadcast a transfer. Fails if the total spend exceeds the
    /// gold this client can still safely promise.
    pub fn post_transaction_with_fee(
        &mut self,
        outputs: Vec<Output>,
        fee: u64,
    ) -> Result<Transaction> {
        let total = outputs
            .iter()
            .map(|output| output.amount)
            .fold(fee, |acc, amount| acc.saturating_add(amount));
        let available = self.available_gold();
        if total > available {
            return Err(BlockchainError::InsufficientFunds {
                required: total,
                available,
            });
        }

        let mut tx = Transaction::new(
            self.get_address().to_string(),
            self.nonce,
            self.wallet.get_public_pem().to_string(),
            None,
            outputs,
            fee,
        );
        tx.sign(self.wallet.get_private_key())?;

        self.pending_outgoing.insert(self.nonce, tx.clone());
        self.nonce += 1;

        info!("{}: posting transaction {}", self.name, tx.id());
        self.net.broadcast(Message::PostTransaction {
            transaction: tx.clone(),
        });
        Ok(tx)
    }

    pub fn receive_serialized_block(&mut self, json: &str) -> Option<String> {
        match Block::deserialize(json) {
            Ok(block) => self.receive_block(block),
            Err(e) => {
                warn!("{}: dropping undecodable block: {e}", self.name);
                None
            }
        }
    }

    /// Validate and link an incoming block. Returns the id of the block if
    /// it was accepted into the store, or None if it was a duplicate,
    /// invalid, or is now waiting for its parent.
    ///
    /// Orphans unblocked by an accepted block are resolved through an
    /// explicit work queue rather than recursion; network reordering can
    /// chain arbitrarily many of them.
    pub fn receive_block(&mut self, block: Block) -> Option<String> {
        let accepted_id = self.try_accept(block)?;

        let mut unblocked = vec![accepted_id.clone()];
        while let Some(parent_id) = unblocked.pop() {
            if let Some(orphans) = self.pending_blocks.remove(&parent_id) {
                for orphan in orphans {
                    if let Some(id) = self.try_accept(orphan) {
                        unblocked.push(id);
                    }
                }
            }
        }

        Some(accepted_id)
    }

    fn try_accept(&mut self, mut block: Block) -> Option<String> {
        let block_id = match block.hash_val() {
            Ok(id) => id,
            Err(e) => {
                error!("{}: failed to hash incoming block: {e}", self.name);
                return None;
            }
        };

        if self.blocks.contains_key(&block_id) {
            debug!("{}: ignoring known block {block_id}", self.name);
            return None;
        }

        if !block.has_valid_proof() {
            warn!("{}: rejecting block {block_id}: invalid proof", self.name);
            return None;
        }

        let parent_id = block.get_prev_block_hash().to_string();
        if !self.blocks.contains_key(&parent_id) {
            // First orphan for this parent triggers a single request;
            // later arrivals just join the waiting set.
            if !self.pending_blocks.contains_key(&parent_id) {
                info!(
                    "{}: requesting missing block {parent_id} for orphan {block_id}",
                    self.name
                );
                self.net.broadcast(Message::MissingBlock {
                    from: self.get_address().to_string(),
                    missing: parent_id.clone(),
                });
            }
            let waiting = self.pending_blocks.entry(parent_id).or_default();
            if !waiting
                .iter()
                .any(|b| b.hash_val().ok().as_deref() == Some(block_id.as_str()))
            {
                waiting.push(block);
            }
            return None;
        }

        {
            let parent = self
                .blocks
                .get(&parent_id)
                .expect("Parent presence was just checked - this should never happen");
            if !block.rerun(parent) {
                warn!(
                    "{}: rejecting block {block_id}: transaction replay failed",
                    self.name
                );
                return None;
            }
        }

        let chain_length = block.get_chain_length();
        self.blocks.insert(block_id.clone(), block);

        // Longest chain wins; ties keep the incumbent head.
        let head_length = self
            .last_block()
            .map(|head| head.get_chain_length())
            .unwrap_or(0);
        if chain_length > head_length {
            self.last_block_id = Some(block_id.clone());
            self.set_last_confirmed();
        }

        Some(block_id)
    }

    /// Walk parents from the head until the confirmation depth is reached,
    /// then drop pending transactions the confirmed block includes.
    fn set_last_confirmed(&mut self) {
        let head = match self.last_block() {
            Some(head) => head,
            None => return,
        };
        let confirmed_height = head.get_chain_length().saturating_sub(CONFIRMED_DEPTH);

        let mut id = match self.last_block_id.clone() {
            Some(id) => id,
            None => return,
        };
        while let Some(block) = self.blocks.get(&id) {
            if block.get_chain_length() <= confirmed_height {
                break;
            }
            id = block.get_prev_block_hash().to_string();
        }
        self.last_confirmed_id = Some(id);

        if let Some(confirmed) = self.last_confirmed_block() {
            let confirmed_ids: Vec<u64> = self
                .pending_outgoing
                .iter()
                .filter(|(_, tx)| confirmed.contains(&tx.id()))
                .map(|(nonce, _)| *nonce)
                .collect();
            for nonce in confirmed_ids {
                self.pending_outgoing.remove(&nonce);
            }
        }
    }

    /// Answer a MISSING_BLOCK request by sending the serialized block
    /// directly to the requester.
    pub fn provide_missing_block(&self, requester: &str, missing: &str) -> Result<()> {
        let block = match self.blocks.get(missing) {
            Some(block) => block,
            None => return Ok(()),
        };
        debug!("{}: providing missing block {missing} to {requester}", self.name);
        let serialized = block.serialize()?;
        self.net
            .send_message(requester, Message::ProofFound { block: serialized })
    }

    /// Explicit dispatch over the protocol events. Plain clients ignore
    /// posted transactions and mining signals.
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::PostTransaction { .. } => {}
            Message::ProofFound { block } => {
                self.receive_serialized_block(&block);
            }
            Message::MissingBlock { from, missing } => {
                if let Err(e) = self.provide_missing_block(&from, &missing) {
                    error!("{}: failed to provide missing block: {e}", self.name);
                }
            }
            Message::StartMining => {}
        }
    }
}
