use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, Transaction};
use crate::error::Result;
use crate::network::{FakeNet, Message};
use crate::node::Client;
use log::{error, info, warn};

/// A mining participant: a `Client` plus an in-progress candidate block
/// and a bounded proof search.
///
/// The search runs in bursts of `mining_rounds` attempts; between bursts
/// the miner re-enters the scheduler by sending itself START_MINING, which
/// is what lets incoming messages interleave with mining. `mining_rounds`
/// also stands in for relative hash power in deterministic tests.
pub struct Miner {
    client: Client,
    current_block: Option<Block>,
    mining_rounds: u64,
}

impl Miner {
    pub fn new(name: &str, net: FakeNet) -> Result<Miner> {
        Self::with_mining_rounds(name, net, GLOBAL_CONFIG.get_mining_rounds())
    }

    pub fn with_mining_rounds(name: &str, net: FakeNet, mining_rounds: u64) -> Result<Miner> {
        Ok(Miner {
            client: Client::new(name, net)?,
            current_block: None,
            mining_rounds,
        })
    }

    pub fn get_name(&self) -> &str {
        self.client.get_name()
    }

    pub fn get_address(&self) -> &str {
        self.client.get_address()
    }

    pub fn get_mining_rounds(&self) -> u64 {
        self.mining_rounds
    }

    /// The client view of this miner (block store, balances, posting).
    pub fn as_client(&self) -> &Client {
        &self.client
    }

    pub fn as_client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.current_block.as_ref()
    }

    /// Build the first candidate and emit the initial START_MINING signal.
    /// Requires the genesis block to be installed.
    pub fn initialize(&mut self) -> Result<()> {
        self.start_new_search()?;
        self.client
            .get_net()
            .send_message(self.get_address(), Message::StartMining)
    }

    /// Discard the current candidate and start mining atop the present
    /// head. Any transactions collected into the abandoned candidate are
    /// lost.
    pub fn start_new_search(&mut self) -> Result<()> {
        let mut block = Block::new(self.client.get_address(), self.client.last_block())?;
        block.set_proof(0);
        self.current_block = Some(block);
        Ok(())
    }

    /// One bounded burst of proof attempts. On success the sealed block is
    /// broadcast, received locally, and a fresh search begins. Unless
    /// `one_and_done`, the next burst is scheduled on a later tick.
    pub fn find_proof(&mut self, one_and_done: bool) {
        if let Some(mut block) = self.current_block.take() {
            let pause_point = block.get_proof().unwrap_or(0) + self.mining_rounds;

            let mut sealed = false;
            while block.get_proof().unwrap_or(0) < pause_point {
                if block.has_valid_proof() {
                    sealed = true;
                    break;
                }
                block.set_proof(block.get_proof().unwrap_or(0) + 1);
            }

            if sealed {
                info!(
                    "{}: found proof {} for block at height {}",
                    self.get_name(),
                    block.get_proof().unwrap_or(0),
                    block.get_chain_length()
                );
                self.announce_proof(&block);
                self.receive_block(block);
                if let Err(e) = self.start_new_search() {
                    error!("{}: failed to start a new search: {e}", self.get_name());
                }
            } else {
                self.current_block = Some(block);
            }
        }

        if !one_and_done {
            if let Err(e) = self
                .client
                .get_net()
                .send_message(self.get_address(), Message::StartMining)
            {
                error!("{}: failed to schedule next burst: {e}", self.get_name());
            }
        }
    }

    fn announce_proof(&self, block: &Block) {
        match block.serialize() {
            Ok(serialized) => self
                .client
                .get_net()
                .broadcast(Message::ProofFound { block: serialized }),
            Err(e) => error!("{}: failed to serialize sealed block: {e}", self.get_name()),
        }
    }

    /// Append a transaction to the in-progress candidate. There is no
    /// separate mempool: a transaction arriving between sealing one block
    /// and starting the next is dropped.
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        match self.current_block.as_mut() {
            Some(block) => block.add_transaction(tx),
            None => {
                warn!(
                    "{}: no candidate block yet, dropping transaction",
                    self.get_name()
                );
                false
            }
        }
    }

    pub fn receive_serialized_block(&mut self, json: &str) -> Option<String> {
        match Block::deserialize(json) {
            Ok(block) => self.receive_block(block),
            Err(e) => {
                warn!("{}: dropping undecodable block: {e}", self.get_name());
                None
            }
        }
    }

    /// Client block handling, then cut over to the new chain when the
    /// accepted block is strictly longer than the candidate being mined.
    pub fn receive_block(&mut self, block: Block) -> Option<String> {
        let accepted_id = self.client.receive_block(block)?;

        let accepted_length = self
            .client
            .get_block(&accepted_id)
            .map(|accepted| accepted.get_chain_length())
            .unwrap_or(0);
        if let Some(current) = &self.current_block {
            if accepted_length > current.get_chain_length() {
                info!("{}: cutting over to a longer chain", self.get_name());
                // TODO: carry the abandoned candidate's transactions into
                // the new one instead of dropping them.
                if let Err(e) = self.start_new_search() {
                    error!("{}: failed to start a new search: {e}", self.get_name());
                }
            }
        }

        Some(accepted_id)
    }

    /// Explicit dispatch over the protocol events; the miner additionally
    /// collects transactions and answers its own mining signal.
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::PostTransaction { transaction } => {
                self.add_transaction(transaction);
            }
            Message::ProofFound { block } => {
                self.receive_serialized_block(&block);
            }
            Message::MissingBlock { from, missing } => {
                if let Err(e) = self.client.provide_missing_block(&from, &missing) {
                    error!(
                        "{}: failed to provide missing block: {e}",
                        self.get_name()
                    );
                }
            }
            Message::StartMining => self.find_proof(false),
        }
    }
}
