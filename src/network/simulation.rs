use crate::core::{Block, Output, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::{FakeNet, Message};
use crate::node::{Client, Miner};
use log::warn;
use std::collections::HashMap;

/// A node registered with the simulation, in either role.
pub enum Participant {
    Client(Client),
    Miner(Miner),
}

impl Participant {
    pub fn get_address(&self) -> &str {
        match self {
            Participant::Client(client) => client.get_address(),
            Participant::Miner(miner) => miner.get_address(),
        }
    }

    pub fn get_name(&self) -> &str {
        match self {
            Participant::Client(client) => client.get_name(),
            Participant::Miner(miner) => miner.get_name(),
        }
    }

    /// Every participant is a client underneath.
    pub fn as_client(&self) -> &Client {
        match self {
            Participant::Client(client) => client,
            Participant::Miner(miner) => miner.as_client(),
        }
    }

    pub fn as_client_mut(&mut self) -> &mut Client {
        match self {
            Participant::Client(client) => client,
            Participant::Miner(miner) => miner.as_client_mut(),
        }
    }

    pub fn handle(&mut self, message: Message) {
        match self {
            Participant::Client(client) => client.handle(message),
            Participant::Miner(miner) => miner.handle(message),
        }
    }
}

/// Single-threaded cooperative scheduler owning all participants.
///
/// Each `step` dispatches exactly one queued envelope to its addressee:
/// one inbound message or one mining burst per tick. Within a participant,
/// events arrive in enqueue order; across participants there is no total
/// order and the longest-chain rule resolves divergence.
pub struct Simulation {
    net: FakeNet,
    participants: HashMap<String, Participant>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Simulation {
        Simulation {
            net: FakeNet::new(),
            participants: HashMap::new(),
        }
    }

    pub fn get_net(&self) -> &FakeNet {
        &self.net
    }

    /// Create a non-mining client; returns its address.
    pub fn add_client(&mut self, name: &str) -> Result<String> {
        let client = Client::new(name, self.net.clone())?;
        let address = client.get_address().to_string();
        self.participants
            .insert(address.clone(), Participant::Client(client));
        Ok(address)
    }

    /// Create a miner with the given burst size; returns its address.
    pub fn add_miner(&mut self, name: &str, mining_rounds: u64) -> Result<String> {
        let miner = Miner::with_mining_rounds(name, self.net.clone(), mining_rounds)?;
        let address = miner.get_address().to_string();
        self.participants
            .insert(address.clone(), Participant::Miner(miner));
        Ok(address)
    }

    /// Build the genesis block from the given allocations and install it
    /// on every participant.
    pub fn make_genesis(&mut self, allocations: &[(String, u64)]) -> Result<()> {
        let starting_balances: HashMap<String, u64> = allocations.iter().cloned().collect();
        let genesis = Block::make_genesis(&starting_balances)?;
        for participant in self.participants.values_mut() {
            participant.as_client_mut().set_genesis_block(genesis.clone())?;
        }
        Ok(())
    }

    /// Start every miner's first candidate and mining signal.
    pub fn start_miners(&mut self) -> Result<()> {
        for participant in self.participants.values_mut() {
            if let Participant::Miner(miner) = participant {
                miner.initialize()?;
            }
        }
        Ok(())
    }

    pub fn get_client(&self, address: &str) -> Option<&Client> {
        self.participants
            .get(address)
            .map(|participant| participant.as_client())
    }

    pub fn get_client_mut(&mut self, address: &str) -> Option<&mut Client> {
        self.participants
            .get_mut(address)
            .map(|participant| participant.as_client_mut())
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Sign and broadcast a transaction from the named participant.
    pub fn post_transaction(
        &mut self,
        from: &str,
        outputs: Vec<Output>,
        fee: u64,
    ) -> Result<Transaction> {
        let client = self
            .get_client_mut(from)
            .ok_or_else(|| BlockchainError::Network(format!("Unknown address: {from}")))?;
        client.post_transaction_with_fee(outputs, fee)
    }

    /// Dispatch one queued envelope. Returns false when the network is
    /// idle.
    pub fn step(&mut self) -> bool {
        let envelope = match self.net.next_delivery() {
            Some(envelope) => envelope,
            None => return false,
        };
        match self.participants.get_mut(&envelope.to) {
            Some(participant) => participant.handle(envelope.message),
            None => warn!("Dropping message for unknown participant {}", envelope.to),
        }
        true
    }

    /// Run up to `max_steps` ticks; returns the number executed. Active
    /// miners reschedule themselves, so a cap is the only way a mining
    /// simulation stops.
    pub fn run(&mut self, max_steps: usize) -> usize {
        for executed in 0..max_steps {
            if !self.step() {
                return executed;
            }
        }
        max_steps
    }

    /// Run until the delivery queue drains; returns the number of ticks.
    /// Active miners reschedule themselves forever, so this is only for
    /// traffic between non-mining participants.
    pub fn run_until_idle(&mut self) -> usize {
        let mut executed = 0;
        while self.step() {
            executed += 1;
        }
        executed
    }

    /// Run until the predicate holds, checking it between ticks. Returns
    /// true if it held before `max_steps` ran out.
    pub fn run_until<F>(&mut self, predicate: F, max_steps: usize) -> bool
    where
        F: Fn(&Simulation) -> bool,
    {
        for _ in 0..max_steps {
            if predicate(self) {
                return true;
            }
            if !self.step() {
                return predicate(self);
            }
        }
        predicate(self)
    }
}
