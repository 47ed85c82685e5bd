use aurum_chain::core::{
    Output, CONFIRMED_DEPTH, DEFAULT_COINBASE_REWARD, DEFAULT_TRANSACTION_FEE, HIT_POW_TARGET,
    NEAR_MISS_POW_TARGET, POW_BASE_TARGET,
};
use aurum_chain::network::Simulation;
use aurum_chain::wallet::Wallet;
use aurum_chain::{Command, Opt};
use clap::Parser;
use log::{error, LevelFilter};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Simulate {
            steps,
            mining_rounds,
        } => run_simulation(steps, mining_rounds)?,
        Command::Createwallet => {
            let wallet = Wallet::new()?;
            println!("Your new address: {}", wallet.get_address());
            println!("{}", wallet.get_public_pem());
        }
        Command::TargetInfo => {
            println!("Confirmation depth:      {CONFIRMED_DEPTH}");
            println!("Default coinbase:        {DEFAULT_COINBASE_REWARD}");
            println!("Default transaction fee: {DEFAULT_TRANSACTION_FEE}");
            println!("Base target:             {}", POW_BASE_TARGET.to_str_radix(16));
            println!("Mining target:           {}", HIT_POW_TARGET.to_str_radix(16));
            println!("Near-miss target:        {}", NEAR_MISS_POW_TARGET.to_str_radix(16));
        }
    }
    Ok(())
}

/// Three clients and two miners of unequal hash power share a genesis
/// allocation; Alice pays Bob once mining is underway, and the final view
/// of every participant is reported.
fn run_simulation(steps: usize, mining_rounds: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut sim = Simulation::new();

    let alice = sim.add_client("Alice")?;
    let bob = sim.add_client("Bob")?;
    let charlie = sim.add_client("Charlie")?;
    // Mickey's smaller burst size stands in for weaker hardware
    let minnie = sim.add_miner("Minnie", mining_rounds)?;
    let mickey = sim.add_miner("Mickey", mining_rounds / 2)?;

    sim.make_genesis(&[
        (alice.clone(), 233),
        (bob.clone(), 99),
        (charlie, 67),
        (minnie.clone(), 400),
        (mickey, 300),
    ])?;
    sim.start_miners()?;

    // Let some blocks land before the transfer goes out
    let warmup = sim.run(steps / 4);
    sim.post_transaction(
        &alice,
        vec![Output {
            amount: 40,
            address: bob,
        }],
        DEFAULT_TRANSACTION_FEE,
    )?;
    let executed = warmup + sim.run(steps - warmup);

    println!("Final state after {executed} ticks:");
    for participant in sim.participants() {
        let client = participant.as_client();
        let head_length = client
            .last_block()
            .map(|block| block.get_chain_length())
            .unwrap_or(0);
        println!(
            "  {:8} sees chain length {:3} and has {} confirmed gold",
            client.get_name(),
            head_length,
            client.confirmed_balance()
        );
    }

    let observer = sim
        .get_client(&minnie)
        .ok_or("Observer client missing from the simulation")?;
    println!("Confirmed ledger as {} sees it:", observer.get_name());
    let mut entries: Vec<(String, u64)> = observer.ledger().into_iter().collect();
    entries.sort();
    for (address, amount) in entries {
        let prefix = address.get(..12).unwrap_or(address.as_str());
        println!("  {prefix}... {amount}");
    }

    Ok(())
}
