use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "aurum-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "simulate",
        about = "Run a scripted multi-party mining simulation on the in-process network"
    )]
    Simulate {
        #[arg(long, default_value_t = 60_000, help = "Scheduler ticks to run")]
        steps: usize,
        #[arg(
            long,
            default_value_t = 2000,
            help = "Proof attempts per mining burst for the faster miner"
        )]
        mining_rounds: u64,
    },
    #[command(name = "createwallet", about = "Generate a keypair and print its address")]
    Createwallet,
    #[command(
        name = "targetinfo",
        about = "Print the consensus constants every node must agree on"
    )]
    TargetInfo,
}
