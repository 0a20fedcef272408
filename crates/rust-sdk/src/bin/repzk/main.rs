//! repzk CLI - Verify Groth16 reputation proofs
//!
//! This CLI verifies single proofs and batches, checks reputation
//! envelopes against a policy, and computes commitments, tiers and
//! nullifiers.

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{batch_verify, commit, convert, nullifier, tier, verify};
use console::style;

/// CLI for verifying Groth16 reputation proofs over BN254
#[derive(Parser)]
#[command(name = "repzk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Common options shared across commands
#[derive(Args, Clone)]
pub struct CommonArgs {
    /// Path to the verifying key (binary, .hex, or snarkjs .json)
    #[arg(long, env = "REPZK_VK")]
    pub vk: Option<String>,

    /// Output format (human, json)
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a proof, or a reputation envelope against the policy
    Verify(verify::VerifyArgs),

    /// Verify many proofs against one key with a randomized batch check
    BatchVerify(batch_verify::BatchVerifyArgs),

    /// Compute the Poseidon commitment to a score
    Commit(commit::CommitArgs),

    /// Show the tier for a threshold, or list all tiers
    Tier(tier::TierArgs),

    /// Compute an agent nullifier
    Nullifier(nullifier::NullifierArgs),

    /// Convert snarkjs JSON artifacts to wire bytes
    Convert(convert::ConvertArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify(args) => {
            let config = config::Config::load(&args.common)?;
            verify::run(&config, args)
        }
        Commands::BatchVerify(args) => {
            let config = config::Config::load(&args.common)?;
            batch_verify::run(&config, args)
        }
        Commands::Commit(args) => {
            let config = config::Config::load(&args.common)?;
            commit::run(&config, args)
        }
        Commands::Tier(args) => {
            let config = config::Config::load(&args.common)?;
            tier::run(&config, args)
        }
        Commands::Nullifier(args) => {
            let config = config::Config::load(&args.common)?;
            nullifier::run(&config, args)
        }
        Commands::Convert(args) => {
            let config = config::Config::load(&args.common)?;
            convert::run(&config, args)
        }
    };

    // Handle errors nicely
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
