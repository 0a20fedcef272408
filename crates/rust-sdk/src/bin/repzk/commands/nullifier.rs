//! Nullifier command - per-agent, per-nonce nullifier

use super::hex32;
use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use clap::Args;
use reputation_zk_core::compute_nullifier;
use reputation_zk_sdk::envelope::parse_bytes32;
use serde_json::json;

#[derive(Args)]
pub struct NullifierArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Agent id (32 bytes, hex)
    #[arg(long)]
    agent_id: String,

    /// Nonce
    #[arg(long, default_value_t = 0)]
    nonce: u64,
}

pub fn run(config: &Config, args: NullifierArgs) -> Result<()> {
    let agent_id = parse_bytes32(&args.agent_id).context("Invalid --agent-id")?;
    let nullifier = compute_nullifier(&agent_id, args.nonce);

    if config.json_output {
        println!(
            "{}",
            json!({
                "agent_id": hex32(&agent_id),
                "nonce": args.nonce,
                "nullifier": hex32(&nullifier),
            })
        );
    } else if config.quiet {
        println!("{}", hex32(&nullifier));
    } else {
        println!("  Agent: {}", hex32(&agent_id));
        println!("  Nonce: {}", args.nonce);
        println!("  Nullifier: {}", hex32(&nullifier));
    }
    Ok(())
}
