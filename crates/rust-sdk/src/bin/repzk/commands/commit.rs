//! Commit command - Poseidon commitment to a score

use super::hex32;
use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use reputation_zk_core::{api, Tier};
use reputation_zk_sdk::envelope::parse_bytes32;
use serde_json::json;

#[derive(Args)]
pub struct CommitArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Reputation score (0-100)
    #[arg(long)]
    score: u16,

    /// Blinding secret (hex or decimal field element)
    #[arg(long, env = "REPZK_SECRET", hide_env_values = true)]
    secret: String,
}

pub fn run(config: &Config, args: CommitArgs) -> Result<()> {
    let secret = parse_bytes32(&args.secret).context("Invalid --secret")?;
    let commitment = api::poseidon_commit(args.score, &secret)?;
    let tier = Tier::for_threshold(args.score)?;

    if config.json_output {
        println!(
            "{}",
            json!({
                "score": args.score,
                "tier": tier.name(),
                "commitment": hex32(&commitment),
            })
        );
    } else if config.quiet {
        println!("{}", hex32(&commitment));
    } else {
        println!("{} Commitment computed", style("✓").green().bold());
        println!();
        println!("  Score: {} ({})", args.score, tier);
        println!("  Commitment: {}", hex32(&commitment));
    }

    Ok(())
}
