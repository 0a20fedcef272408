//! Tier command - map thresholds to reputation tiers

use crate::config::Config;
use crate::CommonArgs;
use anyhow::Result;
use clap::Args;
use console::style;
use reputation_zk_core::{api, Tier};
use serde_json::json;

#[derive(Args)]
pub struct TierArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Threshold (0-100); omit to list every tier
    threshold: Option<u16>,
}

pub fn run(config: &Config, args: TierArgs) -> Result<()> {
    let Some(threshold) = args.threshold else {
        return list(config);
    };
    let tier = api::tier_for_threshold(threshold)?;

    if config.json_output {
        println!(
            "{}",
            json!({
                "threshold": threshold,
                "tier": tier.name(),
                "level": u8::from(tier),
                "tier_minimum": tier.threshold(),
            })
        );
    } else if config.quiet {
        println!("{}", tier);
    } else {
        println!("  Threshold {} → {}", threshold, style(tier).cyan().bold());
    }
    Ok(())
}

fn list(config: &Config) -> Result<()> {
    if config.json_output {
        let tiers: Vec<_> = Tier::ALL
            .iter()
            .map(|t| json!({ "tier": t.name(), "level": u8::from(*t), "minimum": t.threshold() }))
            .collect();
        println!("{}", json!(tiers));
    } else {
        for tier in Tier::ALL {
            println!("  {:<11} >= {}", tier.name(), tier.threshold());
        }
    }
    Ok(())
}
