//! Verify command - check a single proof or a reputation envelope

use super::hex32;
use crate::config::Config;
use crate::CommonArgs;
use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use reputation_zk_core::{
    Envelope, ReputationRequest, ReputationVerifier, Verdict, Verifier, VerifyingKey,
};
use reputation_zk_sdk::{artifacts, envelope};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Path to the proof (binary, .hex, or snarkjs .json)
    #[arg(long, required_unless_present = "envelope", conflicts_with = "envelope")]
    proof: Option<PathBuf>,

    /// Path to the public inputs (32-byte values, .hex, or snarkjs .json)
    #[arg(long, required_unless_present = "envelope")]
    public_inputs: Option<PathBuf>,

    /// Path to a 328-byte reputation envelope (binary or .hex)
    #[arg(long)]
    envelope: Option<PathBuf>,

    /// Commitment the envelope must carry
    #[arg(long, requires = "envelope")]
    commitment: Option<String>,

    /// Minimum threshold the envelope must prove
    #[arg(long, default_value_t = 0)]
    threshold: u16,

    /// Blacklist exclusion path for the envelope's agent (binary or .hex)
    #[arg(long, requires = "envelope")]
    exclusion_path: Option<PathBuf>,

    /// Maximum proof age in seconds (0 disables the check)
    #[arg(long, env = "REPZK_MAX_PROOF_AGE")]
    max_age: Option<u32>,

    /// Threshold floor applied to every envelope
    #[arg(long, env = "REPZK_MIN_THRESHOLD")]
    min_threshold: Option<u16>,

    /// Blacklist tree root
    #[arg(long, env = "REPZK_BLACKLIST_ROOT")]
    blacklist_root: Option<String>,

    /// Override the current time (unix seconds)
    #[arg(long)]
    now: Option<u64>,
}

pub fn run(config: &Config, args: VerifyArgs) -> Result<()> {
    let vk_bytes = config.load_vk()?;
    let vk = Arc::new(VerifyingKey::from_bytes(&vk_bytes).context("Invalid verifying key")?);

    match args.envelope.clone() {
        Some(path) => run_envelope(config, args, vk, path),
        None => run_proof(config, args, vk),
    }
}

fn run_proof(config: &Config, args: VerifyArgs, vk: Arc<VerifyingKey>) -> Result<()> {
    let (Some(proof_path), Some(inputs_path)) = (&args.proof, &args.public_inputs) else {
        bail!("--proof and --public-inputs are required");
    };
    let proof = artifacts::load_proof(proof_path)
        .with_context(|| format!("Failed to load proof: {:?}", proof_path))?;
    let inputs = artifacts::load_public_inputs(inputs_path)
        .with_context(|| format!("Failed to load public inputs: {:?}", inputs_path))?;

    if config.chatty() {
        println!("{} Verifying proof...", style("→").cyan().bold());
        println!("  Proof: {} bytes", proof.len());
        println!("  Public inputs: {}", inputs.len());
        println!("  IC points: {}", vk.ic().len());
        println!();
    }

    let verifier = Verifier::new(config.verifier);
    verifier.set_key(vk);

    let start = Instant::now();
    let verified = verifier.verify(&proof, &inputs)?;
    let elapsed = start.elapsed();

    if config.json_output {
        println!(
            "{}",
            json!({
                "verified": verified,
                "elapsed_us": elapsed.as_micros() as u64,
            })
        );
    } else if !config.quiet {
        if verified {
            println!("{} Proof verified successfully!", style("✓").green().bold());
        } else {
            println!("{} Proof verification failed", style("✗").red().bold());
        }
        println!();
        println!("  Time: {:.2?}", elapsed);
    }

    if !verified {
        bail!("proof rejected");
    }
    Ok(())
}

fn run_envelope(
    config: &Config,
    args: VerifyArgs,
    vk: Arc<VerifyingKey>,
    path: PathBuf,
) -> Result<()> {
    let bytes = artifacts::load_bytes(&path)
        .with_context(|| format!("Failed to load envelope: {:?}", path))?;
    let env = Envelope::from_bytes(&bytes).context("Invalid envelope")?;

    let commitment = match &args.commitment {
        Some(c) => envelope::parse_bytes32(c).context("Invalid --commitment")?,
        None => bail!("--commitment is required with --envelope"),
    };
    let exclusion_path = match &args.exclusion_path {
        Some(p) => Some(
            artifacts::load_bytes(p)
                .with_context(|| format!("Failed to load exclusion path: {:?}", p))?,
        ),
        None => None,
    };

    let mut policy = config.policy;
    if let Some(age) = args.max_age {
        policy.max_proof_age = age;
    }
    if let Some(min) = args.min_threshold {
        policy.min_threshold = min;
    }
    if let Some(root) = &args.blacklist_root {
        policy.blacklist_root =
            Some(envelope::parse_bytes32(root).context("Invalid --blacklist-root")?);
    }

    if config.chatty() {
        println!("{} Verifying reputation envelope...", style("→").cyan().bold());
        println!("  Agent: {}", hex32(&env.agent_id));
        println!("  Proven threshold: {}", env.threshold);
        println!("  Required threshold: {}", args.threshold);
        println!("  Timestamp: {}", env.timestamp);
        println!();
    }

    let verifier = ReputationVerifier::new(vk, policy)?;
    let request = ReputationRequest {
        expected_commitment: commitment,
        threshold: args.threshold,
        now: args.now.unwrap_or_else(envelope::now_unix),
        exclusion_path: exclusion_path.as_deref(),
    };
    let verdict = verifier.verify(&env, &request)?;

    match verdict {
        Verdict::Accepted => {
            if config.json_output {
                println!(
                    "{}",
                    json!({
                        "verified": true,
                        "threshold": env.threshold,
                        "tier": reputation_zk_core::Tier::for_threshold(env.threshold)?.name(),
                    })
                );
            } else if !config.quiet {
                println!("{} Envelope accepted", style("✓").green().bold());
            }
            Ok(())
        }
        Verdict::Rejected(reason) => {
            if config.json_output {
                println!("{}", json!({ "verified": false, "reason": reason.to_string() }));
            } else if !config.quiet {
                println!("{} Envelope rejected: {}", style("✗").red().bold(), reason);
            }
            bail!("envelope rejected: {}", reason);
        }
    }
}
