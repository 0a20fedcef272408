//! Batch verify command - randomized batch check over many proofs

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reputation_zk_core::{BatchVerifier, ProofOutcome, VerifyingKey, MAX_BATCH_SIZE};
use reputation_zk_sdk::artifacts;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args)]
pub struct BatchVerifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Proof files, in order
    #[arg(long = "proof", required = true, num_args = 1..)]
    proofs: Vec<PathBuf>,

    /// Public input files, one per proof
    #[arg(long = "public-inputs", required = true, num_args = 1..)]
    public_inputs: Vec<PathBuf>,

    /// Proofs per batch check
    #[arg(long, default_value_t = 256)]
    chunk_size: usize,
}

pub fn run(config: &Config, args: BatchVerifyArgs) -> Result<()> {
    if args.proofs.len() != args.public_inputs.len() {
        bail!(
            "Got {} proofs but {} public input files",
            args.proofs.len(),
            args.public_inputs.len()
        );
    }
    let chunk_size = args.chunk_size.clamp(1, MAX_BATCH_SIZE);
    let vk_bytes = config.load_vk()?;
    let vk = Arc::new(VerifyingKey::from_bytes(&vk_bytes).context("Invalid verifying key")?);
    let total = args.proofs.len();

    if config.chatty() {
        println!("{} Batch verifying {} proofs...", style("→").cyan().bold(), total);
        println!();
    }

    let pb = if config.chatty() {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} proofs - {msg}")?
                .progress_chars("█▓░"),
        );
        pb.set_message("Loading...");
        Some(pb)
    } else {
        None
    };

    let mut batch = BatchVerifier::new(Arc::clone(&vk), chunk_size)?.with_config(config.verifier);
    // Err holds the reason a file could not be loaded at all
    let mut outcomes: Vec<Result<ProofOutcome, String>> = Vec::with_capacity(total);
    let start = Instant::now();

    let pairs: Vec<_> = args.proofs.iter().zip(&args.public_inputs).collect();
    for chunk in pairs.chunks(chunk_size) {
        batch.reset();
        let mut loaded = Vec::with_capacity(chunk.len());
        for (proof_path, inputs_path) in chunk {
            let artifact = artifacts::load_proof(proof_path)
                .and_then(|p| Ok((p, artifacts::load_public_inputs(inputs_path)?)));
            match artifact {
                Ok((proof, inputs)) => {
                    // malformed entries keep their slot and surface in the result
                    let _ = batch.add(&proof, &inputs);
                    loaded.push(Ok(()));
                }
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", proof_path, e);
                    loaded.push(Err(e.to_string()));
                }
            }
        }

        if let Some(pb) = &pb {
            pb.set_message("Verifying...");
        }
        let mut verified = if batch.is_empty() {
            Vec::new().into_iter()
        } else {
            batch.verify()?.outcomes.into_iter()
        };
        for entry in loaded {
            outcomes.push(entry.map(|()| verified.next().unwrap_or(ProofOutcome::Rejected)));
        }

        if let Some(pb) = &pb {
            pb.inc(chunk.len() as u64);
            pb.set_message("Loading...");
        }
    }

    let elapsed = start.elapsed();
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let describe = |outcome: &Result<ProofOutcome, String>| match outcome {
        Ok(ProofOutcome::Valid) => "valid".to_string(),
        Ok(ProofOutcome::Rejected) => "rejected".to_string(),
        Ok(ProofOutcome::Malformed(e)) => format!("malformed: {}", e),
        Err(e) => format!("unreadable: {}", e),
    };
    let is_valid = |outcome: &Result<ProofOutcome, String>| {
        outcome.as_ref().map(ProofOutcome::is_valid).unwrap_or(false)
    };

    let valid = outcomes.iter().filter(|&o| is_valid(o)).count();
    let failed: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter(|&(_, o)| !is_valid(o))
        .map(|(i, _)| i)
        .collect();

    if config.json_output {
        let results: Vec<_> = outcomes
            .iter()
            .zip(&args.proofs)
            .map(|(o, path)| json!({ "proof": path.display().to_string(), "status": describe(o) }))
            .collect();
        println!(
            "{}",
            json!({
                "total": total,
                "valid": valid,
                "failed_indices": failed,
                "elapsed_us": elapsed.as_micros() as u64,
                "results": results,
            })
        );
    } else if !config.quiet {
        if failed.is_empty() {
            println!("{} All {} proofs verified", style("✓").green().bold(), total);
        } else {
            println!(
                "{} {} of {} proofs failed",
                style("✗").red().bold(),
                failed.len(),
                total
            );
            for &i in &failed {
                println!("  [{}] {:?}: {}", i, args.proofs[i], describe(&outcomes[i]));
            }
        }
        println!();
        println!("  Time: {:.2?}", elapsed);
    }

    if !failed.is_empty() {
        bail!("{} of {} proofs failed verification", failed.len(), total);
    }
    Ok(())
}
