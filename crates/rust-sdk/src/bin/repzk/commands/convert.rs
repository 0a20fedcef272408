//! Convert command - snarkjs JSON to wire bytes

use crate::config::{expand_tilde, Config};
use crate::CommonArgs;
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use reputation_zk_sdk::{proof_json_to_bytes, public_json_to_inputs, vk_json_to_bytes};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// snarkjs JSON file (verification_key.json, proof.json, or public.json)
    input: PathBuf,

    /// Artifact kind (detected from the JSON when omitted)
    #[arg(long)]
    kind: Option<ArtifactKind>,

    /// Output encoding
    #[arg(long, default_value = "hex")]
    format: Encoding,

    /// Output file (stdout when omitted; binary output requires a file)
    #[arg(short = 'O', long)]
    out: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum ArtifactKind {
    Vk,
    Proof,
    Public,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    Hex,
    Bin,
}

fn detect(value: &serde_json::Value) -> Option<ArtifactKind> {
    match value {
        serde_json::Value::Array(_) => Some(ArtifactKind::Public),
        serde_json::Value::Object(map) if map.contains_key("IC") => Some(ArtifactKind::Vk),
        serde_json::Value::Object(map) if map.contains_key("pi_a") => Some(ArtifactKind::Proof),
        _ => None,
    }
}

pub fn run(config: &Config, args: ConvertArgs) -> Result<()> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    let kind = match args.kind {
        Some(kind) => kind,
        None => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("Input is not valid JSON")?;
            detect(&value).context("Could not detect artifact kind; pass --kind")?
        }
    };

    let bytes = match kind {
        ArtifactKind::Vk => vk_json_to_bytes(&json)?,
        ArtifactKind::Proof => proof_json_to_bytes(&json)?.to_vec(),
        ArtifactKind::Public => public_json_to_inputs(&json)?.concat(),
    };

    match (&args.out, args.format) {
        (Some(out), format) => {
            let path = expand_tilde(out);
            let data = match format {
                Encoding::Hex => format!("{}\n", hex::encode(&bytes)).into_bytes(),
                Encoding::Bin => bytes.clone(),
            };
            fs::write(&path, data).with_context(|| format!("Failed to write {:?}", path))?;

            if config.json_output {
                println!(
                    "{}",
                    json!({
                        "kind": format!("{:?}", kind).to_lowercase(),
                        "bytes": bytes.len(),
                        "output": path.display().to_string(),
                    })
                );
            } else if !config.quiet {
                println!(
                    "{} Wrote {:?} ({} bytes) to {:?}",
                    style("✓").green().bold(),
                    kind,
                    bytes.len(),
                    path
                );
            }
        }
        (None, Encoding::Hex) => {
            if config.json_output {
                println!(
                    "{}",
                    json!({
                        "kind": format!("{:?}", kind).to_lowercase(),
                        "bytes": bytes.len(),
                        "hex": hex::encode(&bytes),
                    })
                );
            } else {
                println!("{}", hex::encode(&bytes));
            }
        }
        (None, Encoding::Bin) => bail!("Binary output needs --out"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        let vk = json!({ "IC": [], "nPublic": 0 });
        let proof = json!({ "pi_a": [] });
        let public = json!(["1"]);
        assert_eq!(detect(&vk), Some(ArtifactKind::Vk));
        assert_eq!(detect(&proof), Some(ArtifactKind::Proof));
        assert_eq!(detect(&public), Some(ArtifactKind::Public));
        assert_eq!(detect(&json!(1)), None);
    }
}
