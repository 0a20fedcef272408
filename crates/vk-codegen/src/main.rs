//! vk-codegen - turn a snarkjs verification_key.json into VK wire bytes
//!
//! Outputs raw bytes, hex text, or a Rust source file with the key as a
//! `const` byte array so it can be embedded with `include!`.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use reputation_zk_core::VerifyingKey;
use reputation_zk_sdk::vk_json_to_bytes;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vk-codegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to snarkjs verification_key.json
    input: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "rust")]
    format: Format,

    /// Output file (stdout when omitted; bin requires a file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the generated constant
    #[arg(long, default_value = "VK_BYTES")]
    const_name: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Bin,
    Hex,
    Rust,
}

const BYTES_PER_LINE: usize = 16;

fn is_const_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Render `bytes` as a Rust source file.
fn render_rust(bytes: &[u8], vk: &VerifyingKey, const_name: &str, source: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by vk-codegen from {}. Do not edit.", source);
    let _ = writeln!(out);
    let _ = writeln!(out, "/// Number of public inputs the key was generated for");
    let _ = writeln!(
        out,
        "pub const {}_NUM_PUBLIC_INPUTS: usize = {};",
        const_name,
        vk.num_public_inputs()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "/// Groth16 verifying key, wire format");
    let _ = writeln!(out, "pub const {}: [u8; {}] = [", const_name, bytes.len());
    for line in bytes.chunks(BYTES_PER_LINE) {
        let row: Vec<String> = line.iter().map(|b| format!("0x{:02x},", b)).collect();
        let _ = writeln!(out, "    {}", row.join(" "));
    }
    let _ = writeln!(out, "];");
    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    if !is_const_name(&cli.const_name) {
        bail!("--const-name must be SCREAMING_SNAKE_CASE, got {:?}", cli.const_name);
    }

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    let bytes = vk_json_to_bytes(&json).context("Failed to convert verification key")?;
    let vk = VerifyingKey::from_bytes(&bytes).context("Converted key failed validation")?;
    log::info!(
        "Converted VK: {} public inputs, {} bytes",
        vk.num_public_inputs(),
        bytes.len()
    );

    let source = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.input.display().to_string());

    let data = match cli.format {
        Format::Bin => {
            if cli.output.is_none() {
                bail!("Binary output needs --output");
            }
            bytes.clone()
        }
        Format::Hex => format!("{}\n", hex::encode(&bytes)).into_bytes(),
        Format::Rust => render_rust(&bytes, &vk, &cli.const_name, &source).into_bytes(),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &data).with_context(|| format!("Failed to write {:?}", path))?;
            log::info!("Wrote {:?}", path);
        }
        None => print!("{}", String::from_utf8_lossy(&data)),
    }
    Ok(())
}
