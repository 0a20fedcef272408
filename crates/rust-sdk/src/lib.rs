//! Rust SDK for Groth16 reputation proofs
//!
//! File-level companion to `reputation-zk-core`: converts snarkjs
//! artifacts to wire bytes, loads proofs and keys from disk, and builds
//! reputation envelopes.
//!
//! # Example
//!
//! ```ignore
//! use reputation_zk_sdk::{artifacts, snarkjs};
//! use reputation_zk_core::api;
//! use std::path::Path;
//!
//! let vk = artifacts::load_vk(Path::new("verification_key.json"))?;
//! let proof = artifacts::load_proof(Path::new("proof.json"))?;
//! let inputs = artifacts::load_public_inputs(Path::new("public.json"))?;
//!
//! api::init()?;
//! let handle = api::vk_load(&vk)?;
//! println!("Verified: {}", api::verify(&handle, &proof, &inputs)?);
//! ```

pub mod artifacts;
pub mod envelope;
mod error;
pub mod snarkjs;

pub use error::{Result, SdkError};
pub use snarkjs::{
    parse_field_element, proof_json_to_bytes, public_json_to_inputs, vk_json_to_bytes,
    SnarkjsProof, SnarkjsVk,
};

pub use reputation_zk_core as core;
