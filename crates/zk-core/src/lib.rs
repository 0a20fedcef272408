//! Groth16 reputation proof verifier over BN254
//!
//! Everything below the API is built here: Montgomery field arithmetic,
//! G1/G2 with subgroup checks, the optimal ate pairing, Poseidon, and a
//! bump arena for scratch memory.
//!
//! # Example
//!
//! ```ignore
//! use reputation_zk_core::{api, reputation};
//!
//! api::init()?;
//! let handle = api::vk_load(&vk_bytes)?;
//!
//! let commitment = api::poseidon_commit(85, &secret)?;
//! let threshold = reputation_zk_core::Fr::from_u64(75).to_bytes();
//! let ok = api::verify(&handle, &proof_bytes, &[threshold, commitment])?;
//!
//! println!("Verified: {}", ok);
//! api::cleanup();
//! ```

pub mod api;
pub mod arena;
pub mod batch;
pub mod constants;
pub mod curve;
pub mod debug;
pub mod errors;
pub mod field;
pub mod fq12;
pub mod fq2;
pub mod fq6;
pub mod key;
pub mod ops;
pub mod pairing;
pub mod poseidon;
pub mod proof;
pub mod reputation;
pub mod stats;
pub mod tier;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use api::KeyHandle;
pub use arena::Arena;
pub use batch::{BatchItem, BatchResult, BatchVerifier, ProofOutcome, MAX_BATCH_SIZE};
pub use curve::{G1Affine, G1Projective, G2Affine, G2Projective};
pub use errors::{
    ArenaError, BatchError, FieldError, KeyError, PointError, ProofError, UnknownTier,
    VerifyError,
};
pub use field::{Fq, Fr};
pub use key::{VerifyingKey, MAX_PUBLIC_INPUTS, VK_HEADER_SIZE};
pub use proof::{Proof, PROOF_SIZE};
pub use reputation::{
    compute_nullifier, poseidon_commit, verify_exclusion_proof, Envelope, PolicyConfig,
    RejectReason, ReputationRequest, ReputationVerifier, Verdict, ENVELOPE_SIZE,
};
pub use stats::StatsSnapshot;
pub use tier::Tier;
pub use types::{G1Bytes, G2Bytes, Scalar};
pub use verifier::{Verifier, VerifierConfig};
