//! Groth16 verification
//!
//! A proof (A, B, C) for public inputs x is accepted iff
//!
//! ```text
//! e(-A, B) * e(alpha, beta) * e(vk_x, gamma) * e(C, delta) == 1
//! vk_x = IC[0] + sum(x_i * IC[i + 1])
//! ```
//!
//! The single-proof path runs entirely on the stack: four pairs through one
//! shared Miller loop and one final exponentiation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::arena::DEFAULT_SCRATCH_CAPACITY;
use crate::batch::{self, BatchItem, BatchResult};
use crate::curve::G1Projective;
use crate::debug::{fr_to_hex, g1_to_hex, g2_to_hex};
use crate::errors::VerifyError;
use crate::field::Fr;
use crate::key::{VerifyingKey, MAX_PUBLIC_INPUTS};
use crate::pairing::multi_pairing_fixed;
use crate::proof::Proof;
use crate::stats;
use crate::types::Scalar;

/// Batches smaller than this are verified one proof at a time
pub const DEFAULT_MIN_BATCH_SIZE: usize = 4;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Minimum bytes of per-thread scratch arena
    pub scratch_capacity: usize,
    /// Smallest batch that is aggregated
    pub min_batch_size: usize,
    /// Scrub arena memory when scopes end
    pub zero_on_restore: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            zero_on_restore: false,
        }
    }
}

impl VerifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scratch_capacity(mut self, bytes: usize) -> Self {
        self.scratch_capacity = bytes;
        self
    }

    pub fn min_batch_size(mut self, size: usize) -> Self {
        self.min_batch_size = size;
        self
    }

    pub fn zero_on_restore(mut self, enabled: bool) -> Self {
        self.zero_on_restore = enabled;
        self
    }
}

/// Compute `vk_x = IC[0] + sum(inputs[i] * IC[i + 1])`.
///
/// Each term goes through the constant-time ladder.
pub fn compute_vk_x(vk: &VerifyingKey, inputs: &[Fr]) -> Result<G1Projective, VerifyError> {
    if inputs.len() + 1 != vk.ic.len() {
        return Err(VerifyError::BadInputs {
            expected: vk.num_public_inputs(),
            actual: inputs.len(),
        });
    }
    let mut acc = vk.ic[0].to_projective();
    for (x, ic) in inputs.iter().zip(&vk.ic[1..]) {
        acc = acc.add(&ic.to_projective().mul(x));
    }
    Ok(acc)
}

/// Verify a decoded proof against decoded public inputs.
///
/// `Ok(false)` means the pairing equation does not hold.
pub fn verify(vk: &VerifyingKey, proof: &Proof, inputs: &[Fr]) -> Result<bool, VerifyError> {
    let vk_x = compute_vk_x(vk, inputs)?.to_affine();
    log::trace!("A = {}", g1_to_hex(&proof.a));
    log::trace!("B = {}", g2_to_hex(&proof.b));
    log::trace!("C = {}", g1_to_hex(&proof.c));
    log::trace!("vk_x = {}", g1_to_hex(&vk_x));

    let pairs = [
        (-proof.a, proof.b),
        (vk.alpha, vk.beta),
        (vk_x, vk.gamma),
        (proof.c, vk.delta),
    ];
    Ok(multi_pairing_fixed(&pairs).is_one())
}

/// Decode 32-byte big-endian public inputs into `out`.
///
/// Every input must be a canonical scalar.
pub fn parse_public_inputs<'a>(
    inputs: &[Scalar],
    out: &'a mut [Fr; MAX_PUBLIC_INPUTS],
) -> Result<&'a [Fr], VerifyError> {
    if inputs.len() > MAX_PUBLIC_INPUTS {
        return Err(VerifyError::BadInputs {
            expected: MAX_PUBLIC_INPUTS,
            actual: inputs.len(),
        });
    }
    for (slot, bytes) in out.iter_mut().zip(inputs) {
        *slot = Fr::from_bytes(bytes)?;
        log::trace!("public input {}", fr_to_hex(slot));
    }
    Ok(&out[..inputs.len()])
}

/// Verify wire-encoded proof and inputs against a parsed key.
pub fn verify_bytes(
    vk: &VerifyingKey,
    proof_bytes: &[u8],
    inputs: &[Scalar],
) -> Result<bool, VerifyError> {
    if inputs.len() != vk.num_public_inputs() {
        return Err(VerifyError::BadInputs {
            expected: vk.num_public_inputs(),
            actual: inputs.len(),
        });
    }
    let proof = Proof::from_bytes(proof_bytes)?;
    let mut buf = [Fr::ZERO; MAX_PUBLIC_INPUTS];
    let inputs = parse_public_inputs(inputs, &mut buf)?;
    verify(vk, &proof, inputs)
}

/// `verify_bytes` plus statistics and logging
pub(crate) fn verify_recorded(
    vk: &VerifyingKey,
    proof_bytes: &[u8],
    inputs: &[Scalar],
) -> Result<bool, VerifyError> {
    let start = Instant::now();
    let result = verify_bytes(vk, proof_bytes, inputs);
    let accepted = matches!(result, Ok(true));
    stats::global().record_verify(accepted, start.elapsed());
    match &result {
        Ok(ok) => log::debug!("groth16 verify: {}", if *ok { "accepted" } else { "rejected" }),
        Err(e) => log::debug!("groth16 verify failed: {}", e),
    }
    result
}

/// Verification engine holding one replaceable key
///
/// Loading takes the write lock; verification clones the `Arc` under a
/// short read lock and runs without holding it.
#[derive(Debug, Default)]
pub struct Verifier {
    config: VerifierConfig,
    key: RwLock<Option<Arc<VerifyingKey>>>,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            key: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Parse and install a key.
    ///
    /// On any error the slot is cleared, so a failed load never leaves a
    /// previous or partial key behind. Returns the IC length.
    pub fn load_key(&self, bytes: &[u8]) -> Result<usize, VerifyError> {
        let mut slot = self.key.write().unwrap_or_else(PoisonError::into_inner);
        match VerifyingKey::from_bytes(bytes) {
            Ok(vk) => {
                let ic_len = vk.ic.len();
                *slot = Some(Arc::new(vk));
                log::debug!("verifying key loaded ({} public inputs)", ic_len - 1);
                Ok(ic_len)
            }
            Err(e) => {
                *slot = None;
                log::warn!("verifying key rejected: {}", e);
                Err(e.into())
            }
        }
    }

    /// Install an already parsed key.
    pub fn set_key(&self, vk: Arc<VerifyingKey>) {
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = Some(vk);
    }

    pub fn unload(&self) {
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn key(&self) -> Result<Arc<VerifyingKey>, VerifyError> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(VerifyError::VkNotInitialized)
    }

    /// IC length of the loaded key, 0 when none is loaded
    pub fn ic_len(&self) -> usize {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |vk| vk.ic.len())
    }

    pub fn verify(&self, proof_bytes: &[u8], inputs: &[Scalar]) -> Result<bool, VerifyError> {
        let vk = self.key()?;
        verify_recorded(&vk, proof_bytes, inputs)
    }

    /// Verify many proofs against the loaded key.
    ///
    /// Malformed entries are reported per index; they do not fail the call.
    pub fn batch_verify(
        &self,
        proofs: &[&[u8]],
        inputs: &[Vec<Scalar>],
    ) -> Result<BatchResult, VerifyError> {
        let vk = self.key()?;
        batch::verify_wire(&vk, proofs, inputs, &self.config)
    }

    /// Verify pre-decoded items, possibly under different keys.
    pub fn batch_verify_items(&self, items: &[BatchItem]) -> Result<Vec<bool>, VerifyError> {
        batch::verify_items_recorded(items, &self.config)
    }
}
