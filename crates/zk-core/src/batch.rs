//! Randomized batch verification
//!
//! For proofs sharing a key, n pairing checks are folded into one with
//! fresh 128-bit random weights r_i:
//!
//! ```text
//! prod(e(-r_i*A_i, B_i)) * e(sum(r_i)*alpha, beta)
//!     * e(sum(r_i*vk_x_i), gamma) * e(sum(r_i*C_i), delta) == 1
//! ```
//!
//! That is n + 3 pairs per key, all through a single multi-Miller loop.
//! `sum(r_i*vk_x_i)` is folded into one coefficient per IC point and
//! scaled with the constant-time ladder; only `sum(r_i*C_i)` uses the
//! MSM. When the combined check fails every proof is re-verified on its
//! own so the result names the failing indices.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::arena::{scratch_peak, with_scratch, Arena};
use crate::curve::{msm, G1Affine, G1Projective, G2Affine};
use crate::errors::{BatchError, VerifyError};
use crate::field::Fr;
use crate::key::VerifyingKey;
use crate::pairing::multi_pairing;
use crate::proof::Proof;
use crate::stats;
use crate::types::Scalar;
use crate::verifier::{self, parse_public_inputs, VerifierConfig};

/// Upper bound on a [`BatchVerifier`]'s capacity
pub const MAX_BATCH_SIZE: usize = 1024;

const SCRATCH_BASE: usize = 64 * 1024;
const SCRATCH_PER_PROOF: usize = 1024;

/// Arena bytes that comfortably fit an aggregated batch of `n` proofs
pub const fn scratch_hint(n: usize) -> usize {
    SCRATCH_BASE + n * SCRATCH_PER_PROOF
}

/// Result for one batch entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    Valid,
    Rejected,
    /// The entry could not be decoded; carries the reason
    Malformed(VerifyError),
}

impl ProofOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ProofOutcome::Valid)
    }
}

impl From<bool> for ProofOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            ProofOutcome::Valid
        } else {
            ProofOutcome::Rejected
        }
    }
}

/// Per-index outcomes of a batch, in submission order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ProofOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_valid(&self) -> bool {
        self.outcomes.iter().all(ProofOutcome::is_valid)
    }

    pub fn valid_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_valid()).count()
    }

    /// Indices of entries that were rejected or malformed
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_valid())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Decoded proof with its key and inputs, ready for aggregation
#[derive(Debug, Clone)]
pub struct BatchItem {
    vk: Arc<VerifyingKey>,
    proof: Proof,
    inputs: Vec<Fr>,
}

impl BatchItem {
    pub fn new(vk: Arc<VerifyingKey>, proof: Proof, inputs: Vec<Fr>) -> Result<Self, VerifyError> {
        if inputs.len() != vk.num_public_inputs() {
            return Err(VerifyError::BadInputs {
                expected: vk.num_public_inputs(),
                actual: inputs.len(),
            });
        }
        Ok(Self { vk, proof, inputs })
    }

    /// Decode a wire proof and 32-byte inputs against `vk`.
    pub fn from_bytes(
        vk: Arc<VerifyingKey>,
        proof_bytes: &[u8],
        inputs: &[Scalar],
    ) -> Result<Self, VerifyError> {
        if inputs.len() != vk.num_public_inputs() {
            return Err(VerifyError::BadInputs {
                expected: vk.num_public_inputs(),
                actual: inputs.len(),
            });
        }
        let proof = Proof::from_bytes(proof_bytes)?;
        let mut buf = [Fr::ZERO; crate::key::MAX_PUBLIC_INPUTS];
        let inputs = parse_public_inputs(inputs, &mut buf)?.to_vec();
        Ok(Self { vk, proof, inputs })
    }

    pub fn key(&self) -> &Arc<VerifyingKey> {
        &self.vk
    }

    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    pub fn inputs(&self) -> &[Fr] {
        &self.inputs
    }

    fn verify(&self) -> Result<bool, VerifyError> {
        verifier::verify(&self.vk, &self.proof, &self.inputs)
    }
}

/// Verify `items`, aggregating when there are at least `min_batch_size`.
///
/// All scratch comes from `arena`; running out is an error, never a silent
/// downgrade to sequential checking.
pub fn batch_verify(
    items: &[BatchItem],
    arena: &Arena,
    min_batch_size: usize,
) -> Result<Vec<bool>, VerifyError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    if items.len() < min_batch_size {
        log::debug!("batch of {} below aggregation threshold", items.len());
        return verify_each(items);
    }

    let aggregated = aggregate(items, arena).inspect_err(|e| {
        if matches!(e, VerifyError::AllocationFailed(_)) {
            log::warn!("batch of {} exhausted scratch arena: {}", items.len(), e);
        }
    })?;
    if aggregated {
        log::debug!("batch of {} accepted by combined check", items.len());
        return Ok(vec![true; items.len()]);
    }

    log::warn!(
        "combined check failed for batch of {}, verifying individually",
        items.len()
    );
    verify_each(items)
}

fn verify_each(items: &[BatchItem]) -> Result<Vec<bool>, VerifyError> {
    items.iter().map(BatchItem::verify).collect()
}

/// Fill `out` with independent, nonzero 128-bit scalars from the OS.
fn random_scalars(out: &mut [Fr]) -> Result<(), VerifyError> {
    let mut buf = [0u8; 32];
    for slot in out.iter_mut() {
        loop {
            OsRng
                .try_fill_bytes(&mut buf[16..])
                .map_err(|e| VerifyError::Randomness(e.to_string()))?;
            let r = Fr::from_bytes(&buf)?;
            if !r.is_zero() {
                *slot = r;
                break;
            }
        }
    }
    buf.zeroize();
    Ok(())
}

fn aggregate(items: &[BatchItem], arena: &Arena) -> Result<bool, VerifyError> {
    let n = items.len();
    let weights = arena.alloc_slice(n, Fr::ZERO)?;
    random_scalars(weights)?;

    // Group entries by key identity
    let order = arena.alloc_slice(n, 0usize)?;
    for (i, slot) in order.iter_mut().enumerate() {
        *slot = i;
    }
    order.sort_unstable_by_key(|&i| Arc::as_ptr(&items[i].vk) as usize);
    let same_key = |x: &usize, y: &usize| Arc::ptr_eq(&items[*x].vk, &items[*y].vk);
    let groups = order.chunk_by(same_key).count();

    let pairs = arena.alloc_slice(n + 3 * groups, (G1Affine::identity(), G2Affine::identity()))?;

    let scaled = arena.alloc_slice(n, G1Projective::identity())?;
    for ((s, item), r) in scaled.iter_mut().zip(items).zip(weights.iter()) {
        *s = item.proof.a.to_projective().mul(r).neg();
    }
    let scaled_affine = arena.alloc_slice(n, G1Affine::identity())?;
    G1Projective::batch_normalize(scaled, scaled_affine, arena)?;
    for ((pair, a), item) in pairs.iter_mut().zip(scaled_affine.iter()).zip(items) {
        *pair = (*a, item.proof.b);
    }

    let mut next = n;
    for group in order.chunk_by(same_key) {
        let vk = &items[group[0]].vk;
        let [alpha, vk_x, c] = aggregate_group(vk, group, items, weights, arena)?;
        pairs[next] = (alpha, vk.beta);
        pairs[next + 1] = (vk_x, vk.gamma);
        pairs[next + 2] = (c, vk.delta);
        next += 3;
    }
    log::trace!("batch: {} proofs in {} key groups", n, groups);

    let result = multi_pairing(pairs, arena)?.is_one();
    weights.iter_mut().for_each(Zeroize::zeroize);
    Ok(result)
}

/// Returns `[sum(r)*alpha, sum(r*vk_x), sum(r*C)]` for one key group.
fn aggregate_group(
    vk: &VerifyingKey,
    group: &[usize],
    items: &[BatchItem],
    weights: &[Fr],
    arena: &Arena,
) -> Result<[G1Affine; 3], VerifyError> {
    // coeffs[0] = sum(r_i), coeffs[j + 1] = sum(r_i * x_ij)
    let coeffs = arena.alloc_slice(vk.ic.len(), Fr::ZERO)?;
    let cs = arena.alloc_slice(group.len(), G1Affine::identity())?;
    let rs = arena.alloc_slice(group.len(), Fr::ZERO)?;

    for ((&i, c), r_out) in group.iter().zip(cs.iter_mut()).zip(rs.iter_mut()) {
        let r = weights[i];
        coeffs[0] += r;
        for (coeff, x) in coeffs[1..].iter_mut().zip(&items[i].inputs) {
            *coeff += r * *x;
        }
        *c = items[i].proof.c;
        *r_out = r;
    }

    // coefficients mix in public inputs, so these terms use the ladder
    let vk_x = vk
        .ic
        .iter()
        .zip(coeffs.iter())
        .fold(G1Projective::identity(), |acc, (p, k)| {
            acc.add(&p.to_projective().mul(k))
        });
    let c_sum = msm(cs, rs, arena)?;
    let alpha = vk.alpha.to_projective().mul(&coeffs[0]);
    Ok([alpha.to_affine(), vk_x.to_affine(), c_sum.to_affine()])
}

/// Batch over the thread's scratch arena, with statistics.
pub(crate) fn verify_items_recorded(
    items: &[BatchItem],
    config: &VerifierConfig,
) -> Result<Vec<bool>, VerifyError> {
    let capacity = config.scratch_capacity.max(scratch_hint(items.len()));
    let results = with_scratch(capacity, config.zero_on_restore, |arena| {
        batch_verify(items, arena, config.min_batch_size)
    })??;

    let stats = stats::global();
    stats.record_batch(items.len());
    for ok in &results {
        stats.record_outcome(*ok);
    }
    if let Some(peak) = scratch_peak() {
        stats.record_arena_peak(peak);
    }
    Ok(results)
}

/// Entry slot: index into the decoded items, or why decoding failed
type Slot = Result<usize, VerifyError>;

fn run_slots(
    items: &[BatchItem],
    slots: &[Slot],
    config: &VerifierConfig,
) -> Result<BatchResult, VerifyError> {
    let results = verify_items_recorded(items, config)?;
    let malformed = slots.iter().filter(|s| s.is_err()).count();
    for _ in 0..malformed {
        stats::global().record_outcome(false);
    }
    let outcomes = slots
        .iter()
        .map(|slot| match slot {
            Ok(i) => ProofOutcome::from(results[*i]),
            Err(e) => ProofOutcome::Malformed(e.clone()),
        })
        .collect();
    Ok(BatchResult { outcomes })
}

/// Decode and verify parallel arrays of wire proofs and inputs.
pub(crate) fn verify_wire(
    vk: &Arc<VerifyingKey>,
    proofs: &[&[u8]],
    inputs: &[Vec<Scalar>],
    config: &VerifierConfig,
) -> Result<BatchResult, VerifyError> {
    if proofs.len() != inputs.len() {
        return Err(BatchError::LengthMismatch {
            proofs: proofs.len(),
            inputs: inputs.len(),
        }
        .into());
    }
    let mut items = Vec::with_capacity(proofs.len());
    let slots: Vec<Slot> = proofs
        .iter()
        .zip(inputs)
        .map(|(proof, inputs)| {
            let item = BatchItem::from_bytes(Arc::clone(vk), proof, inputs)?;
            items.push(item);
            Ok(items.len() - 1)
        })
        .collect();
    run_slots(&items, &slots, config)
}

/// Reusable batch accumulator for one key
///
/// ```ignore
/// let mut batch = BatchVerifier::new(vk, 64)?;
/// batch.add(&proof_bytes, &inputs)?;
/// let result = batch.verify()?;
/// batch.reset();
/// ```
#[derive(Debug)]
pub struct BatchVerifier {
    vk: Arc<VerifyingKey>,
    config: VerifierConfig,
    capacity: usize,
    items: Vec<BatchItem>,
    slots: Vec<Slot>,
}

impl BatchVerifier {
    pub fn new(vk: Arc<VerifyingKey>, capacity: usize) -> Result<Self, VerifyError> {
        if capacity == 0 || capacity > MAX_BATCH_SIZE {
            return Err(BatchError::InvalidCapacity {
                capacity,
                max: MAX_BATCH_SIZE,
            }
            .into());
        }
        Ok(Self {
            vk,
            config: VerifierConfig::default(),
            capacity,
            items: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
        })
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Queue a proof and return its index.
    ///
    /// A malformed entry still takes its index (and is reported as
    /// `Malformed` by `verify`), but the decode error is returned here too.
    /// Only `BatchError::Full` leaves the batch unchanged.
    pub fn add(&mut self, proof_bytes: &[u8], inputs: &[Scalar]) -> Result<usize, VerifyError> {
        if self.is_full() {
            return Err(BatchError::Full {
                capacity: self.capacity,
            }
            .into());
        }
        let index = self.slots.len();
        match BatchItem::from_bytes(Arc::clone(&self.vk), proof_bytes, inputs) {
            Ok(item) => {
                self.items.push(item);
                self.slots.push(Ok(self.items.len() - 1));
                Ok(index)
            }
            Err(e) => {
                log::debug!("batch entry {} malformed: {}", index, e);
                self.slots.push(Err(e.clone()));
                Err(e)
            }
        }
    }

    pub fn verify(&self) -> Result<BatchResult, VerifyError> {
        run_slots(&self.items, &self.slots, &self.config)
    }

    /// Drop all queued entries, keeping the allocation.
    pub fn reset(&mut self) {
        self.items.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ArenaError, PointError};
    use crate::testing::Toy;

    fn items(toy: &Toy, vk: &Arc<VerifyingKey>, n: usize) -> Vec<BatchItem> {
        (0..n as u64)
            .map(|i| {
                let inputs = [50 + i, 1000 + i];
                let proof = toy.prove(&inputs, 3 + i, 5 + 2 * i);
                let inputs = inputs.iter().map(|v| Fr::from_u64(*v)).collect();
                BatchItem::new(Arc::clone(vk), proof, inputs).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_batch_all_valid() {
        let toy = Toy::new(2);
        let vk = Arc::new(toy.vk.clone());
        let batch = items(&toy, &vk, 6);
        let arena = Arena::new(scratch_hint(6)).unwrap();
        assert_eq!(batch_verify(&batch, &arena, 4).unwrap(), vec![true; 6]);
    }

    #[test]
    fn test_batch_isolates_tampered_index() {
        let toy = Toy::new(2);
        let vk = Arc::new(toy.vk.clone());
        let mut batch = items(&toy, &vk, 5);
        batch[3].inputs[0] += Fr::ONE;
        let arena = Arena::new(scratch_hint(5)).unwrap();
        assert_eq!(
            batch_verify(&batch, &arena, 4).unwrap(),
            vec![true, true, true, false, true]
        );
    }

    #[test]
    fn test_batch_small_is_sequential() {
        let toy = Toy::new(2);
        let vk = Arc::new(toy.vk.clone());
        let mut batch = items(&toy, &vk, 3);
        batch[0].inputs[1] += Fr::ONE;
        // A one-page arena is never touched below the threshold
        let arena = Arena::new(1).unwrap();
        assert_eq!(
            batch_verify(&batch, &arena, 4).unwrap(),
            vec![false, true, true]
        );
        assert_eq!(arena.peak(), 0);
    }

    #[test]
    fn test_batch_mixed_keys() {
        let toy_a = Toy::new(2);
        let toy_b = Toy::with_trapdoor(2, 17, 19);
        let vk_a = Arc::new(toy_a.vk.clone());
        let vk_b = Arc::new(toy_b.vk.clone());
        let mut batch = items(&toy_a, &vk_a, 3);
        batch.extend(items(&toy_b, &vk_b, 3));
        batch.swap(1, 4);
        let arena = Arena::new(scratch_hint(6)).unwrap();
        assert_eq!(batch_verify(&batch, &arena, 2).unwrap(), vec![true; 6]);
    }

    #[test]
    fn test_batch_arena_exhaustion() {
        let toy = Toy::new(2);
        let vk = Arc::new(toy.vk.clone());
        let batch = items(&toy, &vk, 64);
        let arena = Arena::new(4096).unwrap();
        assert!(matches!(
            batch_verify(&batch, &arena, 4),
            Err(VerifyError::AllocationFailed(ArenaError::Exhausted { .. }))
        ));
    }

    #[test]
    fn test_random_scalars_nonzero_and_distinct() {
        let mut out = [Fr::ZERO; 8];
        random_scalars(&mut out).unwrap();
        for (i, a) in out.iter().enumerate() {
            assert!(!a.is_zero());
            assert!(a.to_bytes()[..16].iter().all(|b| *b == 0));
            for b in &out[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_batch_verifier_lifecycle() {
        let toy = Toy::new(2);
        let vk = Arc::new(toy.vk.clone());
        let mut batch = BatchVerifier::new(Arc::clone(&vk), 4)
            .unwrap()
            .with_config(VerifierConfig::new().min_batch_size(2));

        let good = toy.prove(&[80, 7], 4, 6).to_bytes();
        let inputs = [Fr::from_u64(80).to_bytes(), Fr::from_u64(7).to_bytes()];
        assert_eq!(batch.add(&good, &inputs).unwrap(), 0);
        assert!(matches!(
            batch.add(&good[..100], &inputs),
            Err(VerifyError::Proof(_))
        ));
        let mut off_curve = good;
        off_curve[63] ^= 1;
        assert_eq!(
            batch.add(&off_curve, &inputs),
            Err(VerifyError::InvalidPoint(PointError::NotOnCurve))
        );
        let wrong = [Fr::from_u64(81).to_bytes(), inputs[1]];
        assert_eq!(batch.add(&good, &wrong).unwrap(), 3);
        assert!(batch.is_full());
        assert!(matches!(
            batch.add(&good, &inputs),
            Err(VerifyError::Batch(BatchError::Full { capacity: 4 }))
        ));

        let result = batch.verify().unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result.outcomes[0], ProofOutcome::Valid);
        assert!(matches!(result.outcomes[1], ProofOutcome::Malformed(_)));
        assert_eq!(
            result.outcomes[2],
            ProofOutcome::Malformed(VerifyError::InvalidPoint(PointError::NotOnCurve))
        );
        assert_eq!(result.outcomes[3], ProofOutcome::Rejected);
        assert_eq!(result.failed_indices(), vec![1, 2, 3]);
        assert_eq!(result.valid_count(), 1);

        batch.reset();
        assert!(batch.is_empty());
        batch.add(&good, &inputs).unwrap();
        assert!(batch.verify().unwrap().all_valid());
    }

    #[test]
    fn test_batch_verifier_capacity_limits() {
        let vk = Arc::new(Toy::new(1).vk);
        assert!(matches!(
            BatchVerifier::new(Arc::clone(&vk), 0),
            Err(VerifyError::Batch(BatchError::InvalidCapacity { .. }))
        ));
        assert!(matches!(
            BatchVerifier::new(Arc::clone(&vk), MAX_BATCH_SIZE + 1),
            Err(VerifyError::Batch(BatchError::InvalidCapacity { .. }))
        ));
        assert!(BatchVerifier::new(vk, MAX_BATCH_SIZE).is_ok());
    }

    #[test]
    fn test_verify_wire_length_mismatch() {
        let vk = Arc::new(Toy::new(1).vk);
        let result = verify_wire(&vk, &[&[0u8; 256]], &[], &VerifierConfig::default());
        assert_eq!(
            result,
            Err(VerifyError::Batch(BatchError::LengthMismatch {
                proofs: 1,
                inputs: 0
            }))
        );
    }
}
