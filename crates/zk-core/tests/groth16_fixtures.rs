//! End-to-end verification against externally generated proofs
//!
//! Fixtures: one verifying key for the reputation circuit (public inputs
//! `[threshold, commitment]`) and six proofs for these cases:
//!
//! | # | score | threshold |
//! |---|-------|-----------|
//! | 0 | 85    | 75        |
//! | 1 | 92    | 90        |
//! | 2 | 60    | 50        |
//! | 3 | 77    | 75        |
//! | 4 | 100   | 90        |
//! | 5 | 51    | 50        |

use std::sync::Arc;

use hex_literal::hex;
use reputation_zk_core::{
    api, batch, poseidon_commit, Arena, BatchItem, KeyError, PointError, Proof, ProofError,
    ProofOutcome, Scalar, Verifier, VerifierConfig, VerifyError, VerifyingKey,
};

const VK_HEX: &str = include_str!("fixtures/vk.hex");
const PROOFS_HEX: &str = include_str!("fixtures/proofs.hex");
const INPUTS_HEX: &str = include_str!("fixtures/public_inputs.hex");

const SECRET_0: Scalar = hex!("00000000000000000000000000005ec7e70000000000000000000000005ec7e7");

/// On the twist but outside the order-r subgroup: x = 2 + u
const G2_NON_SUBGROUP: [u8; 128] = hex!(
    "0000000000000000000000000000000000000000000000000000000000000001"
    "0000000000000000000000000000000000000000000000000000000000000002"
    "2b76c179599bb92a963dac85546a005a777f7c13f6a7b75d5918b6b5808f5fde"
    "101f7278419308b95099eca02dcee0c5381f4d26d1d62313f057167f064101ce"
);

fn vk_bytes() -> Vec<u8> {
    hex::decode(VK_HEX.trim()).unwrap()
}

fn proofs() -> Vec<Vec<u8>> {
    PROOFS_HEX
        .lines()
        .map(|l| hex::decode(l.trim()).unwrap())
        .collect()
}

fn inputs() -> Vec<Vec<Scalar>> {
    INPUTS_HEX
        .lines()
        .map(|l| {
            hex::decode(l.trim())
                .unwrap()
                .chunks_exact(32)
                .map(|c| c.try_into().unwrap())
                .collect()
        })
        .collect()
}

fn engine() -> Verifier {
    let engine = Verifier::new(VerifierConfig::default());
    engine.load_key(&vk_bytes()).unwrap();
    engine
}

#[test]
fn test_fixture_shapes() {
    assert_eq!(vk_bytes().len(), 452 + 3 * 64);
    assert_eq!(proofs().len(), 6);
    assert!(proofs().iter().all(|p| p.len() == 256));
    assert!(inputs().iter().all(|i| i.len() == 2));
}

#[test]
fn test_commitment_matches_fixture() {
    let commitment = poseidon_commit(85, &SECRET_0).unwrap();
    assert_eq!(commitment, inputs()[0][1]);
}

#[test]
fn test_valid_proof_verifies() {
    let engine = engine();
    let (proofs, inputs) = (proofs(), inputs());
    assert!(engine.verify(&proofs[0], &inputs[0]).unwrap());
}

#[test]
fn test_all_fixture_proofs_verify() {
    let vk = VerifyingKey::from_bytes(&vk_bytes()).unwrap();
    for (i, (proof, inputs)) in proofs().iter().zip(inputs()).enumerate() {
        assert!(
            reputation_zk_core::verifier::verify_bytes(&vk, proof, &inputs).unwrap(),
            "proof {} rejected",
            i
        );
    }
}

#[test]
fn test_every_byte_flip_rejected() {
    let engine = engine();
    let proof = proofs()[0].clone();
    let inputs = inputs()[0].clone();
    for i in 0..proof.len() {
        let mut tampered = proof.clone();
        tampered[i] ^= 0x01;
        match engine.verify(&tampered, &inputs) {
            Ok(accepted) => assert!(!accepted, "flip at byte {} accepted", i),
            Err(e) => assert!(
                matches!(e, VerifyError::InvalidPoint(_)),
                "flip at byte {}: unexpected error {:?}",
                i,
                e
            ),
        }
    }
}

#[test]
fn test_wrong_public_input_rejected() {
    let engine = engine();
    let proof = &proofs()[0];
    let mut inputs = inputs()[0].clone();
    // claim threshold 76 instead of 75
    inputs[0][31] = 76;
    assert!(!engine.verify(proof, &inputs).unwrap());
    // proof 1's inputs with proof 0
    assert!(!engine.verify(proof, &self::inputs()[1]).unwrap());
}

#[test]
fn test_input_count_mismatch() {
    let engine = engine();
    let proof = &proofs()[0];
    let inputs = &inputs()[0];
    assert_eq!(
        engine.verify(proof, &inputs[..1]),
        Err(VerifyError::BadInputs {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn test_truncated_ic_clears_key() {
    let engine = engine();
    let bytes = vk_bytes();
    assert_eq!(engine.ic_len(), 3);

    let result = engine.load_key(&bytes[..bytes.len() - 64]);
    assert!(matches!(
        result,
        Err(VerifyError::KeyLoadFailed(KeyError::InvalidSize {
            expected: 644,
            actual: 580
        }))
    ));
    assert_eq!(engine.ic_len(), 0);
    assert_eq!(
        engine.verify(&proofs()[0], &inputs()[0]),
        Err(VerifyError::VkNotInitialized)
    );

    assert_eq!(engine.load_key(&bytes).unwrap(), 3);
    assert!(engine.verify(&proofs()[0], &inputs()[0]).unwrap());
}

#[test]
fn test_corrupt_key_point_clears_key() {
    let engine = engine();
    let mut bytes = vk_bytes();
    // replace delta with a point outside the subgroup
    bytes[320..448].copy_from_slice(&G2_NON_SUBGROUP);
    assert!(matches!(
        engine.load_key(&bytes),
        Err(VerifyError::KeyLoadFailed(KeyError::InvalidPoint {
            field: "delta",
            source: PointError::NotInSubgroup
        }))
    ));
    assert_eq!(engine.ic_len(), 0);
}

#[test]
fn test_non_subgroup_g2_in_proof_rejected() {
    let engine = engine();
    let mut proof = proofs()[0].clone();
    proof[64..192].copy_from_slice(&G2_NON_SUBGROUP);
    assert_eq!(
        engine.verify(&proof, &inputs()[0]),
        Err(VerifyError::InvalidPoint(PointError::NotInSubgroup))
    );
    assert!(!reputation_zk_core::ops::g2_is_in_subgroup(&G2_NON_SUBGROUP));
}

#[test]
fn test_identity_proof_point_rejected() {
    let engine = engine();
    let mut proof = proofs()[0].clone();
    proof[0..64].fill(0);
    assert_eq!(
        engine.verify(&proof, &inputs()[0]),
        Err(VerifyError::InvalidPoint(PointError::Identity))
    );
    assert!(matches!(
        engine.verify(&proof[..255], &inputs()[0]),
        Err(VerifyError::Proof(ProofError::InvalidSize { .. }))
    ));
}

#[test]
fn test_batch_isolates_tampered_proof() {
    let engine = engine();
    let mut proofs = proofs();
    let inputs = inputs();
    // swap C of proof 4 for C of proof 5: still valid points, wrong proof
    let c5 = proofs[5][192..].to_vec();
    proofs[4][192..].copy_from_slice(&c5);

    let refs: Vec<&[u8]> = proofs.iter().map(|p| p.as_slice()).collect();
    let result = engine.batch_verify(&refs, &inputs).unwrap();
    assert_eq!(result.len(), 6);
    assert_eq!(result.failed_indices(), vec![4]);
    assert_eq!(result.outcomes[4], ProofOutcome::Rejected);
}

#[test]
fn test_batch_all_valid_single_arena() {
    let vk = Arc::new(VerifyingKey::from_bytes(&vk_bytes()).unwrap());
    let items: Vec<BatchItem> = proofs()
        .iter()
        .zip(inputs())
        .map(|(p, i)| BatchItem::from_bytes(Arc::clone(&vk), p, &i).unwrap())
        .collect();
    let arena = Arena::new(batch::scratch_hint(items.len())).unwrap();
    assert_eq!(
        batch::batch_verify(&items, &arena, 4).unwrap(),
        vec![true; 6]
    );
    assert!(arena.peak() > 0);
}

#[test]
fn test_batch_reports_malformed_entries() {
    let engine = engine();
    let proofs = proofs();
    let inputs = inputs();
    let mut refs: Vec<&[u8]> = proofs.iter().map(|p| p.as_slice()).collect();
    refs[1] = &proofs[1][..200];
    let result = engine.batch_verify(&refs, &inputs).unwrap();
    assert!(matches!(result.outcomes[1], ProofOutcome::Malformed(_)));
    assert_eq!(result.valid_count(), 5);
}

#[test]
fn test_decoded_proof_roundtrip() {
    let bytes = proofs()[2].clone();
    let proof = Proof::from_bytes(&bytes).unwrap();
    assert_eq!(proof.to_bytes().to_vec(), bytes);
}

#[test]
fn test_api_end_to_end() {
    api::init().unwrap();
    let handle = api::vk_load(&vk_bytes()).unwrap();
    assert!(api::verify(&handle, &proofs()[3], &inputs()[3]).unwrap());
    assert_eq!(
        api::tier_for_threshold(75).unwrap(),
        reputation_zk_core::Tier::Gold
    );
}
