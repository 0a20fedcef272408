//! Reputation proofs: commitments, envelopes and policy checks
//!
//! An agent proves `score >= threshold` for a committed score without
//! revealing it. The circuit's public inputs are `[threshold, commitment]`
//! where `commitment = Poseidon(score, secret)`.
//!
//! ## Envelope Format (328 bytes, packed, big-endian)
//! - [0]: kind (0 = reputation, 1 = payment, 2 = inference)
//! - [1]: version (1)
//! - [2..4]: threshold (u16)
//! - [4..8]: timestamp, unix seconds (u32)
//! - [8..40]: agent id
//! - [40..72]: commitment
//! - [72..328]: Groth16 proof

use core::fmt;
use std::sync::Arc;

use crate::errors::{FieldError, ProofError, VerifyError};
use crate::field::Fr;
use crate::key::VerifyingKey;
use crate::poseidon::poseidon_hash;
use crate::proof::PROOF_SIZE;
use crate::tier::check_score;
use crate::types::Scalar;
use crate::verifier::verify_recorded;

pub const ENVELOPE_SIZE: usize = 8 + 32 + 32 + PROOF_SIZE; // 328 bytes
pub const ENVELOPE_VERSION: u8 = 1;

/// Deepest exclusion path accepted
pub const MAX_SMT_DEPTH: usize = 256;
/// Bytes per exclusion path level: direction + sibling
pub const SMT_NODE_SIZE: usize = 33;

/// `Poseidon(score, secret)`.
///
/// `score` must be at most 100 and `secret` a canonical scalar.
pub fn poseidon_commit(score: u16, secret: &Scalar) -> Result<Scalar, FieldError> {
    let score = check_score(score)?;
    let secret = Fr::from_bytes(secret)?;
    Ok(poseidon_hash([Fr::from_u64(score as u64), secret]).to_bytes())
}

/// One-time tag `Poseidon(agent_id, nonce)`.
///
/// Agent ids are arbitrary 32-byte keys, so they are reduced mod r.
pub fn compute_nullifier(agent_id: &[u8; 32], nonce: u64) -> Scalar {
    let id = Fr::from_be_bytes_mod_order(agent_id);
    poseidon_hash([id, Fr::from_u64(nonce)]).to_bytes()
}

fn ct_eq_bytes(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn path_depth(path: &[u8]) -> Result<usize, VerifyError> {
    if path.len() % SMT_NODE_SIZE != 0 || path.len() / SMT_NODE_SIZE > MAX_SMT_DEPTH {
        return Err(ProofError::InvalidExclusionPath(path.len()).into());
    }
    Ok(path.len() / SMT_NODE_SIZE)
}

/// Fold `leaf` up a sparse Merkle path and compare with `root`.
///
/// Each level is a direction byte followed by the sibling: direction 0
/// hashes `(current, sibling)`, direction 1 hashes `(sibling, current)`.
/// The root comparison is constant time.
pub fn verify_exclusion_proof(
    root: &Scalar,
    leaf: &Scalar,
    path: &[u8],
) -> Result<bool, VerifyError> {
    path_depth(path)?;
    let mut current = Fr::from_bytes(leaf)?;
    for node in path.chunks_exact(SMT_NODE_SIZE) {
        let mut sibling = [0u8; 32];
        sibling.copy_from_slice(&node[1..]);
        let sibling = Fr::from_bytes(&sibling)?;
        current = match node[0] {
            0 => poseidon_hash([current, sibling]),
            1 => poseidon_hash([sibling, current]),
            _ => return Err(ProofError::InvalidExclusionPath(path.len()).into()),
        };
    }
    Ok(ct_eq_bytes(&current.to_bytes(), root))
}

/// True if `path` proves the agent's slot in the blacklist tree is empty.
///
/// The slot is addressed by the agent id's low bits: level `i` must turn
/// in the direction of bit `i`, and the leaf is zero.
pub fn verify_not_blacklisted(
    root: &Scalar,
    agent_id: &[u8; 32],
    path: &[u8],
) -> Result<bool, VerifyError> {
    path_depth(path)?;
    let mut bound = true;
    for (level, node) in path.chunks_exact(SMT_NODE_SIZE).enumerate() {
        let bit = (agent_id[31 - level / 8] >> (level % 8)) & 1;
        bound &= node[0] == bit;
    }
    let included = verify_exclusion_proof(root, &[0u8; 32], path)?;
    Ok(bound & included)
}

/// Statement type carried by an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProofKind {
    Reputation = 0,
    Payment = 1,
    Inference = 2,
}

impl TryFrom<u8> for ProofKind {
    type Error = ProofError;

    fn try_from(value: u8) -> Result<Self, ProofError> {
        match value {
            0 => Ok(ProofKind::Reputation),
            1 => Ok(ProofKind::Payment),
            2 => Ok(ProofKind::Inference),
            other => Err(ProofError::UnknownKind(other)),
        }
    }
}

/// Decoded reputation envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: ProofKind,
    pub threshold: u16,
    pub timestamp: u32,
    pub agent_id: [u8; 32],
    pub commitment: Scalar,
    pub proof: [u8; PROOF_SIZE],
}

impl Envelope {
    pub fn new(
        threshold: u16,
        timestamp: u32,
        agent_id: [u8; 32],
        commitment: Scalar,
        proof: [u8; PROOF_SIZE],
    ) -> Result<Self, VerifyError> {
        check_score(threshold)?;
        Ok(Self {
            kind: ProofKind::Reputation,
            threshold,
            timestamp,
            agent_id,
            commitment,
            proof,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        if bytes.len() != ENVELOPE_SIZE {
            return Err(ProofError::InvalidSize {
                expected: ENVELOPE_SIZE,
                actual: bytes.len(),
            }
            .into());
        }
        let kind = ProofKind::try_from(bytes[0])?;
        if bytes[1] != ENVELOPE_VERSION {
            return Err(ProofError::UnsupportedVersion(bytes[1]).into());
        }
        let threshold = check_score(u16::from_be_bytes([bytes[2], bytes[3]]))?;
        let timestamp = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        let mut agent_id = [0u8; 32];
        agent_id.copy_from_slice(&bytes[8..40]);
        let mut commitment = [0u8; 32];
        commitment.copy_from_slice(&bytes[40..72]);
        let mut proof = [0u8; PROOF_SIZE];
        proof.copy_from_slice(&bytes[72..ENVELOPE_SIZE]);

        Ok(Self {
            kind,
            threshold,
            timestamp,
            agent_id,
            commitment,
            proof,
        })
    }

    pub fn to_bytes(&self) -> [u8; ENVELOPE_SIZE] {
        let mut out = [0u8; ENVELOPE_SIZE];
        out[0] = self.kind as u8;
        out[1] = ENVELOPE_VERSION;
        out[2..4].copy_from_slice(&self.threshold.to_be_bytes());
        out[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..40].copy_from_slice(&self.agent_id);
        out[40..72].copy_from_slice(&self.commitment);
        out[72..].copy_from_slice(&self.proof);
        out
    }

    /// Circuit public inputs `[threshold, commitment]`
    pub fn public_inputs(&self) -> [Scalar; 2] {
        [
            Fr::from_u64(self.threshold as u64).to_bytes(),
            self.commitment,
        ]
    }
}

/// Verifier-side policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyConfig {
    /// Maximum proof age in seconds, 0 for no limit
    pub max_proof_age: u32,
    /// Floor applied to every request
    pub min_threshold: u16,
    /// Blacklist tree root; when set every request needs an exclusion path
    pub blacklist_root: Option<Scalar>,
}

/// What the relying party asks for
#[derive(Debug, Clone, Copy)]
pub struct ReputationRequest<'a> {
    pub expected_commitment: Scalar,
    pub threshold: u16,
    /// Current unix time in seconds
    pub now: u64,
    /// Blacklist exclusion path for the envelope's agent
    pub exclusion_path: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WrongKind(ProofKind),
    CommitmentMismatch,
    BelowThreshold { proven: u16, required: u16 },
    Expired { timestamp: u32, now: u64 },
    Blacklisted,
    ProofRejected,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WrongKind(kind) => write!(f, "not a reputation proof ({:?})", kind),
            RejectReason::CommitmentMismatch => f.write_str("commitment mismatch"),
            RejectReason::BelowThreshold { proven, required } => {
                write!(f, "threshold {} below required {}", proven, required)
            }
            RejectReason::Expired { timestamp, now } => {
                write!(f, "proof from {} expired at {}", timestamp, now)
            }
            RejectReason::Blacklisted => f.write_str("agent is blacklisted"),
            RejectReason::ProofRejected => f.write_str("proof rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Groth16 key plus policy
#[derive(Debug, Clone)]
pub struct ReputationVerifier {
    vk: Arc<VerifyingKey>,
    policy: PolicyConfig,
}

impl ReputationVerifier {
    pub fn new(vk: Arc<VerifyingKey>, policy: PolicyConfig) -> Result<Self, VerifyError> {
        check_score(policy.min_threshold)?;
        if vk.num_public_inputs() != crate::key::REPUTATION_PUBLIC_INPUTS {
            return Err(VerifyError::BadInputs {
                expected: crate::key::REPUTATION_PUBLIC_INPUTS,
                actual: vk.num_public_inputs(),
            });
        }
        Ok(Self { vk, policy })
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Run the policy checks, cheapest first, then the pairing check.
    ///
    /// Errors are reserved for malformed input; a well-formed proof that
    /// fails any check yields `Verdict::Rejected`.
    pub fn verify(
        &self,
        envelope: &Envelope,
        request: &ReputationRequest<'_>,
    ) -> Result<Verdict, VerifyError> {
        check_score(envelope.threshold)?;
        check_score(request.threshold)?;

        if envelope.kind != ProofKind::Reputation {
            return Ok(reject(RejectReason::WrongKind(envelope.kind)));
        }
        if !ct_eq_bytes(&envelope.commitment, &request.expected_commitment) {
            return Ok(reject(RejectReason::CommitmentMismatch));
        }
        if envelope.threshold < request.threshold {
            return Ok(reject(RejectReason::BelowThreshold {
                proven: envelope.threshold,
                required: request.threshold,
            }));
        }
        if envelope.threshold < self.policy.min_threshold {
            return Ok(reject(RejectReason::BelowThreshold {
                proven: envelope.threshold,
                required: self.policy.min_threshold,
            }));
        }
        if self.policy.max_proof_age != 0
            && envelope.timestamp as u64 + (self.policy.max_proof_age as u64) < request.now
        {
            return Ok(reject(RejectReason::Expired {
                timestamp: envelope.timestamp,
                now: request.now,
            }));
        }
        if let Some(root) = &self.policy.blacklist_root {
            let clear = match request.exclusion_path {
                Some(path) => verify_not_blacklisted(root, &envelope.agent_id, path)?,
                None => false,
            };
            if !clear {
                return Ok(reject(RejectReason::Blacklisted));
            }
        }

        if verify_recorded(&self.vk, &envelope.proof, &envelope.public_inputs())? {
            log::debug!("reputation proof accepted (threshold {})", envelope.threshold);
            Ok(Verdict::Accepted)
        } else {
            Ok(reject(RejectReason::ProofRejected))
        }
    }
}

fn reject(reason: RejectReason) -> Verdict {
    log::debug!("reputation proof rejected: {}", reason);
    Verdict::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Toy;
    use hex_literal::hex;
    use proptest::prelude::*;

    const SECRET: Scalar = hex!("00000000000000000000000000005ec7e70000000000000000000000005ec7e7");
    const COMMITMENT: Scalar =
        hex!("1ae27ef57bc3c64fb13eeefec50b903691bf71f6bc0b5cabd076cd4bbe1ed92f");

    #[test]
    fn test_commit_matches_circuit_vector() {
        assert_eq!(poseidon_commit(85, &SECRET).unwrap(), COMMITMENT);
    }

    #[test]
    fn test_commit_deterministic_and_hiding() {
        let a = poseidon_commit(85, &SECRET).unwrap();
        assert_eq!(a, poseidon_commit(85, &SECRET).unwrap());
        assert_ne!(a, poseidon_commit(86, &SECRET).unwrap());
        let mut other = SECRET;
        other[31] ^= 1;
        assert_ne!(a, poseidon_commit(85, &other).unwrap());
    }

    fn canonical(bytes: [u8; 32]) -> Scalar {
        Fr::from_be_bytes_mod_order(&bytes).to_bytes()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_commit_hides_secret(
            score in 0u16..=100,
            a in any::<[u8; 32]>(),
            b in any::<[u8; 32]>(),
        ) {
            let (s1, s2) = (canonical(a), canonical(b));
            prop_assume!(s1 != s2);
            prop_assert_ne!(
                poseidon_commit(score, &s1).unwrap(),
                poseidon_commit(score, &s2).unwrap()
            );
        }

        #[test]
        fn prop_commit_binds_score(
            s1 in 0u16..=100,
            s2 in 0u16..=100,
            secret in any::<[u8; 32]>(),
        ) {
            prop_assume!(s1 != s2);
            let secret = canonical(secret);
            prop_assert_ne!(
                poseidon_commit(s1, &secret).unwrap(),
                poseidon_commit(s2, &secret).unwrap()
            );
        }
    }

    #[test]
    fn test_commit_range() {
        assert_eq!(
            poseidon_commit(101, &SECRET),
            Err(FieldError::ScoreOutOfRange(101))
        );
        assert_eq!(
            poseidon_commit(50, &crate::types::FR_MODULUS),
            Err(FieldError::NotCanonical)
        );
        assert!(poseidon_commit(100, &SECRET).is_ok());
    }

    #[test]
    fn test_nullifier() {
        let id = [7u8; 32];
        let n1 = compute_nullifier(&id, 1);
        assert_eq!(n1, compute_nullifier(&id, 1));
        assert_ne!(n1, compute_nullifier(&id, 2));
        assert_eq!(
            compute_nullifier(&[0u8; 32], 0),
            poseidon_hash([Fr::ZERO, Fr::ZERO]).to_bytes()
        );
    }

    fn build_path(leaf: Fr, siblings: &[(u8, u64)]) -> (Scalar, Vec<u8>) {
        let mut current = leaf;
        let mut path = Vec::new();
        for (dir, s) in siblings {
            let sib = Fr::from_u64(*s);
            path.push(*dir);
            path.extend_from_slice(&sib.to_bytes());
            current = if *dir == 0 {
                poseidon_hash([current, sib])
            } else {
                poseidon_hash([sib, current])
            };
        }
        (current.to_bytes(), path)
    }

    #[test]
    fn test_exclusion_proof() {
        let leaf = Fr::from_u64(42);
        let (root, path) = build_path(leaf, &[(0, 1), (1, 2), (1, 3)]);
        assert!(verify_exclusion_proof(&root, &leaf.to_bytes(), &path).unwrap());

        let mut flipped = path.clone();
        flipped[33] = 0;
        assert!(!verify_exclusion_proof(&root, &leaf.to_bytes(), &flipped).unwrap());
        assert!(!verify_exclusion_proof(&root, &Fr::from_u64(43).to_bytes(), &path).unwrap());

        // empty path: the leaf is the root
        assert!(verify_exclusion_proof(&leaf.to_bytes(), &leaf.to_bytes(), &[]).unwrap());
    }

    #[test]
    fn test_exclusion_path_shape() {
        let root = [0u8; 32];
        assert_eq!(
            verify_exclusion_proof(&root, &root, &[0u8; 34]),
            Err(VerifyError::Proof(ProofError::InvalidExclusionPath(34)))
        );
        let too_deep = vec![0u8; 257 * 33];
        assert!(verify_exclusion_proof(&root, &root, &too_deep).is_err());
        let mut bad_dir = vec![0u8; 33];
        bad_dir[0] = 2;
        assert!(verify_exclusion_proof(&root, &root, &bad_dir).is_err());
    }

    #[test]
    fn test_not_blacklisted_binds_agent_bits() {
        let mut agent = [0u8; 32];
        agent[31] = 0b10;
        let (root, path) = build_path(Fr::ZERO, &[(0, 5), (1, 6)]);
        assert!(verify_not_blacklisted(&root, &agent, &path).unwrap());
        agent[31] = 0b01;
        assert!(!verify_not_blacklisted(&root, &agent, &path).unwrap());
    }

    #[test]
    fn test_envelope_layout() {
        let env = Envelope::new(75, 0x01020304, [0xaa; 32], COMMITMENT, [0x11; 256]).unwrap();
        let bytes = env.to_bytes();
        assert_eq!(bytes.len(), 328);
        assert_eq!(&bytes[..8], &[0, 1, 0, 75, 1, 2, 3, 4]);
        assert_eq!(Envelope::from_bytes(&bytes).unwrap(), env);
    }

    #[test]
    fn test_envelope_rejects_bad_header() {
        let mut bytes = Envelope::new(75, 0, [0; 32], COMMITMENT, [0; 256])
            .unwrap()
            .to_bytes();
        bytes[1] = 2;
        assert_eq!(
            Envelope::from_bytes(&bytes),
            Err(VerifyError::Proof(ProofError::UnsupportedVersion(2)))
        );
        bytes[1] = 1;
        bytes[0] = 9;
        assert_eq!(
            Envelope::from_bytes(&bytes),
            Err(VerifyError::Proof(ProofError::UnknownKind(9)))
        );
        bytes[0] = 0;
        bytes[2..4].copy_from_slice(&101u16.to_be_bytes());
        assert_eq!(
            Envelope::from_bytes(&bytes),
            Err(VerifyError::OutOfRange(FieldError::ScoreOutOfRange(101)))
        );
        assert!(matches!(
            Envelope::from_bytes(&bytes[..300]),
            Err(VerifyError::Proof(ProofError::InvalidSize { .. }))
        ));
    }

    struct Setup {
        verifier: ReputationVerifier,
        envelope: Envelope,
        commitment: Scalar,
    }

    fn setup(policy: PolicyConfig, agent_id: [u8; 32]) -> Setup {
        let toy = Toy::new(2);
        let commitment = Fr::from_u64(4242);
        let proof = toy.prove(&[75, 4242], 9, 10);
        let envelope = Envelope::new(
            75,
            1_000,
            agent_id,
            commitment.to_bytes(),
            proof.to_bytes(),
        )
        .unwrap();
        Setup {
            verifier: ReputationVerifier::new(Arc::new(toy.vk), policy).unwrap(),
            envelope,
            commitment: commitment.to_bytes(),
        }
    }

    fn request(commitment: Scalar, threshold: u16, now: u64) -> ReputationRequest<'static> {
        ReputationRequest {
            expected_commitment: commitment,
            threshold,
            now,
            exclusion_path: None,
        }
    }

    #[test]
    fn test_policy_accepts() {
        let s = setup(PolicyConfig::default(), [1; 32]);
        let verdict = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 50, 10_000_000))
            .unwrap();
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn test_policy_check_order() {
        let policy = PolicyConfig {
            max_proof_age: 60,
            min_threshold: 80,
            blacklist_root: None,
        };
        let s = setup(policy, [1; 32]);

        // wrong commitment wins over everything else
        let v = s
            .verifier
            .verify(&s.envelope, &request([0; 32], 90, 5_000))
            .unwrap();
        assert_eq!(v, Verdict::Rejected(RejectReason::CommitmentMismatch));

        let v = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 90, 5_000))
            .unwrap();
        assert_eq!(
            v,
            Verdict::Rejected(RejectReason::BelowThreshold {
                proven: 75,
                required: 90
            })
        );

        let v = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 70, 5_000))
            .unwrap();
        assert_eq!(
            v,
            Verdict::Rejected(RejectReason::BelowThreshold {
                proven: 75,
                required: 80
            })
        );
    }

    #[test]
    fn test_policy_expiry() {
        let policy = PolicyConfig {
            max_proof_age: 60,
            ..PolicyConfig::default()
        };
        let s = setup(policy, [1; 32]);
        let at_limit = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 50, 1_060))
            .unwrap();
        assert!(at_limit.is_accepted());
        let late = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 50, 1_061))
            .unwrap();
        assert_eq!(
            late,
            Verdict::Rejected(RejectReason::Expired {
                timestamp: 1_000,
                now: 1_061
            })
        );
    }

    #[test]
    fn test_policy_blacklist() {
        let agent = [0u8; 32];
        let (root, path) = build_path(Fr::ZERO, &[(0, 5), (0, 6)]);
        let policy = PolicyConfig {
            blacklist_root: Some(root),
            ..PolicyConfig::default()
        };
        let s = setup(policy, agent);

        let missing = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 50, 0))
            .unwrap();
        assert_eq!(missing, Verdict::Rejected(RejectReason::Blacklisted));

        let req = ReputationRequest {
            exclusion_path: Some(&path),
            ..request(s.commitment, 50, 0)
        };
        assert!(s.verifier.verify(&s.envelope, &req).unwrap().is_accepted());
    }

    #[test]
    fn test_policy_proof_rejected() {
        let mut s = setup(PolicyConfig::default(), [1; 32]);
        // claim a higher threshold than the proof was made for
        s.envelope.threshold = 76;
        let v = s
            .verifier
            .verify(&s.envelope, &request(s.commitment, 50, 0))
            .unwrap();
        assert_eq!(v, Verdict::Rejected(RejectReason::ProofRejected));
    }

    #[test]
    fn test_policy_range_errors() {
        let s = setup(PolicyConfig::default(), [1; 32]);
        assert_eq!(
            s.verifier
                .verify(&s.envelope, &request(s.commitment, 101, 0)),
            Err(VerifyError::OutOfRange(FieldError::ScoreOutOfRange(101)))
        );
        let bad_policy = PolicyConfig {
            min_threshold: 200,
            ..PolicyConfig::default()
        };
        assert!(ReputationVerifier::new(Arc::new(Toy::new(2).vk), bad_policy).is_err());
        assert!(matches!(
            ReputationVerifier::new(Arc::new(Toy::new(3).vk), PolicyConfig::default()),
            Err(VerifyError::BadInputs { .. })
        ));
    }
}
