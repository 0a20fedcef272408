//! Groth16 verifying key parsing
//!
//! ## VK Format (big-endian, 452 + 64 * ic_count bytes)
//! - [0..64]: alpha (G1)
//! - [64..192]: beta (G2)
//! - [192..320]: gamma (G2)
//! - [320..448]: delta (G2)
//! - [448..452]: ic_count as u32
//! - [452..]: ic_count G1 points, IC[0] first
//!
//! Every point is range, curve and subgroup checked. Parsing is
//! all-or-nothing: either every point is valid or no key is produced.

use crate::curve::{G1Affine, G2Affine};
use crate::errors::{KeyError, PointError};
use crate::types::{G1_SIZE, G2_SIZE};

/// Fixed part of the encoding: alpha, beta, gamma, delta and the count
pub const VK_HEADER_SIZE: usize = G1_SIZE + 3 * G2_SIZE + 4; // 452 bytes

/// Upper bound on public inputs per circuit
pub const MAX_PUBLIC_INPUTS: usize = 64;

/// Public inputs of the reputation circuit: `[threshold, commitment]`
pub const REPUTATION_PUBLIC_INPUTS: usize = 2;

/// Encoded size for a key with `ic_count` IC points
pub const fn vk_size(ic_count: usize) -> usize {
    VK_HEADER_SIZE + ic_count * G1_SIZE
}

/// Parsed and validated Groth16 verifying key
///
/// Outside this crate a key can only come from [`VerifyingKey::from_bytes`],
/// so every instance has passed the point checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    pub(crate) alpha: G1Affine,
    pub(crate) beta: G2Affine,
    pub(crate) gamma: G2Affine,
    pub(crate) delta: G2Affine,
    /// IC[0] plus one point per public input
    pub(crate) ic: Vec<G1Affine>,
}

fn g1_field(bytes: &[u8], field: &'static str) -> Result<G1Affine, KeyError> {
    G1Affine::from_bytes(bytes).map_err(|source| KeyError::InvalidPoint { field, source })
}

fn g2_field(bytes: &[u8], field: &'static str) -> Result<G2Affine, KeyError> {
    let point =
        G2Affine::from_bytes(bytes).map_err(|source| KeyError::InvalidPoint { field, source })?;
    if point.is_identity() {
        return Err(KeyError::InvalidPoint {
            field,
            source: PointError::Identity,
        });
    }
    Ok(point)
}

impl VerifyingKey {
    /// Parse and validate a VK from its wire encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() < VK_HEADER_SIZE {
            return Err(KeyError::TooShort {
                min: VK_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let count = u32::from_be_bytes([bytes[448], bytes[449], bytes[450], bytes[451]]) as usize;
        if count == 0 {
            return Err(KeyError::EmptyIc);
        }
        if count > MAX_PUBLIC_INPUTS + 1 {
            return Err(KeyError::TooManyPublicInputs {
                count,
                max: MAX_PUBLIC_INPUTS + 1,
            });
        }
        let expected = vk_size(count);
        if bytes.len() != expected {
            return Err(KeyError::InvalidSize {
                expected,
                actual: bytes.len(),
            });
        }

        let alpha = g1_field(&bytes[0..64], "alpha")?;
        if alpha.is_identity() {
            return Err(KeyError::InvalidPoint {
                field: "alpha",
                source: PointError::Identity,
            });
        }
        let beta = g2_field(&bytes[64..192], "beta")?;
        let gamma = g2_field(&bytes[192..320], "gamma")?;
        let delta = g2_field(&bytes[320..448], "delta")?;

        let ic = bytes[VK_HEADER_SIZE..]
            .chunks_exact(G1_SIZE)
            .map(|chunk| g1_field(chunk, "ic"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VerifyingKey {
            alpha,
            beta,
            gamma,
            delta,
            ic,
        })
    }

    /// Wire encoding (inverse of `from_bytes`)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(vk_size(self.ic.len()));
        out.extend_from_slice(&self.alpha.to_bytes());
        out.extend_from_slice(&self.beta.to_bytes());
        out.extend_from_slice(&self.gamma.to_bytes());
        out.extend_from_slice(&self.delta.to_bytes());
        out.extend_from_slice(&(self.ic.len() as u32).to_be_bytes());
        for p in &self.ic {
            out.extend_from_slice(&p.to_bytes());
        }
        out
    }

    pub fn alpha(&self) -> &G1Affine {
        &self.alpha
    }

    pub fn beta(&self) -> &G2Affine {
        &self.beta
    }

    pub fn gamma(&self) -> &G2Affine {
        &self.gamma
    }

    pub fn delta(&self) -> &G2Affine {
        &self.delta
    }

    /// IC[0] followed by one point per public input
    pub fn ic(&self) -> &[G1Affine] {
        &self.ic
    }

    /// Number of public inputs this key expects
    pub fn num_public_inputs(&self) -> usize {
        self.ic.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{G1Projective, G2Projective};
    use crate::field::Fr;

    fn sample_vk(ic_count: usize) -> Vec<u8> {
        let g1 = |k: u64| G1Projective::generator().mul(&Fr::from_u64(k)).to_affine();
        let g2 = |k: u64| G2Projective::generator().mul(&Fr::from_u64(k)).to_affine();
        VerifyingKey {
            alpha: g1(2),
            beta: g2(3),
            gamma: g2(5),
            delta: g2(7),
            ic: (0..ic_count).map(|i| g1(11 + i as u64)).collect(),
        }
        .to_bytes()
    }

    #[test]
    fn test_vk_size() {
        assert_eq!(VK_HEADER_SIZE, 452);
        assert_eq!(vk_size(3), 644);
        assert_eq!(sample_vk(3).len(), 644);
    }

    #[test]
    fn test_vk_roundtrip() {
        let bytes = sample_vk(3);
        let vk = VerifyingKey::from_bytes(&bytes).unwrap();
        assert_eq!(vk.num_public_inputs(), 2);
        assert_eq!(vk.to_bytes(), bytes);
    }

    #[test]
    fn test_vk_too_short() {
        let result = VerifyingKey::from_bytes(&[0u8; 100]);
        assert!(matches!(
            result,
            Err(KeyError::TooShort {
                min: 452,
                actual: 100
            })
        ));
    }

    #[test]
    fn test_vk_truncated_ic() {
        let bytes = sample_vk(3);
        let result = VerifyingKey::from_bytes(&bytes[..bytes.len() - 64]);
        assert!(matches!(
            result,
            Err(KeyError::InvalidSize {
                expected: 644,
                actual: 580
            })
        ));
    }

    #[test]
    fn test_vk_count_limits() {
        let mut bytes = sample_vk(1);
        bytes[448..452].copy_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            VerifyingKey::from_bytes(&bytes),
            Err(KeyError::EmptyIc)
        ));
        bytes[448..452].copy_from_slice(&1000u32.to_be_bytes());
        assert!(matches!(
            VerifyingKey::from_bytes(&bytes),
            Err(KeyError::TooManyPublicInputs { count: 1000, .. })
        ));
    }

    #[test]
    fn test_vk_rejects_bad_point() {
        let mut bytes = sample_vk(2);
        // corrupt gamma's y coordinate
        bytes[319] ^= 1;
        assert!(matches!(
            VerifyingKey::from_bytes(&bytes),
            Err(KeyError::InvalidPoint {
                field: "gamma",
                source: PointError::NotOnCurve
            })
        ));
    }

    #[test]
    fn test_empty_ic_reports_bad_inputs() {
        let mut vk = VerifyingKey::from_bytes(&sample_vk(1)).unwrap();
        vk.ic.clear();
        assert_eq!(vk.num_public_inputs(), 0);

        let proof = crate::proof::Proof {
            a: *vk.alpha(),
            b: *vk.beta(),
            c: *vk.alpha(),
        };
        assert!(matches!(
            crate::verifier::verify(&vk, &proof, &[]),
            Err(crate::errors::VerifyError::BadInputs {
                expected: 0,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_accessors_match_encoding() {
        let bytes = sample_vk(3);
        let vk = VerifyingKey::from_bytes(&bytes).unwrap();
        assert_eq!(vk.alpha().to_bytes()[..], bytes[0..64]);
        assert_eq!(vk.delta().to_bytes()[..], bytes[320..448]);
        assert_eq!(vk.ic().len(), 3);
        assert_eq!(vk.ic()[2].to_bytes()[..], bytes[580..644]);
    }

    #[test]
    fn test_vk_rejects_identity_alpha() {
        let mut bytes = sample_vk(2);
        bytes[0..64].fill(0);
        assert!(matches!(
            VerifyingKey::from_bytes(&bytes),
            Err(KeyError::InvalidPoint {
                field: "alpha",
                source: PointError::Identity
            })
        ));
    }
}
