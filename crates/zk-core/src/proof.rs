//! Groth16 proof parsing
//!
//! Proof format (256 bytes, big-endian):
//! - [0..64]: A (G1)
//! - [64..192]: B (G2, EIP-197 ordering)
//! - [192..256]: C (G1)

use crate::curve::{G1Affine, G2Affine};
use crate::errors::{PointError, ProofError, VerifyError};

/// Encoded proof size
pub const PROOF_SIZE: usize = 256;

const A_OFFSET: usize = 0;
const B_OFFSET: usize = 64;
const C_OFFSET: usize = 192;

/// Decoded Groth16 proof (A, B, C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proof {
    pub a: G1Affine,
    pub b: G2Affine,
    pub c: G1Affine,
}

impl Proof {
    /// Decode and validate all three points.
    ///
    /// A proof with any point at infinity is degenerate and rejected as an
    /// invalid point rather than evaluated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        if bytes.len() != PROOF_SIZE {
            return Err(ProofError::InvalidSize {
                expected: PROOF_SIZE,
                actual: bytes.len(),
            }
            .into());
        }

        let a = G1Affine::from_bytes(&bytes[A_OFFSET..B_OFFSET])?;
        let b = G2Affine::from_bytes(&bytes[B_OFFSET..C_OFFSET])?;
        let c = G1Affine::from_bytes(&bytes[C_OFFSET..PROOF_SIZE])?;
        if a.is_identity() || b.is_identity() || c.is_identity() {
            return Err(PointError::Identity.into());
        }
        Ok(Proof { a, b, c })
    }

    pub fn to_bytes(&self) -> [u8; PROOF_SIZE] {
        let mut out = [0u8; PROOF_SIZE];
        out[A_OFFSET..B_OFFSET].copy_from_slice(&self.a.to_bytes());
        out[B_OFFSET..C_OFFSET].copy_from_slice(&self.b.to_bytes());
        out[C_OFFSET..PROOF_SIZE].copy_from_slice(&self.c.to_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{G1Projective, G2Projective};
    use crate::field::Fr;

    fn sample() -> Proof {
        Proof {
            a: G1Projective::generator().mul(&Fr::from_u64(3)).to_affine(),
            b: G2Projective::generator().mul(&Fr::from_u64(4)).to_affine(),
            c: G1Projective::generator().mul(&Fr::from_u64(5)).to_affine(),
        }
    }

    #[test]
    fn test_proof_roundtrip() {
        let proof = sample();
        assert_eq!(Proof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }

    #[test]
    fn test_proof_wrong_size() {
        let result = Proof::from_bytes(&[0u8; 255]);
        assert!(matches!(
            result,
            Err(VerifyError::Proof(ProofError::InvalidSize {
                expected: 256,
                actual: 255
            }))
        ));
    }

    #[test]
    fn test_proof_identity_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[192..256].fill(0);
        assert_eq!(
            Proof::from_bytes(&bytes),
            Err(VerifyError::InvalidPoint(PointError::Identity))
        );
    }

    #[test]
    fn test_proof_off_curve_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[63] ^= 0x01;
        assert_eq!(
            Proof::from_bytes(&bytes),
            Err(VerifyError::InvalidPoint(PointError::NotOnCurve))
        );
    }
}
