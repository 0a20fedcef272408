//! BN254 operations on wire-encoded points
//!
//! Byte-level wrappers around the curve and pairing modules, in the
//! big-endian EIP-196/197 encoding. Every input point is fully validated
//! (range, curve and subgroup); results are always valid encodings.

use crate::arena::{with_scratch, DEFAULT_SCRATCH_CAPACITY};
use crate::curve::{msm, G1Affine, G2Affine};
use crate::errors::{PointError, VerifyError};
use crate::field::Fr;
use crate::pairing::multi_pairing;
use crate::types::{G1Bytes, G2Bytes, Scalar, G1_SIZE, G2_SIZE};

/// Bytes per pairing-check pair: G1 then G2
pub const PAIR_SIZE: usize = G1_SIZE + G2_SIZE;

pub fn g1_from_bytes(bytes: &[u8]) -> Result<G1Affine, VerifyError> {
    Ok(G1Affine::from_bytes(bytes)?)
}

pub fn g2_from_bytes(bytes: &[u8]) -> Result<G2Affine, VerifyError> {
    Ok(G2Affine::from_bytes(bytes)?)
}

/// Performs G1 addition.
pub fn g1_add(a: &G1Bytes, b: &G1Bytes) -> Result<G1Bytes, VerifyError> {
    let a = g1_from_bytes(a)?;
    let b = g1_from_bytes(b)?;
    Ok(a.to_projective().add_affine(&b).to_affine().to_bytes())
}

/// Performs G1 subtraction (a - b = a + (-b))
pub fn g1_sub(a: &G1Bytes, b: &G1Bytes) -> Result<G1Bytes, VerifyError> {
    let neg_b = g1_neg(b)?;
    g1_add(a, &neg_b)
}

/// Negates a G1 point (x, -y); the identity maps to itself.
pub fn g1_neg(point: &G1Bytes) -> Result<G1Bytes, VerifyError> {
    Ok((-g1_from_bytes(point)?).to_bytes())
}

/// Constant-time G1 scalar multiplication. The scalar must be canonical.
pub fn g1_scalar_mul(point: &G1Bytes, scalar: &Scalar) -> Result<G1Bytes, VerifyError> {
    let p = g1_from_bytes(point)?;
    let k = Fr::from_bytes(scalar)?;
    Ok(p.to_projective().mul(&k).to_affine().to_bytes())
}

/// Computes sum(scalars[i] * points[i]) in variable time.
pub fn g1_msm(points: &[G1Bytes], scalars: &[Scalar]) -> Result<G1Bytes, VerifyError> {
    if points.len() != scalars.len() {
        return Err(VerifyError::BadInputs {
            expected: points.len(),
            actual: scalars.len(),
        });
    }
    let decoded_points = points
        .iter()
        .map(|p| g1_from_bytes(p))
        .collect::<Result<Vec<_>, _>>()?;
    let decoded_scalars = scalars
        .iter()
        .map(|s| Fr::from_bytes(s))
        .collect::<Result<Vec<_>, _>>()?;
    let capacity = DEFAULT_SCRATCH_CAPACITY;
    let sum = with_scratch(capacity, false, |arena| {
        msm(&decoded_points, &decoded_scalars, arena)
    })??;
    Ok(sum.to_affine().to_bytes())
}

/// Whether the bytes decode to a point satisfying y^2 = x^3 + 3.
pub fn g1_is_on_curve(bytes: &[u8]) -> bool {
    G1Affine::from_bytes_unchecked(bytes).is_ok_and(|p| p.is_on_curve())
}

/// G1 has cofactor 1, so this equals `g1_is_on_curve`.
pub fn g1_is_in_subgroup(bytes: &[u8]) -> bool {
    G1Affine::from_bytes_unchecked(bytes).is_ok_and(|p| p.is_on_curve() && p.is_in_subgroup())
}

pub fn g2_add(a: &G2Bytes, b: &G2Bytes) -> Result<G2Bytes, VerifyError> {
    let a = g2_from_bytes(a)?;
    let b = g2_from_bytes(b)?;
    Ok(a.to_projective().add_affine(&b).to_affine().to_bytes())
}

pub fn g2_neg(point: &G2Bytes) -> Result<G2Bytes, VerifyError> {
    Ok((-g2_from_bytes(point)?).to_bytes())
}

pub fn g2_scalar_mul(point: &G2Bytes, scalar: &Scalar) -> Result<G2Bytes, VerifyError> {
    let p = g2_from_bytes(point)?;
    let k = Fr::from_bytes(scalar)?;
    Ok(p.to_projective().mul(&k).to_affine().to_bytes())
}

/// Whether the bytes decode to a point on the twist curve.
pub fn g2_is_on_curve(bytes: &[u8]) -> bool {
    G2Affine::from_bytes_unchecked(bytes).is_ok_and(|p| p.is_on_curve())
}

/// Whether the bytes decode to a point of order r on the twist.
pub fn g2_is_in_subgroup(bytes: &[u8]) -> bool {
    G2Affine::from_bytes_unchecked(bytes).is_ok_and(|p| p.is_on_curve() && p.is_in_subgroup())
}

/// Multi-pairing check over concatenated (G1, G2) pairs.
/// Returns true if the product of e(a_i, b_i) is 1 in GT.
pub fn pairing_check(input: &[u8]) -> Result<bool, VerifyError> {
    if input.len() % PAIR_SIZE != 0 {
        return Err(PointError::InvalidLength {
            expected: (input.len() / PAIR_SIZE + 1) * PAIR_SIZE,
            actual: input.len(),
        }
        .into());
    }
    if input.is_empty() {
        return Ok(true);
    }

    let pairs = input
        .chunks_exact(PAIR_SIZE)
        .map(|chunk| {
            Ok((
                g1_from_bytes(&chunk[..G1_SIZE])?,
                g2_from_bytes(&chunk[G1_SIZE..])?,
            ))
        })
        .collect::<Result<Vec<_>, VerifyError>>()?;

    let gt = with_scratch(DEFAULT_SCRATCH_CAPACITY, false, |arena| {
        multi_pairing(&pairs, arena)
    })??;
    Ok(gt.is_one())
}

/// Returns the G1 generator point (1, 2)
pub fn g1_generator() -> G1Bytes {
    crate::types::G1_GENERATOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{G1_IDENTITY, G2_IDENTITY};
    use hex_literal::hex;

    const G2_NON_SUBGROUP: [u8; 128] = hex!(
        "0000000000000000000000000000000000000000000000000000000000000001"
        "0000000000000000000000000000000000000000000000000000000000000002"
        "2b76c179599bb92a963dac85546a005a777f7c13f6a7b75d5918b6b5808f5fde"
        "101f7278419308b95099eca02dcee0c5381f4d26d1d62313f057167f064101ce"
    );

    fn scalar(v: u64) -> Scalar {
        Fr::from_u64(v).to_bytes()
    }

    #[test]
    fn test_g1_neg_identity() {
        let neg = g1_neg(&G1_IDENTITY).unwrap();
        assert_eq!(neg, G1_IDENTITY);
    }

    #[test]
    fn test_g1_arithmetic() {
        let g = g1_generator();
        let two_g = g1_add(&g, &g).unwrap();
        assert_eq!(g1_scalar_mul(&g, &scalar(2)).unwrap(), two_g);
        assert_eq!(g1_sub(&two_g, &g).unwrap(), g);
        assert_eq!(g1_sub(&g, &g).unwrap(), G1_IDENTITY);
        // 5*G + 4*(2G) = 13*G
        assert_eq!(
            g1_msm(&[g, two_g], &[scalar(5), scalar(4)]).unwrap(),
            g1_scalar_mul(&g, &scalar(13)).unwrap()
        );
        assert_eq!(g1_msm(&[], &[]).unwrap(), G1_IDENTITY);
    }

    #[test]
    fn test_g1_validation() {
        let mut bad = g1_generator();
        bad[63] = 3;
        assert!(!g1_is_on_curve(&bad));
        assert!(g1_is_in_subgroup(&g1_generator()));
        assert_eq!(
            g1_add(&bad, &g1_generator()),
            Err(VerifyError::InvalidPoint(PointError::NotOnCurve))
        );
        assert!(matches!(
            g1_scalar_mul(&g1_generator(), &crate::types::FR_MODULUS),
            Err(VerifyError::OutOfRange(_))
        ));
        assert!(matches!(
            g1_msm(&[g1_generator()], &[]),
            Err(VerifyError::BadInputs { .. })
        ));
    }

    #[test]
    fn test_g2_subgroup_check() {
        assert!(g2_is_on_curve(&G2_NON_SUBGROUP));
        assert!(!g2_is_in_subgroup(&G2_NON_SUBGROUP));
        assert_eq!(
            g2_neg(&G2_NON_SUBGROUP),
            Err(VerifyError::InvalidPoint(PointError::NotInSubgroup))
        );
        let g2 = G2Affine::generator().to_bytes();
        assert!(g2_is_in_subgroup(&g2));
        assert_eq!(
            g2_add(&g2, &g2_neg(&g2).unwrap()).unwrap(),
            G2_IDENTITY
        );
        assert_eq!(
            g2_scalar_mul(&g2, &scalar(2)).unwrap(),
            g2_add(&g2, &g2).unwrap()
        );
    }

    #[test]
    fn test_pairing_check() {
        let g1 = g1_generator();
        let g2 = G2Affine::generator().to_bytes();
        let mut input = Vec::new();
        input.extend_from_slice(&g1_scalar_mul(&g1, &scalar(6)).unwrap());
        input.extend_from_slice(&g2);
        input.extend_from_slice(&g1_neg(&g1_scalar_mul(&g1, &scalar(2)).unwrap()).unwrap());
        input.extend_from_slice(&g2_scalar_mul(&g2, &scalar(3)).unwrap());
        assert!(pairing_check(&input).unwrap());

        input[..64].copy_from_slice(&g1_scalar_mul(&g1, &scalar(7)).unwrap());
        assert!(!pairing_check(&input).unwrap());

        assert!(pairing_check(&[]).unwrap());
        assert!(matches!(
            pairing_check(&input[..100]),
            Err(VerifyError::InvalidPoint(PointError::InvalidLength { .. }))
        ));
    }
}
