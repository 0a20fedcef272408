//! Test helpers shared by the unit test modules

use crate::curve::{G1Projective, G2Projective};
use crate::field::Fr;
use crate::key::VerifyingKey;
use crate::proof::Proof;

/// Key with a known trapdoor, so valid proofs can be produced directly:
/// alpha = a*G1, beta = b*G2, gamma = delta = G2, IC[i] = k_i*G1.
pub(crate) struct Toy {
    pub vk: VerifyingKey,
    pub a: u64,
    pub b: u64,
    pub ic: Vec<u64>,
}

fn g1(k: u64) -> crate::curve::G1Affine {
    G1Projective::generator().mul(&Fr::from_u64(k)).to_affine()
}

impl Toy {
    pub fn new(num_inputs: usize) -> Self {
        Self::with_trapdoor(num_inputs, 7, 11)
    }

    pub fn with_trapdoor(num_inputs: usize, a: u64, b: u64) -> Self {
        let ic: Vec<u64> = (0..=num_inputs as u64).map(|i| 13 + 2 * i).collect();
        let vk = VerifyingKey {
            alpha: g1(a),
            beta: G2Projective::generator().mul(&Fr::from_u64(b)).to_affine(),
            gamma: G2Projective::generator().to_affine(),
            delta: G2Projective::generator().to_affine(),
            ic: ic.iter().map(|k| g1(*k)).collect(),
        };
        Self { vk, a, b, ic }
    }

    /// A = s*G1, B = t*G2, and C chosen so that s*t = a*b + x + c.
    pub fn prove(&self, inputs: &[u64], s: u64, t: u64) -> Proof {
        let mut x = Fr::from_u64(self.ic[0]);
        for (xi, ki) in inputs.iter().zip(&self.ic[1..]) {
            x += Fr::from_u64(*xi) * Fr::from_u64(*ki);
        }
        let c = Fr::from_u64(s) * Fr::from_u64(t) - Fr::from_u64(self.a) * Fr::from_u64(self.b) - x;
        Proof {
            a: g1(s),
            b: G2Projective::generator().mul(&Fr::from_u64(t)).to_affine(),
            c: G1Projective::generator().mul(&c).to_affine(),
        }
    }
}
