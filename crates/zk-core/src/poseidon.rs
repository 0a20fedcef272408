//! Poseidon hash over BN254 Fr (t = 3, two inputs)
//!
//! State starts as `[0, a, b]`. Each round adds the round constants, applies
//! the x^5 S-box (to every element in full rounds, to `state[0]` only in
//! partial rounds), then mixes with the MDS matrix. The output is `state[0]`.

use std::sync::OnceLock;

use crate::constants::{
    POSEIDON_FULL_ROUNDS, POSEIDON_MDS, POSEIDON_PARTIAL_ROUNDS, POSEIDON_ROUND_CONSTANTS,
    POSEIDON_WIDTH,
};
use crate::errors::FieldError;
use crate::field::Fr;

/// Round constants and MDS matrix in Montgomery form
pub struct PoseidonParams {
    round_constants: [[Fr; POSEIDON_WIDTH]; POSEIDON_FULL_ROUNDS + POSEIDON_PARTIAL_ROUNDS],
    mds: [[Fr; POSEIDON_WIDTH]; POSEIDON_WIDTH],
}

static PARAMS: OnceLock<PoseidonParams> = OnceLock::new();

/// Shared parameter table, built on first use.
pub fn params() -> &'static PoseidonParams {
    PARAMS.get_or_init(PoseidonParams::build)
}

impl PoseidonParams {
    fn build() -> Self {
        let mut round_constants =
            [[Fr::ZERO; POSEIDON_WIDTH]; POSEIDON_FULL_ROUNDS + POSEIDON_PARTIAL_ROUNDS];
        for (i, c) in POSEIDON_ROUND_CONSTANTS.iter().enumerate() {
            round_constants[i / POSEIDON_WIDTH][i % POSEIDON_WIDTH] =
                Fr::from_be_bytes_mod_order(c);
        }
        let mut mds = [[Fr::ZERO; POSEIDON_WIDTH]; POSEIDON_WIDTH];
        for (row, src) in mds.iter_mut().zip(POSEIDON_MDS.iter()) {
            for (m, c) in row.iter_mut().zip(src.iter()) {
                *m = Fr::from_be_bytes_mod_order(c);
            }
        }
        log::debug!(
            "poseidon tables ready ({} rounds)",
            POSEIDON_FULL_ROUNDS + POSEIDON_PARTIAL_ROUNDS
        );
        Self {
            round_constants,
            mds,
        }
    }

    /// Apply the full permutation in place.
    pub fn permute(&self, state: &mut [Fr; POSEIDON_WIDTH]) {
        let half_full = POSEIDON_FULL_ROUNDS / 2;
        for (round, constants) in self.round_constants.iter().enumerate() {
            for (s, c) in state.iter_mut().zip(constants) {
                *s += *c;
            }
            let full = round < half_full || round >= half_full + POSEIDON_PARTIAL_ROUNDS;
            if full {
                state.iter_mut().for_each(|s| *s = sbox(*s));
            } else {
                state[0] = sbox(state[0]);
            }
            *state = self.mix(state);
        }
    }

    fn mix(&self, state: &[Fr; POSEIDON_WIDTH]) -> [Fr; POSEIDON_WIDTH] {
        let mut out = [Fr::ZERO; POSEIDON_WIDTH];
        for (o, row) in out.iter_mut().zip(self.mds.iter()) {
            for (m, s) in row.iter().zip(state.iter()) {
                *o += *m * *s;
            }
        }
        out
    }
}

#[inline]
fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    x2.square() * x
}

/// Poseidon([a, b])
pub fn poseidon_hash(inputs: [Fr; 2]) -> Fr {
    let mut state = [Fr::ZERO, inputs[0], inputs[1]];
    params().permute(&mut state);
    state[0]
}

/// Hash two canonical 32-byte big-endian elements.
pub fn poseidon_hash_bytes(a: &[u8; 32], b: &[u8; 32]) -> Result<[u8; 32], FieldError> {
    let a = Fr::from_bytes(a)?;
    let b = Fr::from_bytes(b)?;
    Ok(poseidon_hash([a, b]).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_poseidon_circomlib_vector() {
        let out = poseidon_hash([Fr::from_u64(1), Fr::from_u64(2)]);
        assert_eq!(
            out.to_bytes(),
            hex!("115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a")
        );
    }

    #[test]
    fn test_poseidon_is_order_sensitive() {
        let ab = poseidon_hash([Fr::from_u64(1), Fr::from_u64(2)]);
        let ba = poseidon_hash([Fr::from_u64(2), Fr::from_u64(1)]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_poseidon_bytes_rejects_non_canonical() {
        let one = crate::types::SCALAR_ONE;
        assert_eq!(
            poseidon_hash_bytes(&one, &crate::types::FR_MODULUS),
            Err(FieldError::NotCanonical)
        );
        let mut two = [0u8; 32];
        two[31] = 2;
        assert_eq!(
            poseidon_hash_bytes(&one, &two).unwrap(),
            hex!("115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a")
        );
    }

    #[test]
    fn test_params_shared() {
        assert!(core::ptr::eq(params(), params()));
    }
}
