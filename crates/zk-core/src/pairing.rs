//! Optimal ate pairing on BN254
//!
//! The Miller loop walks the signed binary expansion of 6x + 2 with G2 in
//! homogeneous projective coordinates; line functions are evaluated at the
//! G1 point and multiplied in as sparse Fq12 elements. Several pairs share
//! one loop (and one final exponentiation) in `multi_pairing`.

use core::ops::Mul;

use crate::arena::Arena;
use crate::curve::{CurveParams, G1Affine, G2Affine, G2Params, G2Projective};
use crate::errors::ArenaError;
use crate::field::Fq;
use crate::fq12::Fq12;
use crate::fq2::Fq2;

/// BN parameter x
pub const BN_X: u64 = 4965661367192848881;

/// Signed binary (NAF) digits of 6x + 2, least significant first
const ATE_LOOP_COUNT: [i8; 66] = [
    0, 0, 0, 1, 0, 1, 0, -1, 0, 0, -1, 0, 0, 0, 1, 0, 0, -1, 0, -1, 0, 0, 0, 1, 0, -1, 0, 0, 0, 0,
    -1, 0, 0, 1, 0, -1, 0, 0, 1, 0, 0, 0, 0, 0, -1, 0, 0, -1, 0, 1, 0, -1, 0, 0, 0, -1, 0, -1, 0,
    0, 0, 1, 0, -1, 0, 1,
];

/// 1/2 in Fq
const TWO_INV: Fq = Fq::from_raw([
    0x9e10460b6c3e7ea4,
    0xcbc0b548b438e546,
    0xdc2822db40c0ac2e,
    0x183227397098d014,
]);

/// Element of the order-r target group GT in Fq12
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gt(pub(crate) Fq12);

impl Gt {
    pub const ONE: Self = Gt(Fq12::ONE);

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }

    pub fn inner(&self) -> &Fq12 {
        &self.0
    }
}

impl Mul for Gt {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Gt(self.0 * rhs.0)
    }
}

type LineCoeffs = (Fq2, Fq2, Fq2);

fn doubling_step(r: &mut G2Projective) -> LineCoeffs {
    let a = (r.x * r.y).mul_by_fq(&TWO_INV);
    let b = r.y.square();
    let c = r.z.square();
    let e = G2Params::B * (c.double() + c);
    let f = e.double() + e;
    let g = (b + f).mul_by_fq(&TWO_INV);
    let h = (r.y + r.z).square() - (b + c);
    let i = e - b;
    let j = r.x.square();
    let e_sq = e.square();

    r.x = a * (b - f);
    r.y = g.square() - (e_sq.double() + e_sq);
    r.z = b * h;
    (-h, j.double() + j, i)
}

fn addition_step(r: &mut G2Projective, q: &G2Affine) -> LineCoeffs {
    let theta = r.y - q.y * r.z;
    let lambda = r.x - q.x * r.z;
    let c = theta.square();
    let d = lambda.square();
    let e = lambda * d;
    let f = r.z * c;
    let g = r.x * d;
    let h = e + f - g.double();

    r.x = lambda * h;
    r.y = theta * (g - h) - e * r.y;
    r.z = r.z * e;
    let j = theta * q.x - lambda * q.y;
    (lambda, -theta, j)
}

fn ell(f: &mut Fq12, coeffs: &LineCoeffs, p: &G1Affine) {
    let c0 = coeffs.0.mul_by_fq(&p.y);
    let c1 = coeffs.1.mul_by_fq(&p.x);
    *f = f.mul_by_034(&c0, &c1, &coeffs.2);
}

/// Frobenius on the twist: (x, y) -> (x^q * xi^((q-1)/3), y^q * xi^((q-1)/2))
fn mul_by_char(q: &G2Affine) -> G2Affine {
    let psi = q.to_projective().psi();
    G2Affine {
        x: psi.x,
        y: psi.y,
        infinity: false,
    }
}

/// Shared Miller loop over `pairs`.
///
/// `states` holds the running G2 point per pair; callers size it to
/// `pairs.len()`. Pairs with a point at infinity are skipped, which is the
/// same as multiplying by 1.
pub(crate) fn multi_miller_loop(
    pairs: &[(G1Affine, G2Affine)],
    states: &mut [G2Projective],
) -> Fq12 {
    debug_assert!(states.len() >= pairs.len());
    let active = |p: &G1Affine, q: &G2Affine| !p.infinity && !q.infinity;

    for ((_, q), r) in pairs.iter().zip(states.iter_mut()) {
        *r = q.to_projective();
    }

    let mut f = Fq12::ONE;
    for i in (1..ATE_LOOP_COUNT.len()).rev() {
        if i != ATE_LOOP_COUNT.len() - 1 {
            f = f.square();
        }
        for ((p, q), r) in pairs.iter().zip(states.iter_mut()) {
            if active(p, q) {
                let coeffs = doubling_step(r);
                ell(&mut f, &coeffs, p);
            }
        }
        let digit = ATE_LOOP_COUNT[i - 1];
        if digit != 0 {
            for ((p, q), r) in pairs.iter().zip(states.iter_mut()) {
                if active(p, q) {
                    let addend = if digit == 1 { *q } else { -*q };
                    let coeffs = addition_step(r, &addend);
                    ell(&mut f, &coeffs, p);
                }
            }
        }
    }

    for ((p, q), r) in pairs.iter().zip(states.iter_mut()) {
        if active(p, q) {
            let q1 = mul_by_char(q);
            let q2 = -mul_by_char(&q1);
            let coeffs = addition_step(r, &q1);
            ell(&mut f, &coeffs, p);
            let coeffs = addition_step(r, &q2);
            ell(&mut f, &coeffs, p);
        }
    }
    f
}

fn exp_by_neg_x(f: &Fq12) -> Fq12 {
    f.pow_vartime(BN_X).conjugate()
}

/// Raise a Miller loop output to (q^12 - 1) / r.
pub fn final_exponentiation(f: &Fq12) -> Gt {
    // easy part: f^((q^6 - 1)(q^2 + 1))
    let Some(f_inv) = f.invert() else {
        // only reachable for a zero input, which is never 1
        return Gt(Fq12::ZERO);
    };
    let r = f.conjugate() * f_inv;
    let r = r.frobenius_map(2) * r;

    // hard part (Fuentes-Castaneda et al. addition chain)
    let y0 = exp_by_neg_x(&r);
    let y1 = y0.square();
    let y2 = y1.square();
    let y3 = y2 * y1;
    let y4 = exp_by_neg_x(&y3);
    let y5 = y4.square();
    let y6 = exp_by_neg_x(&y5);
    let y3 = y3.conjugate();
    let y6 = y6.conjugate();
    let y7 = y6 * y4;
    let y8 = y7 * y3;
    let y9 = y8 * y1;
    let y10 = y8 * y4;
    let y11 = y10 * r;
    let y13 = y9.frobenius_map(1) * y11;
    let y14 = y8.frobenius_map(2) * y13;
    let y15 = (r.conjugate() * y9).frobenius_map(3);
    Gt(y15 * y14)
}

/// e(P, Q)
pub fn pairing(p: &G1Affine, q: &G2Affine) -> Gt {
    let mut state = [G2Projective::identity()];
    final_exponentiation(&multi_miller_loop(&[(*p, *q)], &mut state))
}

/// Product of e(P_i, Q_i) with one shared Miller loop and final
/// exponentiation. Per-pair G2 state is taken from `arena`.
pub fn multi_pairing(pairs: &[(G1Affine, G2Affine)], arena: &Arena) -> Result<Gt, ArenaError> {
    let states = arena.alloc_slice(pairs.len(), G2Projective::identity())?;
    Ok(final_exponentiation(&multi_miller_loop(pairs, states)))
}

/// Stack-only multi-pairing for a fixed number of pairs.
pub fn multi_pairing_fixed<const N: usize>(pairs: &[(G1Affine, G2Affine); N]) -> Gt {
    let mut states = [G2Projective::identity(); N];
    final_exponentiation(&multi_miller_loop(pairs, &mut states))
}
