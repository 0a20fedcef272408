//! Degree-12 extension Fq12 = Fq6[w] / (w^2 - v), the pairing target group

use core::ops::{Mul, Neg};

use crate::fq2::Fq2;
use crate::fq6::Fq6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Fq12 {
    pub c0: Fq6,
    pub c1: Fq6,
}

/// xi^((q^k - 1) / 6), k = 0..12
const FROBENIUS_COEFF_C1: [Fq2; 12] = [
    Fq2::from_raw(
        [0x0000000000000001, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0xd60b35dadcc9e470, 0x5c521e08292f2176, 0xe8b99fdd76e68b60, 0x1284b71c2865a7df],
        [0xca5cf05f80f362ac, 0x747992778eeec7e5, 0xa6327cfe12150b8e, 0x246996f3b4fae7e6],
    ),
    Fq2::from_raw(
        [0xe4bd44e5607cfd49, 0xc28f069fbb966e3d, 0x5e6dd9e7e0acccb0, 0x30644e72e131a029],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0xe86f7d391ed4a67f, 0x894cb38dbe55d24a, 0xefe9608cd0acaa90, 0x19dc81cfcc82e4bb],
        [0x7694aa2bf4c0c101, 0x7f03a5e397d439ec, 0x06cbeee33576139d, 0x00abf8b60be77d73],
    ),
    Fq2::from_raw(
        [0xe4bd44e5607cfd48, 0xc28f069fbb966e3d, 0x5e6dd9e7e0acccb0, 0x30644e72e131a029],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x1264475e420ac20f, 0x2cfa95859526b0d4, 0x072fc0af59c61f30, 0x0757cab3a41d3cdc],
        [0xe85845e34c4a5b9c, 0xa20b7dfd71573c93, 0x18e9b79ba4e2606c, 0x0ca6b035381e35b6],
    ),
    Fq2::from_raw(
        [0x3c208c16d87cfd46, 0x97816a916871ca8d, 0xb85045b68181585d, 0x30644e72e131a029],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x6615563bfbb318d7, 0x3b2f4c893f42a916, 0xcf96a5d90a9accfd, 0x1ddf9756b8cbf849],
        [0x71c39bb757899a9b, 0x2307d819d98302a7, 0x121dc8b86f6c4ccf, 0x0bfab77f2c36b843],
    ),
    Fq2::from_raw(
        [0x5763473177fffffe, 0xd4f263f1acdb5c4f, 0x59e26bcea0d48bac, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x53b10eddb9a856c8, 0x0e34b703aa1bf842, 0xc866e529b0d4adcd, 0x1687cca314aebb6d],
        [0xc58be1eae3bc3c46, 0x187dc4add09d90a0, 0xb18456d34c0b44c0, 0x2fb855bcd54a22b6],
    ),
    Fq2::from_raw(
        [0x5763473177ffffff, 0xd4f263f1acdb5c4f, 0x59e26bcea0d48bac, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x29bc44b896723b38, 0x6a86d50bd34b19b9, 0xb120850727bb392d, 0x290c83bf3d14634d],
        [0x53c846338c32a1ab, 0xf575ec93f71a8df9, 0x9f668e1adc9ef7f0, 0x23bd9e3da9136a73],
    ),
];

impl Fq12 {
    pub const ZERO: Self = Self::new(Fq6::ZERO, Fq6::ZERO);
    pub const ONE: Self = Self::new(Fq6::ONE, Fq6::ZERO);

    pub const fn new(c0: Fq6, c1: Fq6) -> Self {
        Self { c0, c1 }
    }

    pub fn is_zero(&self) -> bool {
        self.c0.is_zero() & self.c1.is_zero()
    }

    pub fn is_one(&self) -> bool {
        *self == Self::ONE
    }

    /// Complex squaring: two Fq6 multiplications
    pub fn square(&self) -> Self {
        let ab = self.c0 * self.c1;
        let c0 = (self.c0 + self.c1) * (self.c0 + self.c1.mul_by_nonresidue())
            - ab
            - ab.mul_by_nonresidue();
        Self::new(c0, ab.double())
    }

    /// Conjugation over Fq6; the inverse for unitary elements
    pub fn conjugate(&self) -> Self {
        Self::new(self.c0, -self.c1)
    }

    pub fn invert(&self) -> Option<Self> {
        let t = (self.c0.square() - self.c1.square().mul_by_nonresidue()).invert()?;
        Some(Self::new(self.c0 * t, -(self.c1 * t)))
    }

    /// x -> x^(q^power)
    pub fn frobenius_map(&self, power: usize) -> Self {
        let c0 = self.c0.frobenius_map(power);
        let c1 = self
            .c1
            .frobenius_map(power)
            .mul_by_fq2(&FROBENIUS_COEFF_C1[power % 12]);
        Self::new(c0, c1)
    }

    /// Multiply by the sparse line value c0 + (c3 + c4 v) w
    pub fn mul_by_034(&self, c0: &Fq2, c3: &Fq2, c4: &Fq2) -> Self {
        let a = self.c0.mul_by_fq2(c0);
        let b = self.c1.mul_by_01(c3, c4);
        let e = (self.c0 + self.c1).mul_by_01(&(*c0 + *c3), c4);
        Self::new(b.mul_by_nonresidue() + a, e - (a + b))
    }

    /// Exponentiation by a public exponent given as big-endian bits of a u64
    pub fn pow_vartime(&self, exp: u64) -> Self {
        let mut res = Self::ONE;
        for i in (0..64 - exp.leading_zeros()).rev() {
            res = res.square();
            if (exp >> i) & 1 == 1 {
                res = res * *self;
            }
        }
        res
    }
}

impl Mul for Fq12 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let aa = self.c0 * rhs.c0;
        let bb = self.c1 * rhs.c1;
        let c1 = (self.c0 + self.c1) * (rhs.c0 + rhs.c1) - aa - bb;
        Self::new(bb.mul_by_nonresidue() + aa, c1)
    }
}

impl Neg for Fq12 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.c0, -self.c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Fq;

    fn fq2(a: u64, b: u64) -> Fq2 {
        Fq2::new(Fq::from_u64(a), Fq::from_u64(b))
    }

    fn sample() -> Fq12 {
        Fq12::new(
            Fq6::new(fq2(1, 2), fq2(3, 4), fq2(5, 6)),
            Fq6::new(fq2(7, 8), fq2(9, 10), fq2(11, 12)),
        )
    }

    #[test]
    fn test_square_matches_mul() {
        let a = sample();
        assert_eq!(a.square(), a * a);
    }

    #[test]
    fn test_invert() {
        let a = sample();
        assert!((a * a.invert().unwrap()).is_one());
        assert!(Fq12::ZERO.invert().is_none());
    }

    #[test]
    fn test_sparse_034_matches_full() {
        let a = sample();
        let (c0, c3, c4) = (fq2(13, 14), fq2(15, 16), fq2(17, 18));
        let line = Fq12::new(
            Fq6::new(c0, Fq2::ZERO, Fq2::ZERO),
            Fq6::new(c3, c4, Fq2::ZERO),
        );
        assert_eq!(a.mul_by_034(&c0, &c3, &c4), a * line);
    }

    #[test]
    fn test_frobenius_composes() {
        let a = sample();
        assert_eq!(a.frobenius_map(1).frobenius_map(1), a.frobenius_map(2));
        assert_eq!(a.frobenius_map(2).frobenius_map(1), a.frobenius_map(3));
        let mut x = a;
        for _ in 0..12 {
            x = x.frobenius_map(1);
        }
        assert_eq!(x, a);
    }

    #[test]
    fn test_pow_vartime() {
        let a = sample();
        assert_eq!(a.pow_vartime(0), Fq12::ONE);
        assert_eq!(a.pow_vartime(5), a * a * a * a * a);
    }
}
