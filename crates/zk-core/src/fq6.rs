//! Cubic extension Fq6 = Fq2[v] / (v^3 - xi), xi = 9 + u

use core::ops::{Add, Mul, Neg, Sub};

use crate::fq2::Fq2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Fq6 {
    pub c0: Fq2,
    pub c1: Fq2,
    pub c2: Fq2,
}

/// xi^((q^k - 1) / 3), k = 0..6
const FROBENIUS_COEFF_C1: [Fq2; 6] = [
    Fq2::from_raw(
        [0x0000000000000001, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x99e39557176f553d, 0xb78cc310c2c3330c, 0x4c0bec3cf559b143, 0x2fb347984f7911f7],
        [0x1665d51c640fcba2, 0x32ae2a1d0b7c9dce, 0x4ba4cc8bd75a0794, 0x16c9e55061ebae20],
    ),
    Fq2::from_raw(
        [0xe4bd44e5607cfd48, 0xc28f069fbb966e3d, 0x5e6dd9e7e0acccb0, 0x30644e72e131a029],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x7b746ee87bdcfb6d, 0x805ffd3d5d6942d3, 0xbaff1c77959f25ac, 0x0856e078b755ef0a],
        [0x380cab2baaa586de, 0x0fdf31bf98ff2631, 0xa9f30e6dec26094f, 0x04f1de41b3d1766f],
    ),
    Fq2::from_raw(
        [0x5763473177fffffe, 0xd4f263f1acdb5c4f, 0x59e26bcea0d48bac, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x62e913ee1dada9e4, 0xf71614d4b0b71f3a, 0x699582b87809d9ca, 0x28be74d4bb943f51],
        [0xedae0bcec9c7aac7, 0x54f40eb4c3f6068d, 0xc2b86abcbe01477a, 0x14a88ae0cb747b99],
    ),
];

/// xi^(2(q^k - 1) / 3), k = 0..6
const FROBENIUS_COEFF_C2: [Fq2; 6] = [
    Fq2::from_raw(
        [0x0000000000000001, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x848a1f55921ea762, 0xd33365f7be94ec72, 0x80f3c0b75a181e84, 0x05b54f5e64eea801],
        [0xc13b4711cd2b8126, 0x3685d2ea1bdec763, 0x9f3a80b03b0b1c92, 0x2c145edbe7fd8aee],
    ),
    Fq2::from_raw(
        [0x5763473177fffffe, 0xd4f263f1acdb5c4f, 0x59e26bcea0d48bac, 0x0000000000000000],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0x0e1a92bc3ccbf066, 0xe633094575b06bcb, 0x19bee0f7b5b2444e, 0x0bc58c6611c08dab],
        [0x5fe3ed9d730c239f, 0xa44a9e08737f96e5, 0xfeb0f6ef0cd21d04, 0x23d5e999e1910a12],
    ),
    Fq2::from_raw(
        [0xe4bd44e5607cfd48, 0xc28f069fbb966e3d, 0x5e6dd9e7e0acccb0, 0x30644e72e131a029],
        [0x0000000000000000, 0x0000000000000000, 0x0000000000000000, 0x0000000000000000],
    ),
    Fq2::from_raw(
        [0xa97bda050992657f, 0xde1afb54342c724f, 0x1d9da40771b6f589, 0x1ee972ae6a826a7d],
        [0x5721e37e70c255c9, 0x54326430418536d1, 0xd2b513cdbb257724, 0x10de546ff8d4ab51],
    ),
];

impl Fq6 {
    pub const ZERO: Self = Self::new(Fq2::ZERO, Fq2::ZERO, Fq2::ZERO);
    pub const ONE: Self = Self::new(Fq2::ONE, Fq2::ZERO, Fq2::ZERO);

    pub const fn new(c0: Fq2, c1: Fq2, c2: Fq2) -> Self {
        Self { c0, c1, c2 }
    }

    pub fn is_zero(&self) -> bool {
        self.c0.is_zero() & self.c1.is_zero() & self.c2.is_zero()
    }

    pub fn double(&self) -> Self {
        Self::new(self.c0.double(), self.c1.double(), self.c2.double())
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// Multiply by v: (c0, c1, c2) -> (xi c2, c0, c1)
    pub fn mul_by_nonresidue(&self) -> Self {
        Self::new(self.c2.mul_by_nonresidue(), self.c0, self.c1)
    }

    /// Scale every coefficient by an Fq2 element
    pub fn mul_by_fq2(&self, k: &Fq2) -> Self {
        Self::new(self.c0 * *k, self.c1 * *k, self.c2 * *k)
    }

    /// Multiply by the sparse element b0 + b1 v
    pub fn mul_by_01(&self, b0: &Fq2, b1: &Fq2) -> Self {
        let a_a = self.c0 * *b0;
        let b_b = self.c1 * *b1;

        let t1 = ((self.c1 + self.c2) * *b1 - b_b).mul_by_nonresidue() + a_a;
        let t2 = (*b0 + *b1) * (self.c0 + self.c1) - a_a - b_b;
        let t3 = (self.c0 + self.c2) * *b0 - a_a + b_b;
        Self::new(t1, t2, t3)
    }

    /// Multiply by the sparse element b1 v
    pub fn mul_by_1(&self, b1: &Fq2) -> Self {
        let b_b = self.c1 * *b1;
        let t1 = ((self.c1 + self.c2) * *b1 - b_b).mul_by_nonresidue();
        let t2 = (self.c0 + self.c1) * *b1 - b_b;
        Self::new(t1, t2, b_b)
    }

    pub fn invert(&self) -> Option<Self> {
        let c0 = self.c0.square() - (self.c1 * self.c2).mul_by_nonresidue();
        let c1 = self.c2.square().mul_by_nonresidue() - self.c0 * self.c1;
        let c2 = self.c1.square() - self.c0 * self.c2;
        let t = ((self.c2 * c1 + self.c1 * c2).mul_by_nonresidue() + self.c0 * c0).invert()?;
        Some(Self::new(c0 * t, c1 * t, c2 * t))
    }

    /// x -> x^(q^power)
    pub fn frobenius_map(&self, power: usize) -> Self {
        Self::new(
            self.c0.frobenius_map(power),
            self.c1.frobenius_map(power) * FROBENIUS_COEFF_C1[power % 6],
            self.c2.frobenius_map(power) * FROBENIUS_COEFF_C2[power % 6],
        )
    }
}

impl Add for Fq6 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.c0 + rhs.c0, self.c1 + rhs.c1, self.c2 + rhs.c2)
    }
}

impl Sub for Fq6 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.c0 - rhs.c0, self.c1 - rhs.c1, self.c2 - rhs.c2)
    }
}

impl Mul for Fq6 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let (a0, a1, a2) = (self.c0, self.c1, self.c2);
        let (b0, b1, b2) = (rhs.c0, rhs.c1, rhs.c2);
        let v0 = a0 * b0;
        let v1 = a1 * b1;
        let v2 = a2 * b2;

        let c0 = ((a1 + a2) * (b1 + b2) - v1 - v2).mul_by_nonresidue() + v0;
        let c1 = (a0 + a1) * (b0 + b1) - v0 - v1 + v2.mul_by_nonresidue();
        let c2 = (a0 + a2) * (b0 + b2) - v0 - v2 + v1;
        Self::new(c0, c1, c2)
    }
}

impl Neg for Fq6 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.c0, -self.c1, -self.c2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Fq;

    fn fq2(a: u64, b: u64) -> Fq2 {
        Fq2::new(Fq::from_u64(a), Fq::from_u64(b))
    }

    fn sample() -> Fq6 {
        Fq6::new(fq2(1, 2), fq2(3, 4), fq2(5, 6))
    }

    #[test]
    fn test_v_cubed_is_xi() {
        let v = Fq6::new(Fq2::ZERO, Fq2::ONE, Fq2::ZERO);
        let xi = Fq6::new(fq2(9, 1), Fq2::ZERO, Fq2::ZERO);
        assert_eq!(v * v * v, xi);
        assert_eq!(Fq6::ONE.mul_by_nonresidue(), v);
    }

    #[test]
    fn test_sparse_mul_matches_full() {
        let a = sample();
        let (b0, b1) = (fq2(7, 8), fq2(9, 10));
        assert_eq!(a.mul_by_01(&b0, &b1), a * Fq6::new(b0, b1, Fq2::ZERO));
        assert_eq!(a.mul_by_1(&b1), a * Fq6::new(Fq2::ZERO, b1, Fq2::ZERO));
    }

    #[test]
    fn test_invert() {
        let a = sample();
        assert_eq!(a * a.invert().unwrap(), Fq6::ONE);
        assert!(Fq6::ZERO.invert().is_none());
    }

    #[test]
    fn test_frobenius_composes() {
        let a = sample();
        assert_eq!(a.frobenius_map(0), a);
        assert_eq!(a.frobenius_map(1).frobenius_map(1), a.frobenius_map(2));
        assert_eq!(a.frobenius_map(2).frobenius_map(1), a.frobenius_map(3));
        let mut x = a;
        for _ in 0..6 {
            x = x.frobenius_map(1);
        }
        assert_eq!(x, a);
    }
}
