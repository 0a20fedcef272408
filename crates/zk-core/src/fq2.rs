//! Quadratic extension Fq2 = Fq[u] / (u^2 + 1)

use core::ops::{Add, Mul, Neg, Sub};

use zeroize::Zeroize;

use crate::field::{Field, Fq};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Fq2 {
    pub c0: Fq,
    pub c1: Fq,
}

impl Fq2 {
    pub const ZERO: Self = Self::new(Fq::ZERO, Fq::ZERO);
    pub const ONE: Self = Self::new(Fq::ONE, Fq::ZERO);

    pub const fn new(c0: Fq, c1: Fq) -> Self {
        Self { c0, c1 }
    }

    /// Element from canonical limbs of both coefficients
    pub const fn from_raw(c0: [u64; 4], c1: [u64; 4]) -> Self {
        Self::new(Fq::from_raw(c0), Fq::from_raw(c1))
    }

    pub fn is_zero(&self) -> bool {
        self.c0.is_zero() & self.c1.is_zero()
    }

    pub fn double(&self) -> Self {
        Self::new(self.c0.double(), self.c1.double())
    }

    /// (a0 + a1)(a0 - a1) + 2 a0 a1 u
    pub fn square(&self) -> Self {
        let a = self.c0 + self.c1;
        let b = self.c0 - self.c1;
        let c = self.c0 * self.c1;
        Self::new(a * b, c.double())
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.c0, -self.c1)
    }

    /// Multiply by the sextic non-residue xi = 9 + u
    pub fn mul_by_nonresidue(&self) -> Self {
        let nine = |x: Fq| x.double().double().double() + x;
        Self::new(nine(self.c0) - self.c1, self.c0 + nine(self.c1))
    }

    /// Scale both coefficients by a base field element
    pub fn mul_by_fq(&self, k: &Fq) -> Self {
        Self::new(self.c0 * *k, self.c1 * *k)
    }

    pub fn invert(&self) -> Option<Self> {
        let norm = self.c0.square() + self.c1.square();
        let t = norm.invert()?;
        Some(Self::new(self.c0 * t, -(self.c1 * t)))
    }

    /// x -> x^(q^power); conjugation for odd powers
    pub fn frobenius_map(&self, power: usize) -> Self {
        let c1 = Fq::conditional_select(&self.c1, &-self.c1, power % 2 == 1);
        Self::new(self.c0, c1)
    }

    pub fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self {
        Self::new(
            Fq::conditional_select(&a.c0, &b.c0, choice),
            Fq::conditional_select(&a.c1, &b.c1, choice),
        )
    }

    /// Wire encoding: imaginary part first (EIP-197)
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.c1.to_bytes());
        out[32..].copy_from_slice(&self.c0.to_bytes());
        out
    }
}

impl Add for Fq2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.c0 + rhs.c0, self.c1 + rhs.c1)
    }
}

impl Sub for Fq2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.c0 - rhs.c0, self.c1 - rhs.c1)
    }
}

impl Mul for Fq2 {
    type Output = Self;
    /// Karatsuba: three base field multiplications
    fn mul(self, rhs: Self) -> Self {
        let aa = self.c0 * rhs.c0;
        let bb = self.c1 * rhs.c1;
        let cross = (self.c0 + self.c1) * (rhs.c0 + rhs.c1);
        Self::new(aa - bb, cross - aa - bb)
    }
}

impl Neg for Fq2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.c0, -self.c1)
    }
}

impl Zeroize for Fq2 {
    fn zeroize(&mut self) {
        self.c0.zeroize();
        self.c1.zeroize();
    }
}

impl Field for Fq2 {
    const ZERO: Self = Self::new(Fq::ZERO, Fq::ZERO);
    const ONE: Self = Self::new(Fq::ONE, Fq::ZERO);

    fn is_zero(&self) -> bool {
        Fq2::is_zero(self)
    }
    fn square(&self) -> Self {
        Fq2::square(self)
    }
    fn double(&self) -> Self {
        Fq2::double(self)
    }
    fn invert(&self) -> Option<Self> {
        Fq2::invert(self)
    }
    fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self {
        Fq2::conditional_select(a, b, choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fq2 {
        Fq2::new(Fq::from_u64(123456789), Fq::from_u64(987654321))
    }

    #[test]
    fn test_u_squared_is_minus_one() {
        let u = Fq2::new(Fq::ZERO, Fq::ONE);
        assert_eq!(u.square(), -Fq2::ONE);
    }

    #[test]
    fn test_square_matches_mul() {
        let a = sample();
        assert_eq!(a.square(), a * a);
    }

    #[test]
    fn test_nonresidue_matches_mul() {
        let xi = Fq2::new(Fq::from_u64(9), Fq::ONE);
        let a = sample();
        assert_eq!(a.mul_by_nonresidue(), a * xi);
    }

    #[test]
    fn test_invert() {
        let a = sample();
        assert_eq!(a * a.invert().unwrap(), Fq2::ONE);
        assert!(Fq2::ZERO.invert().is_none());
    }

    #[test]
    fn test_frobenius_is_conjugation() {
        let a = sample();
        assert_eq!(a.frobenius_map(1), a.conjugate());
        assert_eq!(a.frobenius_map(2), a);
        // Frobenius is a field automorphism
        let b = a.square() + Fq2::ONE;
        assert_eq!((a * b).frobenius_map(1), a.frobenius_map(1) * b.frobenius_map(1));
    }
}
