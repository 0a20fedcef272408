//! Prime field arithmetic for BN254
//!
//! Both the scalar field Fr (order r) and the base field Fq (order q) are
//! `Fp<P>` with 4 x 64-bit little-endian limbs in Montgomery form. Every
//! operation runs in data-independent time: reductions use masks, never
//! branches on element values.
//!
//! Multiplication is CIOS Montgomery. The portable path uses u128
//! multiply-with-carry and is a `const fn`, so curve and tower constants are
//! converted at compile time. With the `asm` feature on an x86_64 target
//! built with `bmi2` and `adx`, runtime multiplication goes through
//! `mulx`/`adcx` intrinsics instead.

use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use zeroize::Zeroize;

use crate::arena::Arena;
use crate::errors::{ArenaError, FieldError};

/// Modulus and Montgomery constants for one prime field
pub trait FieldParams: 'static + Copy + Eq + Send + Sync + fmt::Debug {
    const NAME: &'static str;
    /// Modulus, little-endian limbs
    const MODULUS: [u64; 4];
    /// 2^256 mod modulus (Montgomery one)
    const R: [u64; 4];
    /// 2^512 mod modulus
    const R2: [u64; 4];
    /// -modulus^{-1} mod 2^64
    const INV: u64;
    /// Fermat inversion exponent
    const MODULUS_MINUS_TWO: [u64; 4];
}

/// BN254 base field parameters
/// q = 21888242871839275222246405745257275088696311157297823662689037894645226208583
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FqParams;

impl FieldParams for FqParams {
    const NAME: &'static str = "Fq";
    const MODULUS: [u64; 4] = [
        0x3c208c16d87cfd47,
        0x97816a916871ca8d,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
    const R: [u64; 4] = [
        0xd35d438dc58f0d9d,
        0x0a78eb28f5c70b3d,
        0x666ea36f7879462c,
        0x0e0a77c19a07df2f,
    ];
    const R2: [u64; 4] = [
        0xf32cfc5b538afa89,
        0xb5e71911d44501fb,
        0x47ab1eff0a417ff6,
        0x06d89f71cab8351f,
    ];
    const INV: u64 = 0x87d20782e4866389;
    const MODULUS_MINUS_TWO: [u64; 4] = [
        0x3c208c16d87cfd45,
        0x97816a916871ca8d,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
}

/// BN254 scalar field parameters
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrParams;

impl FieldParams for FrParams {
    const NAME: &'static str = "Fr";
    const MODULUS: [u64; 4] = [
        0x43e1f593f0000001,
        0x2833e84879b97091,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
    const R: [u64; 4] = [
        0xac96341c4ffffffb,
        0x36fc76959f60cd29,
        0x666ea36f7879462e,
        0x0e0a77c19a07df2f,
    ];
    const R2: [u64; 4] = [
        0x1bb8e645ae216da7,
        0x53fe3ab1e35c59e3,
        0x8c49833d53bb8085,
        0x0216d0b17f4e44a5,
    ];
    const INV: u64 = 0xc2e1f593efffffff;
    const MODULUS_MINUS_TWO: [u64; 4] = [
        0x43e1f593efffffff,
        0x2833e84879b97091,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
}

/// Element of the prime field described by `P`, in Montgomery form
#[derive(Clone, Copy)]
pub struct Fp<P: FieldParams> {
    limbs: [u64; 4],
    _params: PhantomData<P>,
}

/// Base field element
pub type Fq = Fp<FqParams>;

/// Scalar field element
pub type Fr = Fp<FrParams>;

/// Operations the curve and tower code need from any field
pub trait Field:
    Copy
    + PartialEq
    + fmt::Debug
    + Send
    + Sync
    + Zeroize
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn is_zero(&self) -> bool;
    fn square(&self) -> Self;
    fn double(&self) -> Self;
    fn invert(&self) -> Option<Self>;
    /// Returns `b` when `choice` is set, `a` otherwise, without branching.
    fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self;
}

// ---------------------------------------------------------------------------
// Limb primitives
// ---------------------------------------------------------------------------

/// a + b + carry, returning (sum, carry)
#[inline(always)]
const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// a - b - borrow, where borrow is 0 or all ones; returns (diff, borrow)
#[inline(always)]
const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub((b as u128) + ((borrow >> 63) as u128));
    (t as u64, (t >> 64) as u64)
}

/// a + b * c + carry, returning (low, high)
#[inline(always)]
const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) * (c as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// Subtract `m` from the 320-bit value `hi:v` if it is >= m.
#[inline(always)]
const fn reduce_once(v: [u64; 4], hi: u64, m: &[u64; 4]) -> [u64; 4] {
    let (d0, b) = sbb(v[0], m[0], 0);
    let (d1, b) = sbb(v[1], m[1], b);
    let (d2, b) = sbb(v[2], m[2], b);
    let (d3, b) = sbb(v[3], m[3], b);
    let (_, b) = sbb(hi, 0, b);
    // b is all ones when v < m
    [
        (v[0] & b) | (d0 & !b),
        (v[1] & b) | (d1 & !b),
        (v[2] & b) | (d2 & !b),
        (v[3] & b) | (d3 & !b),
    ]
}

#[inline(always)]
const fn add_mod(a: &[u64; 4], b: &[u64; 4], m: &[u64; 4]) -> [u64; 4] {
    let (d0, c) = adc(a[0], b[0], 0);
    let (d1, c) = adc(a[1], b[1], c);
    let (d2, c) = adc(a[2], b[2], c);
    let (d3, c) = adc(a[3], b[3], c);
    reduce_once([d0, d1, d2, d3], c, m)
}

#[inline(always)]
const fn sub_mod(a: &[u64; 4], b: &[u64; 4], m: &[u64; 4]) -> [u64; 4] {
    let (d0, borrow) = sbb(a[0], b[0], 0);
    let (d1, borrow) = sbb(a[1], b[1], borrow);
    let (d2, borrow) = sbb(a[2], b[2], borrow);
    let (d3, borrow) = sbb(a[3], b[3], borrow);
    // add the modulus back when the subtraction wrapped
    let (d0, c) = adc(d0, m[0] & borrow, 0);
    let (d1, c) = adc(d1, m[1] & borrow, c);
    let (d2, c) = adc(d2, m[2] & borrow, c);
    let (d3, _) = adc(d3, m[3] & borrow, c);
    [d0, d1, d2, d3]
}

/// CIOS Montgomery multiplication, parameterised over the word primitives.
macro_rules! montgomery_mul {
    ($a:expr, $b:expr, $m:expr, $inv:expr, $mac:ident, $adc:ident) => {{
        let a: &[u64; 4] = $a;
        let b: &[u64; 4] = $b;
        let m: &[u64; 4] = $m;
        let inv: u64 = $inv;
        let mut t = [0u64; 6];
        let mut i = 0;
        while i < 4 {
            let mut carry = 0u64;
            let mut j = 0;
            while j < 4 {
                let (lo, hi) = $mac(t[j], a[j], b[i], carry);
                t[j] = lo;
                carry = hi;
                j += 1;
            }
            let (lo, hi) = $adc(t[4], carry, 0);
            t[4] = lo;
            t[5] = hi;

            let k = t[0].wrapping_mul(inv);
            let (_, mut carry) = $mac(t[0], k, m[0], 0);
            let mut j = 1;
            while j < 4 {
                let (lo, hi) = $mac(t[j], k, m[j], carry);
                t[j - 1] = lo;
                carry = hi;
                j += 1;
            }
            let (lo, hi) = $adc(t[4], carry, 0);
            t[3] = lo;
            t[4] = t[5] + hi;
            i += 1;
        }
        reduce_once([t[0], t[1], t[2], t[3]], t[4], m)
    }};
}

/// Portable Montgomery product a * b * 2^-256 mod m.
///
/// Accepts any 256-bit `a` as long as `b < m`, which `from_raw` relies on.
pub(crate) const fn mont_mul(a: &[u64; 4], b: &[u64; 4], m: &[u64; 4], inv: u64) -> [u64; 4] {
    montgomery_mul!(a, b, m, inv, mac, adc)
}

#[cfg(all(
    feature = "asm",
    target_arch = "x86_64",
    target_feature = "bmi2",
    target_feature = "adx"
))]
pub(crate) mod x86 {
    use super::reduce_once;
    use core::arch::x86_64::{_addcarry_u64, _mulx_u64};

    #[inline(always)]
    fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
        let mut out = 0u64;
        // SAFETY: adx is enabled for this build; carry is 0 or 1.
        let c = unsafe { _addcarry_u64(carry as u8, a, b, &mut out) };
        (out, c as u64)
    }

    #[inline(always)]
    fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
        let mut hi = 0u64;
        // SAFETY: bmi2 and adx are enabled for this build.
        unsafe {
            let lo = _mulx_u64(b, c, &mut hi);
            let mut t = 0u64;
            let c1 = _addcarry_u64(0, lo, a, &mut t);
            let mut out = 0u64;
            let c2 = _addcarry_u64(0, t, carry, &mut out);
            (out, hi + c1 as u64 + c2 as u64)
        }
    }

    pub(crate) fn mont_mul(a: &[u64; 4], b: &[u64; 4], m: &[u64; 4], inv: u64) -> [u64; 4] {
        montgomery_mul!(a, b, m, inv, mac, adc)
    }
}

#[inline(always)]
fn mul_limbs<P: FieldParams>(a: &[u64; 4], b: &[u64; 4]) -> [u64; 4] {
    #[cfg(all(
        feature = "asm",
        target_arch = "x86_64",
        target_feature = "bmi2",
        target_feature = "adx"
    ))]
    {
        x86::mont_mul(a, b, &P::MODULUS, P::INV)
    }
    #[cfg(not(all(
        feature = "asm",
        target_arch = "x86_64",
        target_feature = "bmi2",
        target_feature = "adx"
    )))]
    {
        mont_mul(a, b, &P::MODULUS, P::INV)
    }
}

/// Convert 32-byte big-endian to 4 x u64 limbs (little-endian limbs)
#[inline]
pub fn limbs_from_be(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let start = 24 - 8 * i;
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[start..start + 8]);
        *limb = u64::from_be_bytes(word);
    }
    limbs
}

/// Convert 4 x u64 limbs (little-endian) to 32-byte big-endian
#[inline]
pub fn limbs_to_be(limbs: &[u64; 4]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, limb) in limbs.iter().enumerate() {
        let start = 24 - 8 * i;
        out[start..start + 8].copy_from_slice(&limb.to_be_bytes());
    }
    out
}

/// Wipe a buffer with volatile writes the optimiser cannot elide.
pub fn secure_zero(buf: &mut [u8]) {
    buf.zeroize();
}

// ---------------------------------------------------------------------------
// Fp
// ---------------------------------------------------------------------------

impl<P: FieldParams> Fp<P> {
    pub const ZERO: Self = Self::from_mont([0; 4]);
    pub const ONE: Self = Self::from_mont(P::R);

    const fn from_mont(limbs: [u64; 4]) -> Self {
        Self {
            limbs,
            _params: PhantomData,
        }
    }

    /// Element from canonical little-endian limbs. Values >= modulus are
    /// reduced, so this also serves as a 256-bit reduction.
    pub const fn from_raw(limbs: [u64; 4]) -> Self {
        Self::from_mont(mont_mul(&limbs, &P::R2, &P::MODULUS, P::INV))
    }

    pub const fn from_u64(value: u64) -> Self {
        Self::from_raw([value, 0, 0, 0])
    }

    /// Decode a canonical big-endian element, rejecting values >= modulus.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, FieldError> {
        let limbs = limbs_from_be(bytes);
        let (_, b) = sbb(limbs[0], P::MODULUS[0], 0);
        let (_, b) = sbb(limbs[1], P::MODULUS[1], b);
        let (_, b) = sbb(limbs[2], P::MODULUS[2], b);
        let (_, b) = sbb(limbs[3], P::MODULUS[3], b);
        // no borrow means limbs >= modulus
        if b == 0 {
            return Err(FieldError::NotCanonical);
        }
        Ok(Self::from_raw(limbs))
    }

    /// Decode from a slice that must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FieldError> {
        let array: &[u8; 32] = bytes.try_into().map_err(|_| FieldError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Self::from_bytes(array)
    }

    /// Reduce an arbitrary 256-bit big-endian value.
    pub fn from_be_bytes_mod_order(bytes: &[u8; 32]) -> Self {
        Self::from_raw(limbs_from_be(bytes))
    }

    /// Canonical (non-Montgomery) little-endian limbs
    pub fn to_canonical(&self) -> [u64; 4] {
        mul_limbs::<P>(&self.limbs, &[1, 0, 0, 0])
    }

    /// Canonical 32-byte big-endian encoding
    pub fn to_bytes(&self) -> [u8; 32] {
        limbs_to_be(&self.to_canonical())
    }

    pub fn is_zero(&self) -> bool {
        (self.limbs[0] | self.limbs[1] | self.limbs[2] | self.limbs[3]) == 0
    }

    /// Constant-time equality
    pub fn ct_eq(&self, other: &Self) -> bool {
        let diff = (self.limbs[0] ^ other.limbs[0])
            | (self.limbs[1] ^ other.limbs[1])
            | (self.limbs[2] ^ other.limbs[2])
            | (self.limbs[3] ^ other.limbs[3]);
        diff == 0
    }

    /// Returns `b` when `choice` is set, `a` otherwise.
    #[inline]
    pub fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self {
        let mask = 0u64.wrapping_sub(choice as u64);
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            *limb = (a.limbs[i] & !mask) | (b.limbs[i] & mask);
        }
        Self::from_mont(limbs)
    }

    #[inline]
    pub fn double(&self) -> Self {
        Self::from_mont(add_mod(&self.limbs, &self.limbs, &P::MODULUS))
    }

    #[inline]
    pub fn square(&self) -> Self {
        Self::from_mont(mul_limbs::<P>(&self.limbs, &self.limbs))
    }

    /// Fixed-length exponentiation: every bit of `exp` costs one square and
    /// one multiply.
    pub fn pow(&self, exp: &[u64; 4]) -> Self {
        let mut res = Self::ONE;
        for limb in exp.iter().rev() {
            for i in (0..64).rev() {
                res = res.square();
                let prod = res * *self;
                res = Self::conditional_select(&res, &prod, (limb >> i) & 1 == 1);
            }
        }
        res
    }

    /// Multiplicative inverse via Fermat; `None` for zero.
    pub fn invert(&self) -> Option<Self> {
        let inv = self.pow(&P::MODULUS_MINUS_TWO);
        if self.is_zero() {
            None
        } else {
            Some(inv)
        }
    }
}

/// Invert every non-zero element in place with one field inversion.
///
/// Zeros stay zero. Prefix products are allocated from `arena` and wiped
/// before returning; the caller's scope releases them.
pub fn batch_invert<F: Field>(elems: &mut [F], arena: &Arena) -> Result<(), ArenaError> {
    let prefix = arena.alloc_slice(elems.len(), F::ONE)?;

    let mut acc = F::ONE;
    for (e, p) in elems.iter().zip(prefix.iter_mut()) {
        *p = acc;
        acc = F::conditional_select(&(acc * *e), &acc, e.is_zero());
    }

    // acc is a product of non-zero elements
    let Some(mut inv) = acc.invert() else {
        prefix.iter_mut().for_each(Zeroize::zeroize);
        return Ok(());
    };
    for (e, p) in elems.iter_mut().zip(prefix.iter()).rev() {
        let is_zero = e.is_zero();
        let next = inv * *e;
        let out = inv * *p;
        *e = F::conditional_select(&out, &F::ZERO, is_zero);
        inv = F::conditional_select(&next, &inv, is_zero);
    }
    prefix.iter_mut().for_each(Zeroize::zeroize);
    inv.zeroize();
    Ok(())
}

impl<P: FieldParams> Field for Fp<P> {
    const ZERO: Self = Self::from_mont([0; 4]);
    const ONE: Self = Self::from_mont(P::R);

    fn is_zero(&self) -> bool {
        Fp::is_zero(self)
    }
    fn square(&self) -> Self {
        Fp::square(self)
    }
    fn double(&self) -> Self {
        Fp::double(self)
    }
    fn invert(&self) -> Option<Self> {
        Fp::invert(self)
    }
    fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self {
        Fp::conditional_select(a, b, choice)
    }
}

impl<P: FieldParams> Add for Fp<P> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from_mont(add_mod(&self.limbs, &rhs.limbs, &P::MODULUS))
    }
}

impl<P: FieldParams> Sub for Fp<P> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from_mont(sub_mod(&self.limbs, &rhs.limbs, &P::MODULUS))
    }
}

impl<P: FieldParams> Mul for Fp<P> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from_mont(mul_limbs::<P>(&self.limbs, &rhs.limbs))
    }
}

impl<P: FieldParams> Neg for Fp<P> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::from_mont(sub_mod(&[0; 4], &self.limbs, &P::MODULUS))
    }
}

impl<P: FieldParams> AddAssign for Fp<P> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<P: FieldParams> SubAssign for Fp<P> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<P: FieldParams> MulAssign for Fp<P> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<P: FieldParams> PartialEq for Fp<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other)
    }
}

impl<P: FieldParams> Eq for Fp<P> {}

impl<P: FieldParams> Default for Fp<P> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<P: FieldParams> Zeroize for Fp<P> {
    fn zeroize(&mut self) {
        self.limbs.zeroize();
    }
}

impl<P: FieldParams> fmt::Display for Fp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.to_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl<P: FieldParams> fmt::Debug for Fp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", P::NAME, self)
    }
}
