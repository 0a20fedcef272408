//! BN254 groups G1 (over Fq) and G2 (over Fq2, sextic twist)
//!
//! Both curves are y^2 = x^3 + b with a = 0. Projective arithmetic uses the
//! complete homogeneous formulas of Renes, Costello and Batina (2015,
//! algorithms 7 and 9), so addition has no special cases for the identity
//! or for doubling. Scalar multiplication is a Montgomery ladder over all
//! 256 scalar bits with constant-time swaps.
//!
//! ## Encoding
//! - G1: `x || y`, 32-byte big-endian coordinates (64 bytes)
//! - G2: `x.c1 || x.c0 || y.c1 || y.c0` (128 bytes, EIP-197 ordering)
//! - all-zero bytes encode the point at infinity
//!
//! Decoding validates range, curve equation and subgroup membership, in that
//! order, and never yields a partially checked point.

use core::fmt;
use core::marker::PhantomData;

use crate::arena::Arena;
use crate::errors::{ArenaError, PointError};
use crate::field::{batch_invert, Field, Fq, Fr};
use crate::fq2::Fq2;
use crate::types::{G1Bytes, G2Bytes};

/// Coordinate field with a fixed-size big-endian encoding
pub trait Coordinate: Field {
    /// Encoded size in bytes
    const SIZE: usize;

    fn read(bytes: &[u8]) -> Result<Self, PointError>;
    fn write(&self, out: &mut [u8]);
}

impl Coordinate for Fq {
    const SIZE: usize = 32;

    fn read(bytes: &[u8]) -> Result<Self, PointError> {
        Fq::from_slice(bytes).map_err(|_| PointError::CoordinateOutOfRange)
    }

    fn write(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bytes());
    }
}

impl Coordinate for Fq2 {
    const SIZE: usize = 64;

    fn read(bytes: &[u8]) -> Result<Self, PointError> {
        if bytes.len() != 64 {
            return Err(PointError::CoordinateOutOfRange);
        }
        // imaginary part first
        let c1 = Fq::read(&bytes[..32])?;
        let c0 = Fq::read(&bytes[32..])?;
        Ok(Fq2::new(c0, c1))
    }

    fn write(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bytes());
    }
}

/// Curve constants and the group-specific subgroup test
pub trait CurveParams: 'static + Copy + Eq + Send + Sync + fmt::Debug {
    type Base: Coordinate;

    const NAME: &'static str;
    const B: Self::Base;
    /// 3 * b, used by the complete formulas
    const B3: Self::Base;
    const GENERATOR_X: Self::Base;
    const GENERATOR_Y: Self::Base;

    /// Whether an on-curve point lies in the order-r subgroup
    fn is_torsion_free(p: &Projective<Self>) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G1Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G2Params;

impl CurveParams for G1Params {
    type Base = Fq;

    const NAME: &'static str = "G1";
    const B: Fq = Fq::from_u64(3);
    const B3: Fq = Fq::from_u64(9);
    const GENERATOR_X: Fq = Fq::from_u64(1);
    const GENERATOR_Y: Fq = Fq::from_u64(2);

    /// Cofactor 1: every curve point is in the subgroup.
    fn is_torsion_free(_p: &Projective<Self>) -> bool {
        true
    }
}

impl CurveParams for G2Params {
    type Base = Fq2;

    const NAME: &'static str = "G2";
    /// b' = 3 / (9 + u)
    const B: Fq2 = Fq2::from_raw(
        [0x3267e6dc24a138e5, 0xb5b4c5e559dbefa3, 0x81be18991be06ac3, 0x2b149d40ceb8aaae],
        [0xe4a2bd0685c315d2, 0xa74fa084e52d1852, 0xcd2cafadeed8fdf4, 0x009713b03af0fed4],
    );
    const B3: Fq2 = Fq2::from_raw(
        [0x1ef69c66bce9b021, 0xf21b7c8d3cb039cf, 0x1499be5e509e8f8f, 0x20753adca9c6bfb8],
        [0xade8371391494176, 0xf5eee18eaf8748f8, 0x67860f09cc8af9dd, 0x01c53b10b0d2fc7e],
    );
    const GENERATOR_X: Fq2 = Fq2::from_raw(
        [0x46debd5cd992f6ed, 0x674322d4f75edadd, 0x426a00665e5c4479, 0x1800deef121f1e76],
        [0x97e485b7aef312c2, 0xf1aa493335a9e712, 0x7260bfb731fb5d25, 0x198e9393920d483a],
    );
    const GENERATOR_Y: Fq2 = Fq2::from_raw(
        [0x4ce6cc0166fa7daa, 0xe3d1e7690c43d37b, 0x4aab71808dcb408f, 0x12c85ea5db8c6deb],
        [0x55acdadcd122975b, 0xbc4b313370b38ef3, 0xec9e99ad690c3395, 0x090689d0585ff075],
    );

    /// psi(P) == [6x^2] P
    fn is_torsion_free(p: &Projective<Self>) -> bool {
        p.psi() == p.mul_vartime(&SIX_X_SQUARED)
    }
}

/// 6x^2 for the BN parameter x = 4965661367192848881
const SIX_X_SQUARED: [u64; 2] = [0xf83e9682e87cfd46, 0x6f4d8248eeb859fb];

/// xi^((q - 1) / 3): Frobenius twist factor for x
const PSI_COEFF_X: Fq2 = Fq2::from_raw(
    [0x99e39557176f553d, 0xb78cc310c2c3330c, 0x4c0bec3cf559b143, 0x2fb347984f7911f7],
    [0x1665d51c640fcba2, 0x32ae2a1d0b7c9dce, 0x4ba4cc8bd75a0794, 0x16c9e55061ebae20],
);

/// xi^((q - 1) / 2): Frobenius twist factor for y
const PSI_COEFF_Y: Fq2 = Fq2::from_raw(
    [0xdc54014671a0135a, 0xdbaae0eda9c95998, 0xdc5ec698b6e2f9b9, 0x063cf305489af5dc],
    [0x82d37f632623b0e3, 0x21807dc98fa25bd2, 0x0704b5a7ec796f2b, 0x07c03cbcac41049a],
);

// ---------------------------------------------------------------------------
// Affine
// ---------------------------------------------------------------------------

/// Affine point; the identity has `infinity` set and zero coordinates
#[derive(Clone, Copy)]
pub struct Affine<C: CurveParams> {
    pub x: C::Base,
    pub y: C::Base,
    pub infinity: bool,
}

pub type G1Affine = Affine<G1Params>;
pub type G2Affine = Affine<G2Params>;

impl<C: CurveParams> Affine<C> {
    pub fn identity() -> Self {
        Self {
            x: C::Base::ZERO,
            y: C::Base::ZERO,
            infinity: true,
        }
    }

    pub fn generator() -> Self {
        Self {
            x: C::GENERATOR_X,
            y: C::GENERATOR_Y,
            infinity: false,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.infinity
    }

    /// y^2 = x^3 + b (the identity counts as on the curve)
    pub fn is_on_curve(&self) -> bool {
        let lhs = self.y.square();
        let rhs = self.x.square() * self.x + C::B;
        self.infinity | (lhs == rhs)
    }

    /// Subgroup membership; meaningful only for on-curve points
    pub fn is_in_subgroup(&self) -> bool {
        C::is_torsion_free(&self.to_projective())
    }

    pub fn to_projective(&self) -> Projective<C> {
        Projective {
            x: self.x,
            y: C::Base::conditional_select(&self.y, &C::Base::ONE, self.infinity),
            z: C::Base::conditional_select(&C::Base::ONE, &C::Base::ZERO, self.infinity),
            _curve: PhantomData,
        }
    }

    /// Decode coordinates without the curve or subgroup checks.
    ///
    /// Only canonical coordinates are accepted. Used for diagnostics and to
    /// test the checks themselves; protocol code goes through `from_bytes`.
    pub fn from_bytes_unchecked(bytes: &[u8]) -> Result<Self, PointError> {
        let size = C::Base::SIZE;
        if bytes.len() != 2 * size {
            return Err(PointError::InvalidLength {
                expected: 2 * size,
                actual: bytes.len(),
            });
        }
        if bytes.iter().all(|&b| b == 0) {
            return Ok(Self::identity());
        }
        Ok(Self {
            x: C::Base::read(&bytes[..size])?,
            y: C::Base::read(&bytes[size..])?,
            infinity: false,
        })
    }

    /// Decode and fully validate a point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        let point = Self::from_bytes_unchecked(bytes)?;
        if !point.is_on_curve() {
            return Err(PointError::NotOnCurve);
        }
        if !point.is_in_subgroup() {
            return Err(PointError::NotInSubgroup);
        }
        Ok(point)
    }

    /// Encode into `out`, which must be `2 * Base::SIZE` bytes.
    pub fn write_bytes(&self, out: &mut [u8]) {
        let size = C::Base::SIZE;
        if self.infinity {
            out.fill(0);
            return;
        }
        self.x.write(&mut out[..size]);
        self.y.write(&mut out[size..2 * size]);
    }
}

impl Affine<G1Params> {
    pub fn to_bytes(&self) -> G1Bytes {
        let mut out = [0u8; 64];
        self.write_bytes(&mut out);
        out
    }
}

impl Affine<G2Params> {
    pub fn to_bytes(&self) -> G2Bytes {
        let mut out = [0u8; 128];
        self.write_bytes(&mut out);
        out
    }
}

impl<C: CurveParams> core::ops::Neg for Affine<C> {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: self.x,
            y: C::Base::conditional_select(&-self.y, &self.y, self.infinity),
            infinity: self.infinity,
        }
    }
}

impl<C: CurveParams> PartialEq for Affine<C> {
    fn eq(&self, other: &Self) -> bool {
        (self.infinity & other.infinity)
            | (!self.infinity & !other.infinity & (self.x == other.x) & (self.y == other.y))
    }
}

impl<C: CurveParams> Eq for Affine<C> {}

impl<C: CurveParams> Default for Affine<C> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<C: CurveParams> fmt::Debug for Affine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinity {
            write!(f, "{}(infinity)", C::NAME)
        } else {
            write!(f, "{}({:?}, {:?})", C::NAME, self.x, self.y)
        }
    }
}

// ---------------------------------------------------------------------------
// Projective
// ---------------------------------------------------------------------------

/// Homogeneous projective point (X : Y : Z), x = X/Z, y = Y/Z
#[derive(Clone, Copy)]
pub struct Projective<C: CurveParams> {
    pub(crate) x: C::Base,
    pub(crate) y: C::Base,
    pub(crate) z: C::Base,
    _curve: PhantomData<C>,
}

pub type G1Projective = Projective<G1Params>;
pub type G2Projective = Projective<G2Params>;

impl<C: CurveParams> Projective<C> {
    pub(crate) fn new(x: C::Base, y: C::Base, z: C::Base) -> Self {
        Self {
            x,
            y,
            z,
            _curve: PhantomData,
        }
    }

    /// (0 : 1 : 0)
    pub fn identity() -> Self {
        Self::new(C::Base::ZERO, C::Base::ONE, C::Base::ZERO)
    }

    pub fn generator() -> Self {
        Affine::<C>::generator().to_projective()
    }

    pub fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    pub fn to_affine(&self) -> Affine<C> {
        match self.z.invert() {
            Some(zinv) => Affine {
                x: self.x * zinv,
                y: self.y * zinv,
                infinity: false,
            },
            None => Affine::identity(),
        }
    }

    /// Complete addition (RCB algorithm 7, a = 0)
    pub fn add(&self, rhs: &Self) -> Self {
        let t0 = self.x * rhs.x;
        let t1 = self.y * rhs.y;
        let t2 = self.z * rhs.z;
        let t3 = (self.x + self.y) * (rhs.x + rhs.y);
        let t4 = t0 + t1;
        let t3 = t3 - t4;
        let t4 = (self.y + self.z) * (rhs.y + rhs.z);
        let x3 = t1 + t2;
        let t4 = t4 - x3;
        let x3 = (self.x + self.z) * (rhs.x + rhs.z);
        let y3 = t0 + t2;
        let y3 = x3 - y3;
        let x3 = t0 + t0;
        let t0 = x3 + t0;
        let t2 = C::B3 * t2;
        let z3 = t1 + t2;
        let t1 = t1 - t2;
        let y3 = C::B3 * y3;
        let x3 = t4 * y3;
        let t2 = t3 * t1;
        let x3 = t2 - x3;
        let y3 = y3 * t0;
        let t1 = t1 * z3;
        let y3 = t1 + y3;
        let t0 = t0 * t3;
        let z3 = z3 * t4;
        let z3 = z3 + t0;
        Self::new(x3, y3, z3)
    }

    pub fn add_affine(&self, rhs: &Affine<C>) -> Self {
        self.add(&rhs.to_projective())
    }

    /// Complete doubling (RCB algorithm 9, a = 0)
    pub fn double(&self) -> Self {
        let t0 = self.y.square();
        let z3 = t0.double().double().double();
        let t1 = self.y * self.z;
        let t2 = C::B3 * self.z.square();
        let x3 = t2 * z3;
        let y3 = t0 + t2;
        let z3 = t1 * z3;
        let t1 = t2.double();
        let t2 = t1 + t2;
        let t0 = t0 - t2;
        let y3 = t0 * y3;
        let y3 = x3 + y3;
        let t1 = self.x * self.y;
        let x3 = (t0 * t1).double();
        Self::new(x3, y3, z3)
    }

    pub fn neg(&self) -> Self {
        Self::new(self.x, -self.y, self.z)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    pub fn conditional_select(a: &Self, b: &Self, choice: bool) -> Self {
        Self::new(
            C::Base::conditional_select(&a.x, &b.x, choice),
            C::Base::conditional_select(&a.y, &b.y, choice),
            C::Base::conditional_select(&a.z, &b.z, choice),
        )
    }

    fn conditional_swap(a: &mut Self, b: &mut Self, choice: bool) {
        let new_a = Self::conditional_select(a, b, choice);
        let new_b = Self::conditional_select(b, a, choice);
        *a = new_a;
        *b = new_b;
    }

    /// Constant-time scalar multiplication (Montgomery ladder, 256 steps)
    pub fn mul(&self, scalar: &Fr) -> Self {
        let bits = scalar.to_canonical();
        let mut r0 = Self::identity();
        let mut r1 = *self;
        let mut swapped = false;
        for i in (0..256).rev() {
            let bit = (bits[i / 64] >> (i % 64)) & 1 == 1;
            Self::conditional_swap(&mut r0, &mut r1, swapped ^ bit);
            swapped = bit;
            r1 = r0.add(&r1);
            r0 = r0.double();
        }
        Self::conditional_swap(&mut r0, &mut r1, swapped);
        r0
    }

    /// Double-and-add by a public little-endian multi-limb scalar
    pub fn mul_vartime(&self, limbs: &[u64]) -> Self {
        let mut acc = Self::identity();
        for limb in limbs.iter().rev() {
            for i in (0..64).rev() {
                acc = acc.double();
                if (limb >> i) & 1 == 1 {
                    acc = acc.add(self);
                }
            }
        }
        acc
    }

    /// Normalize many points with a single inversion.
    ///
    /// `out` must be at least as long as `points`. Scratch comes from `arena`.
    pub fn batch_normalize(
        points: &[Self],
        out: &mut [Affine<C>],
        arena: &Arena,
    ) -> Result<(), ArenaError> {
        let zs = arena.alloc_slice(points.len(), C::Base::ZERO)?;
        for (z, p) in zs.iter_mut().zip(points) {
            *z = p.z;
        }
        batch_invert(zs, arena)?;
        for ((o, p), zinv) in out.iter_mut().zip(points).zip(zs.iter()) {
            *o = if p.is_identity() {
                Affine::identity()
            } else {
                Affine {
                    x: p.x * *zinv,
                    y: p.y * *zinv,
                    infinity: false,
                }
            };
        }
        Ok(())
    }
}

impl Projective<G2Params> {
    /// Untwist-Frobenius-twist endomorphism
    pub fn psi(&self) -> Self {
        Self::new(
            self.x.conjugate() * PSI_COEFF_X,
            self.y.conjugate() * PSI_COEFF_Y,
            self.z.conjugate(),
        )
    }
}

impl<C: CurveParams> PartialEq for Projective<C> {
    /// Cross-multiplied comparison; all identity representations are equal.
    fn eq(&self, other: &Self) -> bool {
        (self.x * other.z == other.x * self.z) & (self.y * other.z == other.y * self.z)
    }
}

impl<C: CurveParams> Eq for Projective<C> {}

impl<C: CurveParams> fmt::Debug for Projective<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_affine(), f)
    }
}

impl<C: CurveParams> From<Affine<C>> for Projective<C> {
    fn from(p: Affine<C>) -> Self {
        p.to_projective()
    }
}

// ---------------------------------------------------------------------------
// Multi-scalar multiplication
// ---------------------------------------------------------------------------

fn msm_window(n: usize) -> usize {
    match n {
        0..=31 => 4,
        32..=255 => 6,
        _ => 8,
    }
}

fn window_digit(limbs: &[u64; 4], offset: usize, width: usize) -> usize {
    let limb = offset / 64;
    let shift = offset % 64;
    let mut v = limbs[limb] >> shift;
    if shift + width > 64 && limb + 1 < 4 {
        v |= limbs[limb + 1] << (64 - shift);
    }
    (v & ((1u64 << width) - 1)) as usize
}

/// Pippenger bucket MSM: sum of `scalars[i] * points[i]`.
///
/// Variable time. Use only on public data or freshly drawn random scalars.
/// Buckets and decoded scalars come from `arena`.
pub fn msm<C: CurveParams>(
    points: &[Affine<C>],
    scalars: &[Fr],
    arena: &Arena,
) -> Result<Projective<C>, ArenaError> {
    let n = points.len().min(scalars.len());
    if n == 0 {
        return Ok(Projective::identity());
    }
    let width = msm_window(n);
    let digits = arena.alloc_slice(n, [0u64; 4])?;
    for (d, s) in digits.iter_mut().zip(scalars) {
        *d = s.to_canonical();
    }
    let buckets = arena.alloc_slice((1 << width) - 1, Projective::<C>::identity())?;

    let windows = 256usize.div_ceil(width);
    let mut acc = Projective::identity();
    for w in (0..windows).rev() {
        for _ in 0..width {
            acc = acc.double();
        }
        buckets.fill(Projective::identity());
        for (p, d) in points[..n].iter().zip(digits.iter()) {
            let digit = window_digit(d, w * width, width);
            if digit != 0 {
                buckets[digit - 1] = buckets[digit - 1].add_affine(p);
            }
        }
        let mut running = Projective::identity();
        let mut sum = Projective::identity();
        for b in buckets.iter().rev() {
            running = running.add(b);
            sum = sum.add(&running);
        }
        acc = acc.add(&sum);
    }
    Ok(acc)
}
