//! Edwards curve point operations for Ed25519
//!
//! Points live in extended coordinates (X:Y:Z:T) on the twisted Edwards
//! curve -x^2 + y^2 = 1 + d*x^2*y^2. The addition law is the unified
//! add-2008-hwcd-3 formula (complete for all input pairs, branch-free);
//! doubling is the dedicated dbl-2008-hwcd formula.

use std::sync::OnceLock;

use crate::constants::{BASE_X, BASE_Y, CURVE_ORDER, EDWARDS_D};
use crate::error::{Error, Result};
use crate::field::{sqrt_ratio, FieldElement};
use crate::scalar::Scalar;

/// wNAF window width for fixed-base multiplication
const WINDOW_BITS: usize = 8;
/// Number of windows covering a 256-bit scalar plus its final carry
const WINDOWS: usize = 256 / WINDOW_BITS + 1;
/// Table entries per window: 1P .. 2^(W-1) P
const HALF_WINDOW: usize = 1 << (WINDOW_BITS - 1);

/// Point on the twisted Edwards curve, extended projective coordinates
///
/// Invariants: Z != 0 for every finite point, and T*Z = X*Y; both are
/// re-established by every group operation.
#[derive(Clone)]
pub struct EdwardsPoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
    t: FieldElement,
}

/// A point projected to affine coordinates
///
/// Only ever produced by [`EdwardsPoint::to_affine`]; the extended form is
/// the canonical in-memory representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: FieldElement,
    pub y: FieldElement,
}

/// Compressed 32-byte wire form: y little-endian, top bit = parity of x
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CompressedPoint {
    bytes: [u8; 32],
}

fn d() -> FieldElement {
    FieldElement::from_bytes(&EDWARDS_D)
}

fn d2() -> FieldElement {
    d().double()
}

impl EdwardsPoint {
    /// Neutral element (0, 1)
    pub fn identity() -> Self {
        EdwardsPoint {
            x: FieldElement::ZERO,
            y: FieldElement::ONE,
            z: FieldElement::ONE,
            t: FieldElement::ZERO,
        }
    }

    /// The standard Ed25519 generator B
    pub fn base() -> Self {
        let x = FieldElement::from_bytes(&BASE_X);
        let y = FieldElement::from_bytes(&BASE_Y);
        let t = x.mul(&y);
        EdwardsPoint {
            x,
            y,
            z: FieldElement::ONE,
            t,
        }
    }

    /// Lift an affine pair onto the curve, validating the curve equation
    pub fn from_affine(p: &AffinePoint) -> Result<Self> {
        let xx = p.x.square();
        let yy = p.y.square();
        let lhs = yy.sub(&xx);
        let rhs = FieldElement::ONE.add(&d().mul(&xx).mul(&yy));
        if lhs != rhs {
            return Err(Error::InvalidPoint("affine pair not on curve"));
        }
        Ok(EdwardsPoint {
            x: p.x,
            y: p.y,
            z: FieldElement::ONE,
            t: p.x.mul(&p.y),
        })
    }

    /// Unified addition, add-2008-hwcd-3 (a = -1 variant)
    ///
    /// Complete: correct for doubling and identity inputs without dispatch.
    pub fn add(&self, other: &EdwardsPoint) -> EdwardsPoint {
        let a = self.y.sub(&self.x).mul(&other.y.sub(&other.x));
        let b = self.y.add(&self.x).mul(&other.y.add(&other.x));
        let c = self.t.mul(&other.t).mul(&d2());
        let d = self.z.double().mul(&other.z);
        let e = b.sub(&a);
        let f = d.sub(&c);
        let g = d.add(&c);
        let h = b.add(&a);
        EdwardsPoint {
            x: e.mul(&f),
            y: g.mul(&h),
            z: f.mul(&g),
            t: e.mul(&h),
        }
    }

    /// Dedicated doubling, dbl-2008-hwcd (4M + 4S)
    pub fn double(&self) -> EdwardsPoint {
        let a = self.x.square();
        let b = self.y.square();
        let c = self.z.square().double();
        let d = a.neg(); // a_curve = -1
        let e = self.x.add(&self.y).square().sub(&a).sub(&b);
        let g = d.add(&b);
        let f = g.sub(&c);
        let h = d.sub(&b);
        EdwardsPoint {
            x: e.mul(&f),
            y: g.mul(&h),
            z: f.mul(&g),
            t: e.mul(&h),
        }
    }

    pub fn negate(&self) -> EdwardsPoint {
        EdwardsPoint {
            x: self.x.neg(),
            y: self.y,
            z: self.z,
            t: self.t.neg(),
        }
    }

    pub fn sub(&self, other: &EdwardsPoint) -> EdwardsPoint {
        self.add(&other.negate())
    }

    pub fn is_identity(&self) -> bool {
        *self == EdwardsPoint::identity()
    }

    /// Variable-base scalar multiplication with a fake-add decoy
    ///
    /// Fixed 256 double-and-add iterations, least significant bit first;
    /// zero bits feed the decoy accumulator instead of skipping work, so the
    /// per-bit add count does not depend on the scalar. `safe = false`
    /// drops the decoy adds and permits n = 0 (mapped to the identity);
    /// n >= l is rejected in both modes.
    pub fn mul(&self, n: &Scalar, safe: bool) -> Result<EdwardsPoint> {
        check_scalar_range(n, safe)?;
        if n.is_zero() {
            return Ok(EdwardsPoint::identity());
        }
        Ok(self.ladder(n, safe))
    }

    /// Raw double-and-add, no range checks
    fn ladder(&self, n: &Scalar, safe: bool) -> EdwardsPoint {
        let mut acc = EdwardsPoint::identity();
        let mut decoy = EdwardsPoint::base();
        let mut doubling = self.clone();
        for i in 0..256 {
            if n.bit(i) == 1 {
                acc = acc.add(&doubling);
            } else if safe {
                decoy = decoy.add(&doubling);
            }
            doubling = doubling.double();
        }
        // Keep the decoy adds observable to the optimizer
        let _ = core::hint::black_box(&decoy);
        acc
    }

    /// Fixed-base multiplication n*B through the precomputed wNAF table
    ///
    /// Runs a fixed sequence of 33 window lookups and additions determined
    /// by the window count, not by the scalar bits; zero digits add a table
    /// anchor (negated on odd windows) to the decoy accumulator. Scalar
    /// range rules match [`EdwardsPoint::mul`].
    pub fn mul_base(n: &Scalar, safe: bool) -> Result<EdwardsPoint> {
        check_scalar_range(n, safe)?;
        if n.is_zero() {
            return Ok(EdwardsPoint::identity());
        }

        let table = base_table();
        let mut acc = EdwardsPoint::identity();
        let mut decoy = EdwardsPoint::base();
        for (w, &digit) in n.wnaf_digits().iter().enumerate() {
            let offset = w * HALF_WINDOW;
            if digit == 0 {
                let mut anchor = table[offset].clone();
                if w & 1 == 1 {
                    anchor = anchor.negate();
                }
                decoy = decoy.add(&anchor);
            } else {
                let mut entry = table[offset + digit.unsigned_abs() as usize - 1].clone();
                if digit < 0 {
                    entry = entry.negate();
                }
                acc = acc.add(&entry);
            }
        }
        let _ = core::hint::black_box(&decoy);
        Ok(acc)
    }

    /// Force construction of the fixed-base table ahead of first use
    pub fn precompute() {
        let _ = base_table();
    }

    /// Multiply by the cofactor: [8]P as three doublings
    pub fn clear_cofactor(&self) -> EdwardsPoint {
        self.double().double().double()
    }

    /// True when the point's order divides the cofactor
    pub fn is_small_order(&self) -> bool {
        self.clear_cofactor().is_identity()
    }

    /// True when the point lies in the prime-order subgroup, [l]P = O
    pub fn is_torsion_free(&self) -> bool {
        self.ladder(&Scalar::from_bytes(&CURVE_ORDER), false).is_identity()
    }

    /// Project to affine coordinates
    ///
    /// Fails only on a corrupted point with Z = 0, which no group operation
    /// produces.
    pub fn to_affine(&self) -> Result<AffinePoint> {
        let recip = self.z.invert()?;
        Ok(AffinePoint {
            x: self.x.mul(&recip),
            y: self.y.mul(&recip),
        })
    }

    /// Compress to the 32-byte wire form
    pub fn compress(&self) -> Result<CompressedPoint> {
        let affine = self.to_affine()?;
        let mut bytes = affine.y.to_bytes();
        bytes[31] &= 0x7f;
        bytes[31] |= (affine.x.is_negative() as u8) << 7;
        Ok(CompressedPoint { bytes })
    }

    /// Compressed bytes, shorthand for `compress().to_bytes()`
    pub fn to_bytes(&self) -> Result<[u8; 32]> {
        Ok(self.compress()?.to_bytes())
    }

    /// Lowercase hex of the compressed form
    pub fn to_hex(&self) -> Result<String> {
        Ok(crate::codec::bytes_to_hex(&self.to_bytes()?))
    }

    #[cfg(test)]
    fn is_on_curve(&self) -> bool {
        // (-X^2 + Y^2) = Z^2 + d * X^2 * Y^2 / Z^2, plus the T invariant
        let xx = self.x.square();
        let yy = self.y.square();
        let zz = self.z.square();
        let Ok(zz_inv) = zz.invert() else {
            return false;
        };
        let lhs = yy.sub(&xx);
        let rhs = zz.add(&d().mul(&xx).mul(&yy).mul(&zz_inv));
        lhs == rhs && self.t.mul(&self.z) == self.x.mul(&self.y)
    }
}

/// Projective equality by cross-multiplication
///
/// X1*Z2 = X2*Z1 and Y1*Z2 = Y2*Z1: representations of the same affine
/// point compare equal regardless of their Z.
impl PartialEq for EdwardsPoint {
    fn eq(&self, other: &Self) -> bool {
        let x_eq = self.x.mul(&other.z) == other.x.mul(&self.z);
        let y_eq = self.y.mul(&other.z) == other.y.mul(&self.z);
        x_eq & y_eq
    }
}

impl Eq for EdwardsPoint {}

impl core::fmt::Debug for EdwardsPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.to_hex() {
            Ok(hex) => write!(f, "EdwardsPoint({})", hex),
            Err(_) => write!(f, "EdwardsPoint(<degenerate>)"),
        }
    }
}

impl CompressedPoint {
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        CompressedPoint { bytes: *bytes }
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.bytes
    }

    pub fn to_hex(self) -> String {
        crate::codec::bytes_to_hex(&self.bytes)
    }

    /// Decompress per RFC 8032 section 5.1.3
    ///
    /// `zip215 = true` accepts any y below 2^255 (non-canonical encodings
    /// included); `zip215 = false` is the strict RFC 8032 / FIPS 186-5
    /// reading: y must be canonical and the (x = 0, sign = 1) encoding is
    /// rejected.
    pub fn decode(&self, zip215: bool) -> Result<EdwardsPoint> {
        let mut y_bytes = self.bytes;
        let sign = y_bytes[31] >> 7 == 1;
        y_bytes[31] &= 0x7f;

        if !zip215 && !y_is_canonical(&y_bytes) {
            return Err(Error::InvalidPoint("y coordinate not below the field prime"));
        }

        let y = FieldElement::from_bytes(&y_bytes);
        let yy = y.square();
        let u = yy.sub(&FieldElement::ONE);
        let v = d().mul(&yy).add(&FieldElement::ONE);

        let ratio = sqrt_ratio(&u, &v);
        if !ratio.is_square {
            return Err(Error::InvalidPoint("no square root for x"));
        }
        let mut x = ratio.root;

        if !zip215 && sign && x.is_zero() {
            return Err(Error::InvalidPoint("x = 0 with sign bit set"));
        }
        if x.is_negative() != sign {
            x = x.neg();
        }

        let t = x.mul(&y);
        Ok(EdwardsPoint {
            x,
            y,
            z: FieldElement::ONE,
            t,
        })
    }
}

impl core::fmt::Debug for CompressedPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CompressedPoint({})", self.to_hex())
    }
}

/// Raw byte comparison y < p, before any limb reduction can mask the excess
fn y_is_canonical(y_bytes: &[u8; 32]) -> bool {
    let p = crate::constants::FIELD_PRIME;
    for i in (0..32).rev() {
        if y_bytes[i] < p[i] {
            return true;
        }
        if y_bytes[i] > p[i] {
            return false;
        }
    }
    false // equal to p
}

fn check_scalar_range(n: &Scalar, safe: bool) -> Result<()> {
    if n.is_zero() {
        if safe {
            return Err(Error::InvalidScalar("zero scalar"));
        }
        return Ok(());
    }
    if !n.is_canonical() {
        return Err(Error::InvalidScalar("scalar not below the group order"));
    }
    Ok(())
}

/// The fixed-base table: WINDOWS runs of 1P..128P, each window 2^8 times
/// the previous. Built once on first use, immutable and shared after.
fn base_table() -> &'static [EdwardsPoint] {
    static TABLE: OnceLock<Vec<EdwardsPoint>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut points = Vec::with_capacity(WINDOWS * HALF_WINDOW);
        let mut window_base = EdwardsPoint::base();
        for _ in 0..WINDOWS {
            let mut running = window_base.clone();
            points.push(running.clone());
            for _ in 1..HALF_WINDOW {
                running = running.add(&window_base);
                points.push(running.clone());
            }
            window_base = running.double();
        }
        points
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: u8) -> Scalar {
        let mut b = [0u8; 32];
        b[0] = n;
        Scalar::from_bytes(&b)
    }

    #[test]
    fn generator_and_identity_are_on_curve() {
        assert!(EdwardsPoint::base().is_on_curve());
        assert!(EdwardsPoint::identity().is_on_curve());
    }

    #[test]
    fn doubling_matches_self_addition() {
        let b = EdwardsPoint::base();
        assert_eq!(b.double(), b.add(&b));
        let b3 = b.add(&b).add(&b);
        assert_eq!(b3.double(), b3.add(&b3));
    }

    #[test]
    fn addition_laws() {
        let b = EdwardsPoint::base();
        let b2 = b.double();
        let b3 = b.add(&b2);
        // commutativity
        assert_eq!(b.add(&b2), b2.add(&b));
        // associativity
        assert_eq!(b.add(&b2).add(&b3), b.add(&b2.add(&b3)));
        // identity is neutral
        assert_eq!(b.add(&EdwardsPoint::identity()), b);
        // negation
        assert_eq!(b.negate().negate(), b);
        assert!(b.add(&b.negate()).is_identity());
        assert!(b.sub(&b).is_identity());
    }

    #[test]
    fn equality_ignores_projective_representation() {
        let b = EdwardsPoint::base();
        // b + identity goes through the addition formulas and lands on a
        // different (X:Y:Z:T) representation of the same affine point
        let same = b.add(&EdwardsPoint::identity());
        assert_eq!(b, same);
    }

    #[test]
    fn ladder_small_scalars() {
        let b = EdwardsPoint::base();
        assert_eq!(b.mul(&scalar(1), true).unwrap(), b);
        assert_eq!(b.mul(&scalar(2), true).unwrap(), b.double());
        let b5 = b.double().double().add(&b);
        assert_eq!(b.mul(&scalar(5), true).unwrap(), b5);
    }

    #[test]
    fn scalar_range_rules() {
        let b = EdwardsPoint::base();
        assert!(matches!(
            b.mul(&Scalar::ZERO, true),
            Err(Error::InvalidScalar(_))
        ));
        assert!(b.mul(&Scalar::ZERO, false).unwrap().is_identity());
        let too_big = Scalar::from_bytes(&CURVE_ORDER);
        assert!(matches!(
            b.mul(&too_big, true),
            Err(Error::InvalidScalar(_))
        ));
        assert!(matches!(
            EdwardsPoint::mul_base(&too_big, false),
            Err(Error::InvalidScalar(_))
        ));
    }

    #[test]
    fn fixed_base_agrees_with_ladder() {
        let b = EdwardsPoint::base();
        let mut dense = [0xa5u8; 32];
        dense[31] = 0x05;
        for n in [
            scalar(1),
            scalar(2),
            scalar(127),
            scalar(128),
            scalar(129),
            scalar(255),
            Scalar::reduce_from_bytes(&dense),
        ] {
            assert_eq!(
                EdwardsPoint::mul_base(&n, true).unwrap(),
                b.mul(&n, true).unwrap()
            );
        }
    }

    #[test]
    fn distributive_laws() {
        let b = EdwardsPoint::base();
        let a = scalar(11);
        let c = scalar(31);
        // (a + c)B = aB + cB
        let sum = scalar(42);
        assert_eq!(
            EdwardsPoint::mul_base(&sum, true).unwrap(),
            EdwardsPoint::mul_base(&a, true)
                .unwrap()
                .add(&EdwardsPoint::mul_base(&c, true).unwrap())
        );
        // a(cB) = (ac)B
        let product = a.mul_add(&c, &Scalar::ZERO);
        assert_eq!(
            EdwardsPoint::mul_base(&c, true)
                .unwrap()
                .mul(&a, true)
                .unwrap(),
            EdwardsPoint::mul_base(&product, true).unwrap()
        );
    }

    #[test]
    fn order_annihilates_generator() {
        let b = EdwardsPoint::base();
        assert!(b.is_torsion_free());
        assert!(b
            .ladder(&Scalar::from_bytes(&CURVE_ORDER), false)
            .is_identity());

        // (l + 1) B = B
        let mut order_plus_one = CURVE_ORDER;
        order_plus_one[0] += 1;
        assert_eq!(b.ladder(&Scalar::from_bytes(&order_plus_one), false), b);
    }

    #[test]
    fn compression_round_trip() {
        let b = EdwardsPoint::base();
        let b5 = b.mul(&scalar(5), true).unwrap();
        for p in [b, b5] {
            let compressed = p.compress().unwrap();
            let decoded = compressed.decode(false).unwrap();
            assert_eq!(decoded, p);
            assert_eq!(decoded.compress().unwrap().to_bytes(), compressed.to_bytes());
        }
    }

    #[test]
    fn base_point_encoding_is_canonical() {
        // B has even x, so the sign bit stays clear and bytes equal BASE_Y
        let bytes = EdwardsPoint::base().to_bytes().unwrap();
        assert_eq!(bytes[..31], BASE_Y[..31]);
    }

    #[test]
    fn strict_decode_rejects_non_canonical_y() {
        // y = p encodes the same field element as y = 0 but is non-canonical
        let encoding = CompressedPoint::from_bytes(&crate::constants::FIELD_PRIME);
        assert!(matches!(
            encoding.decode(false),
            Err(Error::InvalidPoint(_))
        ));
        // ZIP-215 accepts it (decodes as y = 0, a small-order point)
        let p = encoding.decode(true).unwrap();
        assert!(p.is_small_order());
    }

    #[test]
    fn strict_decode_rejects_x_zero_sign_one() {
        let mut bytes = [0u8; 32];
        bytes[0] = 1; // y = 1, so x = 0
        bytes[31] |= 0x80; // sign bit set
        let encoding = CompressedPoint::from_bytes(&bytes);
        assert!(matches!(
            encoding.decode(false),
            Err(Error::InvalidPoint(_))
        ));
        // ZIP-215 folds it onto the identity
        assert!(encoding.decode(true).unwrap().is_identity());
    }

    #[test]
    fn cofactor_predicates() {
        let b = EdwardsPoint::base();
        assert!(!b.is_small_order());
        assert!(b.is_torsion_free());
        assert!(EdwardsPoint::identity().is_small_order());
        assert!(EdwardsPoint::identity().is_torsion_free());

        assert_eq!(b.clear_cofactor(), b.mul(&scalar(8), true).unwrap());
    }

    #[test]
    fn from_affine_validates() {
        let b = EdwardsPoint::base();
        let affine = b.to_affine().unwrap();
        assert_eq!(EdwardsPoint::from_affine(&affine).unwrap(), b);

        let off_curve = AffinePoint {
            x: affine.x,
            y: affine.x,
        };
        assert!(matches!(
            EdwardsPoint::from_affine(&off_curve),
            Err(Error::InvalidPoint(_))
        ));
    }
}
