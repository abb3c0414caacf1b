//! Field arithmetic modulo p = 2^255 - 19
//!
//! Elements are held as 10 limbs alternating 26 and 25 bits (the ref10
//! radix-2^25.5 layout). Every externally observable value is canonical in
//! [0, p); intermediate limb states may exceed p between carry passes.

use zeroize::Zeroize;

use crate::codec::ct_eq;
use crate::constants::{load4, SQRT_M1};
use crate::error::{Error, Result};

/// An element of GF(2^255 - 19)
#[derive(Clone, Copy, Zeroize)]
pub struct FieldElement {
    // Even limbs carry 26 bits, odd limbs 25
    v: [i32; 10],
}

// p in limb form, for the conditional subtraction
const PRIME_LIMBS: [i32; 10] = [
    0x3ffffed, 0x1ffffff, 0x3ffffff, 0x1ffffff,
    0x3ffffff, 0x1ffffff, 0x3ffffff, 0x1ffffff,
    0x3ffffff, 0x1ffffff,
];

// p - 2 = 2^255 - 21, little-endian; the Fermat inversion exponent
const P_MINUS_2: [u8; 32] = [
    0xeb, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
];

const LIMB_MASKS: [i32; 2] = [0x3ffffff, 0x1ffffff];
const LIMB_BITS: [u32; 2] = [26, 25];

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement { v: [0; 10] };
    pub const ONE: FieldElement = FieldElement { v: [1, 0, 0, 0, 0, 0, 0, 0, 0, 0] };

    /// Unpack 32 little-endian bytes and reduce to canonical form
    ///
    /// Bit 255 is ignored; callers that care about it (the compressed-point
    /// sign bit) extract it before unpacking.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let v = [
            (load4(&bytes[0..]) as i32) & 0x3ffffff,
            ((load4(&bytes[3..]) >> 2) as i32) & 0x1ffffff,
            ((load4(&bytes[6..]) >> 3) as i32) & 0x3ffffff,
            ((load4(&bytes[9..]) >> 5) as i32) & 0x1ffffff,
            ((load4(&bytes[12..]) >> 6) as i32) & 0x3ffffff,
            (load4(&bytes[16..]) as i32) & 0x1ffffff,
            ((load4(&bytes[19..]) >> 1) as i32) & 0x3ffffff,
            ((load4(&bytes[22..]) >> 3) as i32) & 0x1ffffff,
            ((load4(&bytes[25..]) >> 4) as i32) & 0x3ffffff,
            ((load4(&bytes[28..]) >> 6) as i32) & 0x1ffffff,
        ];
        let mut fe = FieldElement { v };
        fe.reduce();
        fe
    }

    /// Pack to 32 little-endian canonical bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut fe = *self;
        fe.reduce();
        let h = fe.v;

        let mut s = [0u8; 32];
        s[0] = (h[0] & 0xff) as u8;
        s[1] = (h[0] >> 8 & 0xff) as u8;
        s[2] = (h[0] >> 16 & 0xff) as u8;
        s[3] = ((h[0] >> 24 | h[1] << 2) & 0xff) as u8;
        s[4] = (h[1] >> 6 & 0xff) as u8;
        s[5] = (h[1] >> 14 & 0xff) as u8;
        s[6] = ((h[1] >> 22 | h[2] << 3) & 0xff) as u8;
        s[7] = (h[2] >> 5 & 0xff) as u8;
        s[8] = (h[2] >> 13 & 0xff) as u8;
        s[9] = ((h[2] >> 21 | h[3] << 5) & 0xff) as u8;
        s[10] = (h[3] >> 3 & 0xff) as u8;
        s[11] = (h[3] >> 11 & 0xff) as u8;
        s[12] = ((h[3] >> 19 | h[4] << 6) & 0xff) as u8;
        s[13] = (h[4] >> 2 & 0xff) as u8;
        s[14] = (h[4] >> 10 & 0xff) as u8;
        s[15] = (h[4] >> 18 & 0xff) as u8;
        s[16] = (h[5] & 0xff) as u8;
        s[17] = (h[5] >> 8 & 0xff) as u8;
        s[18] = (h[5] >> 16 & 0xff) as u8;
        s[19] = ((h[5] >> 24 | h[6] << 1) & 0xff) as u8;
        s[20] = (h[6] >> 7 & 0xff) as u8;
        s[21] = (h[6] >> 15 & 0xff) as u8;
        s[22] = ((h[6] >> 23 | h[7] << 3) & 0xff) as u8;
        s[23] = (h[7] >> 5 & 0xff) as u8;
        s[24] = (h[7] >> 13 & 0xff) as u8;
        s[25] = ((h[7] >> 21 | h[8] << 4) & 0xff) as u8;
        s[26] = (h[8] >> 4 & 0xff) as u8;
        s[27] = (h[8] >> 12 & 0xff) as u8;
        s[28] = ((h[8] >> 20 | h[9] << 6) & 0xff) as u8;
        s[29] = (h[9] >> 2 & 0xff) as u8;
        s[30] = (h[9] >> 10 & 0xff) as u8;
        s[31] = (h[9] >> 18) as u8;
        s
    }

    /// Strong reduction to [0, p)
    ///
    /// Two carry passes bracket two conditional subtractions: the 19*c
    /// wrap of the first pass can push limb 0 back out of range, and after
    /// the second carry the value may still sit in [p, p + 2^25).
    pub fn reduce(&mut self) {
        carry(&mut self.v);
        conditional_sub_prime(&mut self.v);
        carry(&mut self.v);
        conditional_sub_prime(&mut self.v);
    }

    pub fn add(&self, other: &FieldElement) -> FieldElement {
        let mut v = [0i32; 10];
        for (i, limb) in v.iter_mut().enumerate() {
            *limb = self.v[i].wrapping_add(other.v[i]);
        }
        carry(&mut v);
        FieldElement { v }
    }

    pub fn sub(&self, other: &FieldElement) -> FieldElement {
        let mut v = [0i32; 10];
        for (i, limb) in v.iter_mut().enumerate() {
            *limb = self.v[i] - other.v[i];
        }
        carry(&mut v);
        FieldElement { v }
    }

    pub fn neg(&self) -> FieldElement {
        FieldElement::ZERO.sub(self)
    }

    pub fn double(&self) -> FieldElement {
        self.add(self)
    }

    /// Schoolbook multiplication over the ref10 coefficient table
    ///
    /// Odd limbs of the left operand are pre-doubled and high-limb products
    /// folded down with the factor 19 (2^255 = 19 mod p).
    pub fn mul(&self, other: &FieldElement) -> FieldElement {
        let mut f = [0i64; 10];
        let mut g = [0i64; 10];
        for i in 0..10 {
            f[i] = self.v[i] as i64;
            g[i] = other.v[i] as i64;
        }

        let g19: [i64; 10] = core::array::from_fn(|i| 19 * g[i]);
        let f2: [i64; 10] = core::array::from_fn(|i| 2 * f[i]);

        let mut h = [0i64; 10];
        h[0] = f[0]*g[0] + f2[1]*g19[9] + f[2]*g19[8] + f2[3]*g19[7] + f[4]*g19[6]
             + f2[5]*g19[5] + f[6]*g19[4] + f2[7]*g19[3] + f[8]*g19[2] + f2[9]*g19[1];
        h[1] = f[0]*g[1] + f[1]*g[0] + f[2]*g19[9] + f[3]*g19[8] + f[4]*g19[7]
             + f[5]*g19[6] + f[6]*g19[5] + f[7]*g19[4] + f[8]*g19[3] + f[9]*g19[2];
        h[2] = f[0]*g[2] + f2[1]*g[1] + f[2]*g[0] + f2[3]*g19[9] + f[4]*g19[8]
             + f2[5]*g19[7] + f[6]*g19[6] + f2[7]*g19[5] + f[8]*g19[4] + f2[9]*g19[3];
        h[3] = f[0]*g[3] + f[1]*g[2] + f[2]*g[1] + f[3]*g[0] + f[4]*g19[9]
             + f[5]*g19[8] + f[6]*g19[7] + f[7]*g19[6] + f[8]*g19[5] + f[9]*g19[4];
        h[4] = f[0]*g[4] + f2[1]*g[3] + f[2]*g[2] + f2[3]*g[1] + f[4]*g[0]
             + f2[5]*g19[9] + f[6]*g19[8] + f2[7]*g19[7] + f[8]*g19[6] + f2[9]*g19[5];
        h[5] = f[0]*g[5] + f[1]*g[4] + f[2]*g[3] + f[3]*g[2] + f[4]*g[1] + f[5]*g[0]
             + f[6]*g19[9] + f[7]*g19[8] + f[8]*g19[7] + f[9]*g19[6];
        h[6] = f[0]*g[6] + f2[1]*g[5] + f[2]*g[4] + f2[3]*g[3] + f[4]*g[2] + f2[5]*g[1]
             + f[6]*g[0] + f2[7]*g19[9] + f[8]*g19[8] + f2[9]*g19[7];
        h[7] = f[0]*g[7] + f[1]*g[6] + f[2]*g[5] + f[3]*g[4] + f[4]*g[3] + f[5]*g[2]
             + f[6]*g[1] + f[7]*g[0] + f[8]*g19[9] + f[9]*g19[8];
        h[8] = f[0]*g[8] + f2[1]*g[7] + f[2]*g[6] + f2[3]*g[5] + f[4]*g[4] + f2[5]*g[3]
             + f[6]*g[2] + f2[7]*g[1] + f[8]*g[0] + f2[9]*g19[9];
        h[9] = f[0]*g[9] + f[1]*g[8] + f[2]*g[7] + f[3]*g[6] + f[4]*g[5] + f[5]*g[4]
             + f[6]*g[3] + f[7]*g[2] + f[8]*g[1] + f[9]*g[0];

        for _ in 0..5 {
            let mut c: i64;
            for i in 0..9 {
                c = h[i] >> LIMB_BITS[i & 1];
                h[i] &= LIMB_MASKS[i & 1] as i64;
                h[i + 1] += c;
            }
            c = h[9] >> 25;
            h[9] &= 0x1ffffff;
            h[0] += 19 * c;
        }

        let mut out = [0i32; 10];
        for (i, limb) in out.iter_mut().enumerate() {
            *limb = h[i] as i32;
        }
        let mut fe = FieldElement { v: out };
        fe.reduce();
        fe
    }

    pub fn square(&self) -> FieldElement {
        self.mul(self)
    }

    /// Multiplicative inverse, a^(p-2)
    ///
    /// Not constant time in any useful sense and not required to be: it runs
    /// only on public data (point decoding and affine projection).
    pub fn invert(&self) -> Result<FieldElement> {
        if self.is_zero() {
            return Err(Error::InvalidInverse);
        }
        let mut result = FieldElement::ONE;
        for bit in (0..256).rev() {
            result = result.square();
            if (P_MINUS_2[bit >> 3] >> (bit & 7)) & 1 == 1 {
                result = result.mul(self);
            }
        }
        Ok(result)
    }

    /// x^((p-5)/8) = x^(2^252 - 3)
    ///
    /// Fixed chain: 250 squarings, 11 multiplications, reusing the
    /// x^(2^k - 1) towers.
    pub fn pow_p58(&self) -> FieldElement {
        let sq_n = |x: FieldElement, n: u32| {
            let mut r = x;
            for _ in 0..n {
                r = r.square();
            }
            r
        };
        let x = *self;
        let b2 = x.square().mul(&x); // x^3
        let b4 = sq_n(b2, 2).mul(&b2); // x^(2^4 - 1)
        let b5 = sq_n(b4, 1).mul(&x); // x^(2^5 - 1)
        let b10 = sq_n(b5, 5).mul(&b5);
        let b20 = sq_n(b10, 10).mul(&b10);
        let b40 = sq_n(b20, 20).mul(&b20);
        let b80 = sq_n(b40, 40).mul(&b40);
        let b160 = sq_n(b80, 80).mul(&b80);
        let b240 = sq_n(b160, 80).mul(&b80);
        let b250 = sq_n(b240, 10).mul(&b10);
        sq_n(b250, 2).mul(&x)
    }

    pub fn is_zero(&self) -> bool {
        ct_eq(self.to_bytes(), [0u8; 32])
    }

    /// Parity of the canonical representative; the compressed sign bit
    pub fn is_negative(&self) -> bool {
        self.to_bytes()[0] & 1 == 1
    }

    pub(crate) fn sqrt_m1() -> FieldElement {
        FieldElement::from_bytes(&SQRT_M1)
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(self.to_bytes(), other.to_bytes())
    }
}

impl Eq for FieldElement {}

impl core::fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FieldElement({})", crate::codec::bytes_to_hex(&self.to_bytes()))
    }
}

/// Square-root branch taken by [`sqrt_ratio`]
///
/// The failing branch still pays for the sqrt(-1) multiplication so the
/// decode path's cost does not reveal which branch was hit.
pub(crate) struct SqrtRatio {
    pub is_square: bool,
    pub root: FieldElement,
}

/// Find x with v * x^2 = u, if one exists
///
/// Candidate x = u * v^3 * (u * v^7)^((p-5)/8), then the three-branch
/// correction of RFC 8032 section 5.1.3: v*x^2 = u keeps x, v*x^2 = -u
/// multiplies by sqrt(-1), v*x^2 = -u*sqrt(-1) has no root.
pub(crate) fn sqrt_ratio(u: &FieldElement, v: &FieldElement) -> SqrtRatio {
    let v3 = v.square().mul(v);
    let v7 = v3.square().mul(v);
    let pow = u.mul(&v7).pow_p58();
    let x = u.mul(&v3).mul(&pow);

    let vx2 = v.mul(&x.square());
    let sqrt_m1 = FieldElement::sqrt_m1();
    let root1 = x;
    let root2 = x.mul(&sqrt_m1);

    let minus_u = u.neg();
    let use_root1 = vx2 == *u;
    let use_root2 = vx2 == minus_u;
    let no_root = vx2 == minus_u.mul(&sqrt_m1);

    // The rootless branch lands on root2 as well; only the flag differs
    let mut root = root1;
    if use_root2 || no_root {
        root = root2;
    }
    SqrtRatio {
        is_square: use_root1 || use_root2,
        root,
    }
}

/// Two carry passes normalizing limbs to 26/25 bits
///
/// Arithmetic right shifts let the same chain absorb the borrows a limbwise
/// subtraction leaves behind; the 19*c wrap at limb 9 folds bit 255 down.
fn carry(h: &mut [i32; 10]) {
    for _ in 0..2 {
        let mut c: i32;
        for i in 0..9 {
            c = h[i] >> LIMB_BITS[i & 1];
            h[i] &= LIMB_MASKS[i & 1];
            h[i + 1] += c;
        }
        c = h[9] >> 25;
        h[9] &= 0x1ffffff;
        h[0] += 19 * c;
    }
}

/// Constant-time single conditional subtraction of p
fn conditional_sub_prime(v: &mut [i32; 10]) {
    let mut diff = [0i32; 10];
    let mut borrow = 0i32;
    for i in 0..10 {
        let d = (v[i] as i64) - (PRIME_LIMBS[i] as i64) - (borrow as i64);
        diff[i] = (d as i32) & LIMB_MASKS[i & 1];
        borrow = (d < 0) as i32;
    }
    // borrow == 0 means v >= p: select the difference
    let mask = borrow.wrapping_sub(1);
    for i in 0..10 {
        v[i] = (v[i] & !mask) | (diff[i] & mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FIELD_PRIME;

    fn fe(n: u8) -> FieldElement {
        let mut b = [0u8; 32];
        b[0] = n;
        FieldElement::from_bytes(&b)
    }

    fn minus_one() -> FieldElement {
        FieldElement::ZERO.sub(&FieldElement::ONE)
    }

    #[test]
    fn prime_reduces_to_zero() {
        let p = FieldElement::from_bytes(&FIELD_PRIME);
        assert!(p.is_zero());
    }

    #[test]
    fn prime_plus_small_reduces() {
        let mut bytes = FIELD_PRIME;
        bytes[0] = bytes[0].wrapping_add(1); // p + 1 (no byte carry: 0xed + 1)
        assert_eq!(FieldElement::from_bytes(&bytes), FieldElement::ONE);
    }

    #[test]
    fn round_trip_is_stable() {
        let bytes = [
            171, 6, 18, 1, 21, 5, 37, 61, 10, 52, 68, 80, 26, 31, 72, 42,
            10, 52, 68, 80, 17, 10, 61, 81, 21, 5, 37, 61, 10, 52, 6, 18,
        ];
        let a = FieldElement::from_bytes(&bytes);
        assert_eq!(a.to_bytes(), bytes);
    }

    #[test]
    fn small_multiplications() {
        assert_eq!(fe(3).mul(&fe(3)), fe(9));
        assert_eq!(fe(2).mul(&FieldElement::ONE), fe(2));
        assert_eq!(minus_one().mul(&minus_one()), FieldElement::ONE);
    }

    #[test]
    fn mul_is_associative_and_commutative() {
        let a = FieldElement::from_bytes(&[17; 32]);
        let b = FieldElement::from_bytes(&[99; 32]);
        let c = FieldElement::from_bytes(&[243; 32]);
        assert_eq!(a.mul(&b), b.mul(&a));
        assert_eq!(a.mul(&b).mul(&c), a.mul(&b.mul(&c)));
    }

    #[test]
    fn add_sub_round_trip() {
        let a = FieldElement::from_bytes(&[41; 32]);
        let b = FieldElement::from_bytes(&[7; 32]);
        assert_eq!(a.add(&b).sub(&b), a);
        assert!(a.sub(&a).is_zero());
    }

    #[test]
    fn square_matches_mul() {
        let a = FieldElement::from_bytes(&[42; 32]);
        assert_eq!(a.square(), a.mul(&a));
    }

    #[test]
    fn inversion_edge_cases() {
        for x in [FieldElement::ONE, fe(2), fe(5), fe(19), minus_one()] {
            let inv = x.invert().unwrap();
            assert_eq!(x.mul(&inv), FieldElement::ONE);
        }
        assert_eq!(minus_one().invert().unwrap(), minus_one());
        assert_eq!(FieldElement::ZERO.invert(), Err(Error::InvalidInverse));
    }

    #[test]
    fn inversion_of_dense_value() {
        let a = FieldElement::from_bytes(&[0xff; 32]);
        assert_eq!(a.mul(&a.invert().unwrap()), FieldElement::ONE);
    }

    #[test]
    fn sqrt_m1_squares_to_minus_one() {
        assert_eq!(FieldElement::sqrt_m1().square(), minus_one());
    }

    #[test]
    fn pow_p58_consistent_with_sqrt_of_four() {
        // u/v = 4, a quadratic residue: the ratio root must square back to 4
        let r = sqrt_ratio(&fe(4), &FieldElement::ONE);
        assert!(r.is_square);
        assert_eq!(r.root.square(), fe(4));
    }

    #[test]
    fn sqrt_ratio_rejects_non_residue() {
        // 2 is a non-residue mod p while -2 is not a residue times sqrt(-1)=..;
        // either way exactly one of {2, -2} has a root through the two branches,
        // and u = 2, v = 1 must classify consistently with squaring the result.
        let r = sqrt_ratio(&fe(2), &FieldElement::ONE);
        if r.is_square {
            assert_eq!(r.root.square(), fe(2));
        } else {
            assert_ne!(r.root.square(), fe(2));
        }
    }

    #[test]
    fn negation_is_involutive() {
        let a = FieldElement::from_bytes(&[13; 32]);
        assert_eq!(a.neg().neg(), a);
        assert!(a.add(&a.neg()).is_zero());
    }

    #[test]
    fn parity_of_small_values() {
        assert!(!fe(4).is_negative());
        assert!(fe(5).is_negative());
        // -4 = p - 4 ends in 0xe9, odd
        assert!(fe(4).neg().is_negative());
    }
}
