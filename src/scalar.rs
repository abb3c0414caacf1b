//! Scalar arithmetic modulo l = 2^252 + 27742317777372353535851937790883648493
//!
//! Scalars are 32 little-endian bytes. Multiplication and the 512-bit hash
//! reduction work bytewise; the final reduction runs on 64-bit limbs with
//! constant-time conditional subtraction.

use core::convert::TryInto;
use zeroize::Zeroize;

use crate::constants::{CURVE_ORDER, ORDER_MOD_256};

/// An integer modulo the group order, little-endian
#[derive(Clone, Zeroize)]
pub struct Scalar {
    bytes: [u8; 32],
}

impl Scalar {
    pub const ZERO: Scalar = Scalar { bytes: [0; 32] };

    /// Wrap raw bytes without reduction
    ///
    /// Range rules are enforced where the scalar is consumed: the
    /// multiplication routines reject values outside their domain.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Scalar { bytes: *bytes }
    }

    /// Interpret 32 bytes as an integer and reduce modulo l
    pub fn reduce_from_bytes(bytes: &[u8; 32]) -> Self {
        let mut s = *bytes;
        reduce256(&mut s);
        Scalar { bytes: s }
    }

    /// Reduce a 512-bit little-endian integer (a SHA-512 digest) modulo l
    ///
    /// Horner's walk from the most significant byte; every byte shifted out
    /// of the top re-enters as a multiple of 2^256 mod l.
    pub fn reduce_wide(input: &[u8; 64]) -> Self {
        let mut r = [0u8; 32];
        for &byte in input.iter().rev() {
            // r <<= 8
            let overflow = r[31];
            for i in (1..32).rev() {
                r[i] = r[i - 1];
            }
            r[0] = 0;

            if overflow != 0 {
                r = add(&r, &mul_small(&ORDER_MOD_256, overflow));
            }
            if byte != 0 {
                let mut unit = [0u8; 32];
                unit[0] = byte;
                r = add(&r, &unit);
            }
        }
        reduce256(&mut r);
        Scalar { bytes: r }
    }

    /// self * b + c mod l; the signing equation S = k*s + r
    pub fn mul_add(&self, b: &Scalar, c: &Scalar) -> Scalar {
        Scalar {
            bytes: add(&mul(&self.bytes, &b.bytes), &c.bytes),
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// True when the value is in [0, l)
    pub fn is_canonical(&self) -> bool {
        for i in (0..32).rev() {
            if self.bytes[i] < CURVE_ORDER[i] {
                return true;
            }
            if self.bytes[i] > CURVE_ORDER[i] {
                return false;
            }
        }
        false // equal to l
    }

    /// Bit i of the little-endian value
    pub(crate) fn bit(&self, i: usize) -> u8 {
        (self.bytes[i >> 3] >> (i & 7)) & 1
    }

    /// Split into 33 signed base-256 window digits in [-127, 128]
    ///
    /// Digits above 2^(W-1) borrow from the next window (d - 256, carry 1),
    /// so sum(digit_w * 2^(8w)) reconstructs the scalar exactly. Window 33
    /// absorbs the final carry for any value below 2^253.
    pub(crate) fn wnaf_digits(&self) -> [i16; 33] {
        let mut extended = [0u8; 33];
        extended[..32].copy_from_slice(&self.bytes);

        let mut digits = [0i16; 33];
        let mut carry = 0i16;
        for (w, digit) in digits.iter_mut().enumerate() {
            let v = extended[w] as i16 + carry;
            if v > 128 {
                *digit = v - 256;
                carry = 1;
            } else {
                *digit = v;
                carry = 0;
            }
        }
        debug_assert_eq!(carry, 0);
        digits
    }
}

impl core::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Scalars can be secret; show nothing but the type
        f.debug_struct("Scalar").finish()
    }
}

/// a + b mod l
fn add(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let t = a[i] as u16 + b[i] as u16 + carry;
        out[i] = (t & 0xff) as u8;
        carry = t >> 8;
    }
    // Each unit of overflow past 2^256 folds back in as 2^256 mod l
    while carry != 0 {
        carry -= 1;
        let prev = out;
        let mut c: u16 = 0;
        for i in 0..32 {
            let t = prev[i] as u16 + ORDER_MOD_256[i] as u16 + c;
            out[i] = (t & 0xff) as u8;
            c = t >> 8;
        }
        carry += c;
    }
    reduce256(&mut out);
    out
}

/// src * k for a single-byte k, reduced mod l
fn mul_small(src: &[u8; 32], k: u8) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let t = src[i] as u16 * k as u16 + carry;
        out[i] = (t & 0xff) as u8;
        carry = t >> 8;
    }
    while carry != 0 {
        carry -= 1;
        out = add(&out, &ORDER_MOD_256);
    }
    reduce256(&mut out);
    out
}

/// a * b mod l: schoolbook product into 64 base-256 limbs, then wide reduce
fn mul(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut prod = [0u32; 64];
    for i in 0..32 {
        for j in 0..32 {
            prod[i + j] += a[i] as u32 * b[j] as u32;
        }
    }

    let mut carry: u32 = 0;
    let mut wide = [0u8; 64];
    for (i, limb) in prod.iter().enumerate() {
        let v = *limb + carry;
        wide[i] = (v & 0xff) as u8;
        carry = v >> 8;
    }
    // 2^252 * 2^252 < 2^512: nothing spills past the 64th byte

    Scalar::reduce_wide(&wide).bytes
}

/// Reduce a 256-bit value to [0, l) with 16 conditional subtractions
///
/// l > 2^252, so any 256-bit input is below 16*l and the unconditional
/// iteration count covers the worst case without branching on the value.
fn reduce256(s: &mut [u8; 32]) {
    let order: [u64; 4] = [
        u64::from_le_bytes(CURVE_ORDER[0..8].try_into().unwrap()),
        u64::from_le_bytes(CURVE_ORDER[8..16].try_into().unwrap()),
        u64::from_le_bytes(CURVE_ORDER[16..24].try_into().unwrap()),
        u64::from_le_bytes(CURVE_ORDER[24..32].try_into().unwrap()),
    ];
    let mut limbs: [u64; 4] = [
        u64::from_le_bytes(s[0..8].try_into().unwrap()),
        u64::from_le_bytes(s[8..16].try_into().unwrap()),
        u64::from_le_bytes(s[16..24].try_into().unwrap()),
        u64::from_le_bytes(s[24..32].try_into().unwrap()),
    ];

    for _ in 0..16 {
        let mut diff = [0u64; 4];
        let mut borrow: u64 = 0;
        for i in 0..4 {
            let t = (limbs[i] as u128).wrapping_sub(order[i] as u128 + borrow as u128);
            diff[i] = t as u64;
            borrow = (t >> 127) as u64;
        }
        // borrow == 0 means the value was >= l: take the difference
        let mask = borrow.wrapping_sub(1);
        for i in 0..4 {
            limbs[i] = (limbs[i] & !mask) | (diff[i] & mask);
        }
    }

    for i in 0..4 {
        s[i * 8..i * 8 + 8].copy_from_slice(&limbs[i].to_le_bytes());
    }
}
