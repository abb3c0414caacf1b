//! Curve25519 / Ed25519 domain parameters
//!
//! All 32-byte constants are little-endian, matching the wire encoding used
//! throughout RFC 8032. Numeric values, for reference:
//!
//! - p  = 2^255 - 19
//! - d  = -121665/121666 mod p
//!      = 37095705934669439343138083508754565189542113879843219016388785533085940283555
//! - l  = 2^252 + 27742317777372353535851937790883648493 (group order)
//! - h  = 8 (cofactor)
//! - sqrt(-1) mod p
//!      = 19681161376707505956807079304988542015446066515923890162744021073123829784752

/// Public key length in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Private seed length in bytes
pub const SECRET_SEED_SIZE: usize = 32;

/// Signature length in bytes (R || S)
pub const SIGNATURE_SIZE: usize = 64;

/// Cofactor h of the curve
pub const COFACTOR: u8 = 8;

/// Curve coefficient a; Ed25519 uses the twisted form with a = -1
pub const EDWARDS_A: i8 = -1;

/// Field prime p = 2^255 - 19
pub const FIELD_PRIME: [u8; 32] = [
    0xed, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
];

/// Group order l = 2^252 + 27742317777372353535851937790883648493
pub const CURVE_ORDER: [u8; 32] = [
    0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58,
    0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde, 0x14,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

/// 2^256 mod l, the carry constant for reduction modulo the group order
pub const ORDER_MOD_256: [u8; 32] = [
    0x1d, 0x95, 0x98, 0x8d, 0x74, 0x31, 0xec, 0xd6,
    0x70, 0xcf, 0x7d, 0x73, 0xf4, 0x5b, 0xef, 0xc6,
    0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x0f,
];

/// Curve constant d = -121665/121666 mod p
pub const EDWARDS_D: [u8; 32] = [
    0xa3, 0x78, 0x59, 0x13, 0xca, 0x4d, 0xeb, 0x75,
    0xab, 0xd8, 0x41, 0x41, 0x4d, 0x0a, 0x70, 0x00,
    0x98, 0xe8, 0x79, 0x77, 0x79, 0x40, 0xc7, 0x8c,
    0x73, 0xfe, 0x6f, 0x2b, 0xee, 0x6c, 0x03, 0x52,
];

/// sqrt(-1) mod p, used for square-root extraction during decompression
pub const SQRT_M1: [u8; 32] = [
    0xb0, 0xa0, 0x0e, 0x4a, 0x27, 0x1b, 0xee, 0xc4,
    0x78, 0xe4, 0x2f, 0xad, 0x06, 0x18, 0x43, 0x2f,
    0xa7, 0xd7, 0xfb, 0x3d, 0x99, 0x00, 0x4d, 0x2b,
    0x0b, 0xdf, 0xc1, 0x4f, 0x80, 0x24, 0x83, 0x2b,
];

/// x coordinate of the base point B
pub const BASE_X: [u8; 32] = [
    0x1a, 0xd5, 0x25, 0x8f, 0x60, 0x2d, 0x56, 0xc9,
    0xb2, 0xa7, 0x25, 0x95, 0x60, 0xc7, 0x2c, 0x69,
    0x5c, 0xdc, 0xd6, 0xfd, 0x31, 0xe2, 0xa4, 0xc0,
    0xfe, 0x53, 0x6e, 0xcd, 0xd3, 0x36, 0x69, 0x21,
];

/// y coordinate of the base point B (4/5 mod p)
pub const BASE_Y: [u8; 32] = [
    0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
];

/// Load 4 bytes as a little-endian u64
pub(crate) fn load4(bytes: &[u8]) -> u64 {
    (bytes[0] as u64)
        | ((bytes[1] as u64) << 8)
        | ((bytes[2] as u64) << 16)
        | ((bytes[3] as u64) << 24)
}
