//! Self-contained Ed25519 digital signature engine
//!
//! Implements pure Ed25519 as specified in RFC 8032 and FIPS 186-5 — no
//! prehash, no context — with a selectable ZIP-215 verification mode for
//! consensus-critical systems, on top of a from-scratch Curve25519 stack:
//! field arithmetic modulo 2^255 - 19, the twisted Edwards group in
//! extended coordinates, a constant-time variable-base ladder, and a
//! windowed-NAF fixed-base path over a lazily built table.
//!
//! SHA-512 is an injected collaborator: install a synchronous hasher once
//! per process, or rely on the built-in backend for the asynchronous path
//! (feature `sha2`, on by default).
//!
//! # Example
//!
//! ```
//! use ed25519_engine::{install_sha512, sha512_backend};
//! use ed25519_engine::{generate_seed, get_public_key, sign, verify, VerifyOptions};
//!
//! # fn main() -> ed25519_engine::Result<()> {
//! install_sha512(sha512_backend);
//!
//! let seed = generate_seed()?;
//! let public_key = get_public_key(&seed)?;
//! let signature = sign(b"hello, ed25519", &seed)?;
//! assert!(verify(&signature, b"hello, ed25519", &public_key, VerifyOptions::default())?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod constants;
pub mod error;
mod field;
mod scalar;

pub mod eddsa;
pub mod hashing;
pub mod point;

// Flat re-exports of the working surface
pub use codec::{bytes_to_hex, concat, hex_to_bytes, Input};
pub use eddsa::{
    generate_seed, get_extended_public_key, get_extended_public_key_async, get_public_key,
    get_public_key_async, sign, sign_async, verify, verify_async, ExtendedPrivateKey,
    VerifyOptions,
};
pub use error::{Error, Result};
pub use field::FieldElement;
pub use hashing::{
    install_random_source, install_sha512, install_sha512_async, random_bytes, AsyncSha512,
    RandomSource, Sha512Digest, Sha512Future, SyncSha512,
};
#[cfg(feature = "sha2")]
pub use hashing::sha512_backend;
pub use point::{AffinePoint, CompressedPoint, EdwardsPoint};
pub use scalar::Scalar;
