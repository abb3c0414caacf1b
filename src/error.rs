//! Error types for the signature engine

use core::fmt;

/// Errors that can occur during key derivation, signing, or verification
///
/// Verification failure itself is never an error: `verify` returns
/// `Ok(false)` for any signature that merely does not check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed hex or a byte string of the wrong length
    InvalidEncoding(String),

    /// A 32-byte string that does not decode to a curve point under the
    /// selected verification mode
    InvalidPoint(&'static str),

    /// Scalar out of range: zero where forbidden, or >= the group order
    InvalidScalar(&'static str),

    /// Attempt to invert zero in the field; indicates a corrupted point or
    /// an internal bug, never a merely invalid signature
    InvalidInverse,

    /// A hash slot required by the called operation has not been installed
    MissingHash(&'static str),

    /// The platform CSPRNG was unavailable or failed
    Rng(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidEncoding(msg) => write!(f, "invalid encoding: {}", msg),
            Error::InvalidPoint(msg) => write!(f, "invalid point: {}", msg),
            Error::InvalidScalar(msg) => write!(f, "invalid scalar: {}", msg),
            Error::InvalidInverse => write!(f, "field inversion of zero"),
            Error::MissingHash(which) => {
                write!(f, "no {} SHA-512 installed; call the matching install_ function first", which)
            }
            Error::Rng(msg) => write!(f, "CSPRNG failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
