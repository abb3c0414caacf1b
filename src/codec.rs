//! Byte and hex codec helpers
//!
//! All engine inputs (seeds, messages, keys, signatures) are accepted either
//! as raw bytes or as hex strings; this module owns that normalization and
//! the constant-time byte comparison used by the arithmetic layers.

use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Encode bytes as lowercase hex, two digits per byte, no prefix
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string, accepting either case
///
/// Odd length or a non-hex digit fails with [`Error::InvalidEncoding`].
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| match e {
        hex::FromHexError::OddLength => {
            Error::InvalidEncoding(format!("hex string has odd length {}", s.len()))
        }
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            Error::InvalidEncoding(format!("non-hex digit {:?} at offset {}", c, index))
        }
        hex::FromHexError::InvalidStringLength => {
            Error::InvalidEncoding("hex string has invalid length".into())
        }
    })
}

/// An engine input: raw bytes or a hex string
///
/// Constructed implicitly through `From`, so callers pass `b"..."`, byte
/// slices, or `&str` hex directly to the engine functions.
#[derive(Clone, Copy, Debug)]
pub enum Input<'a> {
    Bytes(&'a [u8]),
    Hex(&'a str),
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Input<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Input<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Input::Hex(s)
    }
}

impl<'a> Input<'a> {
    /// Normalize to an owned byte vector, decoding hex if necessary
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Input::Bytes(b) => Ok(b.to_vec()),
            Input::Hex(s) => hex_to_bytes(s),
        }
    }

    /// Normalize to exactly `N` bytes (`2 * N` hex digits), else fail
    pub fn into_array<const N: usize>(self) -> Result<[u8; N]> {
        let bytes = self.into_bytes()?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            Error::InvalidEncoding(format!("expected {} bytes, got {}", N, len))
        })
    }
}

/// Concatenate byte slices into one buffer, in order
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Constant-time byte-slice equality
///
/// Length mismatch returns false immediately; lengths are public here.
pub(crate) fn ct_eq<A, B>(a: A, b: B) -> bool
where
    A: AsRef<[u8]>,
    B: AsRef<[u8]>,
{
    let a = a.as_ref();
    let b = b.as_ref();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
