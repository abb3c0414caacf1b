//! Late-bound SHA-512 and CSPRNG collaborators
//!
//! SHA-512 is not implemented here: it is supplied by the embedder through
//! write-once slots, one synchronous and one asynchronous, each set at most
//! once per process (a second install is a no-op). The asynchronous slot
//! falls back to the built-in `sha2` backend when that feature is enabled;
//! the synchronous slot has no fallback and must be installed before any
//! synchronous operation runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::codec::concat;
use crate::error::{Error, Result};

/// A SHA-512 digest
pub type Sha512Digest = [u8; 64];

/// Synchronous SHA-512 over one message buffer
pub type SyncSha512 = fn(&[u8]) -> Sha512Digest;

/// Future resolving to a SHA-512 digest
pub type Sha512Future = Pin<Box<dyn Future<Output = Sha512Digest> + Send>>;

/// Asynchronous SHA-512 over one message buffer
pub type AsyncSha512 = fn(Vec<u8>) -> Sha512Future;

/// CSPRNG filler; false signals the platform source failed
pub type RandomSource = fn(&mut [u8]) -> bool;

static SYNC_SHA512: OnceLock<SyncSha512> = OnceLock::new();
static ASYNC_SHA512: OnceLock<AsyncSha512> = OnceLock::new();
static RANDOM_SOURCE: OnceLock<RandomSource> = OnceLock::new();

/// Install the synchronous SHA-512 implementation
///
/// Returns true when this call performed the installation; a slot already
/// holding a function is left untouched.
pub fn install_sha512(f: SyncSha512) -> bool {
    SYNC_SHA512.set(f).is_ok()
}

/// Install the asynchronous SHA-512 implementation
pub fn install_sha512_async(f: AsyncSha512) -> bool {
    ASYNC_SHA512.set(f).is_ok()
}

/// Install a replacement CSPRNG; the platform source is the default
pub fn install_random_source(f: RandomSource) -> bool {
    RANDOM_SOURCE.set(f).is_ok()
}

/// Hash the concatenation of `parts` with the installed synchronous SHA-512
pub(crate) fn hash_sync(parts: &[&[u8]]) -> Result<Sha512Digest> {
    let f = SYNC_SHA512
        .get()
        .ok_or(Error::MissingHash("synchronous"))?;
    Ok(f(&concat(parts)))
}

/// Hash the concatenation of `parts` with the asynchronous SHA-512
///
/// Uses the installed slot when present, otherwise the built-in backend.
pub(crate) async fn hash_async(parts: &[&[u8]]) -> Result<Sha512Digest> {
    if let Some(f) = ASYNC_SHA512.get() {
        return Ok(f(concat(parts)).await);
    }
    #[cfg(feature = "sha2")]
    {
        Ok(sha512_backend(&concat(parts)))
    }
    #[cfg(not(feature = "sha2"))]
    {
        Err(Error::MissingHash("asynchronous"))
    }
}

/// Sample `len` bytes from the CSPRNG
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    match RANDOM_SOURCE.get() {
        Some(f) => {
            if !f(&mut bytes) {
                return Err(Error::Rng("installed random source failed".into()));
            }
        }
        None => {
            OsRng
                .try_fill_bytes(&mut bytes)
                .map_err(|e| Error::Rng(e.to_string()))?;
        }
    }
    Ok(bytes)
}

/// The built-in SHA-512, ready to hand to [`install_sha512`]
#[cfg(feature = "sha2")]
pub fn sha512_backend(message: &[u8]) -> Sha512Digest {
    use sha2::{Digest, Sha512};
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(message));
    out
}
