//! Ed25519 key derivation, signing, and verification (RFC 8032)
//!
//! Every operation exists in a synchronous and an asynchronous variant.
//! The pair shares all cryptographic logic: the pure steps below map hash
//! digests to results, and the two variants differ only in how the three
//! SHA-512 invocations are sequenced.

use zeroize::Zeroize;

use crate::codec::Input;
use crate::constants::{SECRET_SEED_SIZE, SIGNATURE_SIZE};
use crate::error::{Error, Result};
use crate::hashing::{hash_async, hash_sync, random_bytes, Sha512Digest};
use crate::point::{CompressedPoint, EdwardsPoint};
use crate::scalar::Scalar;

/// Expanded signing key material, derived from the 32-byte seed
///
/// Derived fresh for every operation; the crate never caches it. Secret
/// fields are wiped on drop.
pub struct ExtendedPrivateKey {
    /// Clamped low half of SHA-512(seed)
    pub head: [u8; 32],
    /// High half of SHA-512(seed), the nonce prefix
    pub prefix: [u8; 32],
    /// head interpreted little-endian, reduced modulo the group order
    pub scalar: Scalar,
    /// Public point A = scalar * B
    pub point: EdwardsPoint,
    /// Compressed A
    pub point_bytes: [u8; 32],
}

impl Zeroize for ExtendedPrivateKey {
    fn zeroize(&mut self) {
        self.head.zeroize();
        self.prefix.zeroize();
        self.scalar.zeroize();
        // point and point_bytes are public material
    }
}

impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl core::fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never expose the secret halves
        f.debug_struct("ExtendedPrivateKey")
            .field("point_bytes", &crate::codec::bytes_to_hex(&self.point_bytes))
            .finish()
    }
}

/// Verification mode selector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyOptions {
    /// true: ZIP-215 predicates (consensus-friendly, permissive encodings,
    /// small-order public keys tolerated). false: strict RFC 8032 /
    /// FIPS 186-5 predicates.
    pub zip215: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions { zip215: true }
    }
}

// ---- pure steps shared by the sync and async paths ----------------------

/// RFC 8032 section 5.1.5: clamp, reduce, derive A
fn expand_seed(digest: &Sha512Digest) -> Result<ExtendedPrivateKey> {
    let mut head = [0u8; 32];
    head.copy_from_slice(&digest[..32]);
    let mut prefix = [0u8; 32];
    prefix.copy_from_slice(&digest[32..]);

    head[0] &= 248;
    head[31] &= 127;
    head[31] |= 64;

    let scalar = Scalar::reduce_from_bytes(&head);
    let point = EdwardsPoint::mul_base(&scalar, true)?;
    let point_bytes = point.to_bytes()?;
    Ok(ExtendedPrivateKey {
        head,
        prefix,
        scalar,
        point,
        point_bytes,
    })
}

/// r = H(prefix || msg) mod l and its commitment R = rB
fn commit_nonce(digest: &Sha512Digest) -> Result<(Scalar, [u8; 32])> {
    let r = Scalar::reduce_wide(digest);
    let r_bytes = EdwardsPoint::mul_base(&r, true)?.to_bytes()?;
    Ok((r, r_bytes))
}

/// S = r + H(R || A || msg) * s mod l; assemble R || S
fn assemble_signature(
    key: &ExtendedPrivateKey,
    r: &Scalar,
    r_bytes: &[u8; 32],
    challenge: &Sha512Digest,
) -> [u8; SIGNATURE_SIZE] {
    let k = Scalar::reduce_wide(challenge);
    let s = k.mul_add(&key.scalar, r);

    let mut signature = [0u8; SIGNATURE_SIZE];
    signature[..32].copy_from_slice(r_bytes);
    signature[32..].copy_from_slice(&s.to_bytes());
    signature
}

/// Parsed verification inputs, before the challenge hash
struct VerifyContext {
    a: EdwardsPoint,
    a_bytes: [u8; 32],
    r: EdwardsPoint,
    r_bytes: [u8; 32],
    s: Scalar,
}

/// Parse signature and key; mode-specific pre-checks
fn verify_prepare(
    sig: &[u8; SIGNATURE_SIZE],
    pubkey: &[u8; 32],
    opts: VerifyOptions,
) -> Result<VerifyContext> {
    let a = CompressedPoint::from_bytes(pubkey).decode(opts.zip215)?;
    if !opts.zip215 && a.is_small_order() {
        return Err(Error::InvalidPoint("small-order public key"));
    }

    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&sig[..32]);
    let r = CompressedPoint::from_bytes(&r_bytes).decode(opts.zip215)?;

    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&sig[32..]);
    let s = Scalar::from_bytes(&s_bytes);

    Ok(VerifyContext {
        a,
        a_bytes: *pubkey,
        r,
        r_bytes,
        s,
    })
}

/// Accept iff [8](SB - R - kA) = O
///
/// S >= l surfaces from the multiplication's range check; S = 0 is legal
/// here, hence the unsafe multiplication mode (inputs are public).
fn verify_finish(ctx: &VerifyContext, challenge: &Sha512Digest) -> Result<bool> {
    let k = Scalar::reduce_wide(challenge);
    let sb = EdwardsPoint::mul_base(&ctx.s, false)?;
    let ka = ctx.a.mul(&k, false)?;
    let difference = ctx.r.add(&ka).sub(&sb);
    Ok(difference.clear_cofactor().is_identity())
}

// ---- public operations --------------------------------------------------

/// Derive the expanded key material from a seed (bytes or hex)
pub fn get_extended_public_key<'a>(seed: impl Into<Input<'a>>) -> Result<ExtendedPrivateKey> {
    let seed: Input = seed.into();
    let seed: [u8; SECRET_SEED_SIZE] = seed.into_array()?;
    let digest = hash_sync(&[&seed[..]])?;
    expand_seed(&digest)
}

/// Asynchronous variant of [`get_extended_public_key`]
pub async fn get_extended_public_key_async<'a>(
    seed: impl Into<Input<'a>>,
) -> Result<ExtendedPrivateKey> {
    let seed: Input = seed.into();
    let seed: [u8; SECRET_SEED_SIZE] = seed.into_array()?;
    let digest = hash_async(&[&seed[..]]).await?;
    expand_seed(&digest)
}

/// Derive the 32-byte public key from a seed
pub fn get_public_key<'a>(seed: impl Into<Input<'a>>) -> Result<[u8; 32]> {
    Ok(get_extended_public_key(seed)?.point_bytes)
}

/// Asynchronous variant of [`get_public_key`]
pub async fn get_public_key_async<'a>(seed: impl Into<Input<'a>>) -> Result<[u8; 32]> {
    Ok(get_extended_public_key_async(seed).await?.point_bytes)
}

/// Sign a message with a seed, RFC 8032 section 5.1.6
///
/// Deterministic: the signature is a pure function of (seed, msg).
pub fn sign<'a, 'b>(
    msg: impl Into<Input<'a>>,
    seed: impl Into<Input<'b>>,
) -> Result<[u8; SIGNATURE_SIZE]> {
    let msg: Input = msg.into();
    let msg = msg.into_bytes()?;
    let seed: Input = seed.into();
    let seed: [u8; SECRET_SEED_SIZE] = seed.into_array()?;

    let key = expand_seed(&hash_sync(&[&seed[..]])?)?;
    let (r, r_bytes) = commit_nonce(&hash_sync(&[&key.prefix[..], &msg[..]])?)?;
    let challenge = hash_sync(&[&r_bytes[..], &key.point_bytes[..], &msg[..]])?;
    Ok(assemble_signature(&key, &r, &r_bytes, &challenge))
}

/// Asynchronous variant of [`sign`]
pub async fn sign_async<'a, 'b>(
    msg: impl Into<Input<'a>>,
    seed: impl Into<Input<'b>>,
) -> Result<[u8; SIGNATURE_SIZE]> {
    let msg: Input = msg.into();
    let msg = msg.into_bytes()?;
    let seed: Input = seed.into();
    let seed: [u8; SECRET_SEED_SIZE] = seed.into_array()?;

    let key = expand_seed(&hash_async(&[&seed[..]]).await?)?;
    let (r, r_bytes) = commit_nonce(&hash_async(&[&key.prefix[..], &msg[..]]).await?)?;
    let challenge = hash_async(&[&r_bytes[..], &key.point_bytes[..], &msg[..]]).await?;
    Ok(assemble_signature(&key, &r, &r_bytes, &challenge))
}

/// Verify a signature, RFC 8032 section 5.1.7 with the ZIP-215 option
///
/// Malformed or invalid signatures, keys, and encodings yield `Ok(false)`;
/// an `Err` means a broken precondition (no hash installed, or an internal
/// inversion failure), never a merely bad signature.
pub fn verify<'a, 'b, 'c>(
    sig: impl Into<Input<'a>>,
    msg: impl Into<Input<'b>>,
    pubkey: impl Into<Input<'c>>,
    opts: VerifyOptions,
) -> Result<bool> {
    let (sig, msg, pubkey): (Input, Input, Input) = (sig.into(), msg.into(), pubkey.into());
    let (Ok(sig), Ok(msg), Ok(pubkey)) = (
        sig.into_array::<SIGNATURE_SIZE>(),
        msg.into_bytes(),
        pubkey.into_array::<32>(),
    ) else {
        return Ok(false);
    };
    let ctx = match verify_prepare(&sig, &pubkey, opts) {
        Ok(ctx) => ctx,
        Err(_) => return Ok(false),
    };
    let challenge = hash_sync(&[&ctx.r_bytes[..], &ctx.a_bytes[..], &msg[..]])?;
    fold_verify_result(verify_finish(&ctx, &challenge))
}

/// Asynchronous variant of [`verify`]
pub async fn verify_async<'a, 'b, 'c>(
    sig: impl Into<Input<'a>>,
    msg: impl Into<Input<'b>>,
    pubkey: impl Into<Input<'c>>,
    opts: VerifyOptions,
) -> Result<bool> {
    let (sig, msg, pubkey): (Input, Input, Input) = (sig.into(), msg.into(), pubkey.into());
    let (Ok(sig), Ok(msg), Ok(pubkey)) = (
        sig.into_array::<SIGNATURE_SIZE>(),
        msg.into_bytes(),
        pubkey.into_array::<32>(),
    ) else {
        return Ok(false);
    };
    let ctx = match verify_prepare(&sig, &pubkey, opts) {
        Ok(ctx) => ctx,
        Err(_) => return Ok(false),
    };
    let challenge = hash_async(&[&ctx.r_bytes[..], &ctx.a_bytes[..], &msg[..]]).await?;
    fold_verify_result(verify_finish(&ctx, &challenge))
}

/// Invalid-signature errors fold into false; precondition failures escape
fn fold_verify_result(result: Result<bool>) -> Result<bool> {
    match result {
        Ok(accepted) => Ok(accepted),
        Err(Error::InvalidScalar(_)) | Err(Error::InvalidPoint(_)) | Err(Error::InvalidEncoding(_)) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Sample a fresh 32-byte seed from the CSPRNG
pub fn generate_seed() -> Result<[u8; SECRET_SEED_SIZE]> {
    let bytes = random_bytes(SECRET_SEED_SIZE)?;
    let mut seed = [0u8; SECRET_SEED_SIZE];
    seed.copy_from_slice(&bytes);
    Ok(seed)
}

#[cfg(all(test, feature = "sha2"))]
mod tests {
    use super::*;
    use crate::hashing::{install_sha512, sha512_backend};

    fn setup() {
        install_sha512(sha512_backend);
    }

    #[test]
    fn clamping_shape() {
        setup();
        let key = get_extended_public_key(&[42u8; 32]).unwrap();
        assert_eq!(key.head[0] & 7, 0, "low 3 bits cleared");
        assert_eq!(key.head[31] & 128, 0, "bit 255 cleared");
        assert_eq!(key.head[31] & 64, 64, "bit 254 set");
    }

    #[test]
    fn signing_is_deterministic() {
        setup();
        let seed = [9u8; 32];
        let sig1 = sign(b"determinism", &seed).unwrap();
        let sig2 = sign(b"determinism", &seed).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn sign_verify_cycle_both_modes() {
        setup();
        let seed = generate_seed().unwrap();
        let pubkey = get_public_key(&seed).unwrap();
        let msg = b"engine round trip";
        let sig = sign(&msg[..], &seed).unwrap();
        assert!(verify(&sig, &msg[..], &pubkey, VerifyOptions::default()).unwrap());
        assert!(verify(&sig, &msg[..], &pubkey, VerifyOptions { zip215: false }).unwrap());
    }

    #[test]
    fn wrong_key_rejected() {
        setup();
        let sig = sign(b"msg", &[1u8; 32]).unwrap();
        let other = get_public_key(&[2u8; 32]).unwrap();
        assert!(!verify(&sig, b"msg", &other, VerifyOptions::default()).unwrap());
    }

    #[test]
    fn malformed_inputs_verify_false_not_error() {
        setup();
        let seed = [3u8; 32];
        let pubkey = get_public_key(&seed).unwrap();
        let sig = sign(b"x", &seed).unwrap();

        // wrong lengths
        assert!(!verify(&sig[..63], b"x", &pubkey, VerifyOptions::default()).unwrap());
        assert!(!verify(&sig, b"x", &pubkey[..31], VerifyOptions::default()).unwrap());
        // odd-length hex
        assert!(!verify("abc", b"x", &pubkey, VerifyOptions::default()).unwrap());
    }

    #[test]
    fn hex_and_byte_inputs_agree() {
        setup();
        let seed = [7u8; 32];
        let seed_hex = crate::codec::bytes_to_hex(&seed);
        assert_eq!(
            get_public_key(&seed).unwrap(),
            get_public_key(seed_hex.as_str()).unwrap()
        );
        assert_eq!(
            sign(b"same", &seed).unwrap(),
            sign("73616d65", seed_hex.as_str()).unwrap()
        );
    }

    #[test]
    fn seed_length_is_enforced() {
        setup();
        assert!(matches!(
            get_public_key(&[0u8; 16][..]),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            sign(b"m", &[0u8; 33][..]),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn extended_key_matches_public_key() {
        setup();
        let seed = [11u8; 32];
        let extended = get_extended_public_key(&seed).unwrap();
        assert_eq!(extended.point_bytes, get_public_key(&seed).unwrap());
        assert_eq!(
            extended.point.to_bytes().unwrap(),
            extended.point_bytes
        );
    }
}
