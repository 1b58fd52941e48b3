//! Capabilities the core depends on: a secure random source and a keyed hash.
//!
//! The generator and the engine are generic over these traits so tests can
//! substitute deterministic implementations.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;

use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Random source
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Source of cryptographically secure random bytes.
pub trait RandomSource {
    /// Fill `buf` completely or fail. Implementations must never fall back
    /// to a non-cryptographic generator.
    fn fill(&mut self, buf: &mut [u8]) -> TotpResult<()>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> TotpResult<()> {
        OsRng.try_fill_bytes(buf).map_err(|e| {
            TotpError::random_unavailable("OS random source failed").with_detail(e.to_string())
        })
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn fill(&mut self, buf: &mut [u8]) -> TotpResult<()> {
        (**self).fill(buf)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Keyed hash
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// HMAC-SHA1 provider (RFC 2104).
pub trait KeyedHasher {
    /// `HMAC-SHA1(key, message)`. Keys of any length, including empty, are valid.
    fn hmac_sha1(&self, key: &[u8], message: &[u8]) -> TotpResult<HmacDigest>;
}

/// RustCrypto HMAC-SHA1.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1;

impl KeyedHasher for HmacSha1 {
    fn hmac_sha1(&self, key: &[u8], message: &[u8]) -> TotpResult<HmacDigest> {
        let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|e| {
            TotpError::crypto_failure("HMAC-SHA1 keying failed").with_detail(e.to_string())
        })?;
        mac.update(message);
        let bytes = mac.finalize().into_bytes();
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&bytes);
        Ok(digest)
    }
}

impl<H: KeyedHasher + ?Sized> KeyedHasher for &H {
    fn hmac_sha1(&self, key: &[u8], message: &[u8]) -> TotpResult<HmacDigest> {
        (**self).hmac_sha1(key, message)
    }
}
