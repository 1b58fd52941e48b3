//! Shared-secret generation.

use zeroize::Zeroizing;

use crate::totp::base32;
use crate::totp::provider::{OsRandom, RandomSource};
use crate::totp::types::*;

/// Produces Base32 secrets from a secure random source.
#[derive(Debug, Clone, Default)]
pub struct SecretGenerator<R = OsRandom> {
    source: R,
}

impl SecretGenerator<OsRandom> {
    /// Generator backed by the operating-system CSPRNG.
    pub fn new() -> Self {
        Self { source: OsRandom }
    }
}

impl<R: RandomSource> SecretGenerator<R> {
    pub fn with_source(source: R) -> Self {
        Self { source }
    }

    /// Draw `byte_length` random bytes and return them Base32-encoded.
    ///
    /// The raw bytes never leave this function and are wiped on every exit
    /// path. A zero length yields an empty string without touching the random
    /// source.
    pub fn generate(&mut self, byte_length: usize) -> TotpResult<String> {
        if byte_length == 0 {
            return Ok(String::new());
        }
        let mut raw = Zeroizing::new(vec![0u8; byte_length]);
        self.source.fill(&mut raw)?;
        let encoded = base32::encode(&raw);
        log::debug!("Generated {}-byte secret ({} symbols)", byte_length, encoded.len());
        Ok(encoded)
    }

    /// Generate a secret of the configured length.
    pub fn generate_with(&mut self, config: &TotpConfig) -> TotpResult<String> {
        self.generate(config.secret_bytes)
    }
}

/// Generate a cryptographically-random Base32 secret of `byte_length` bytes.
pub fn generate_secret(byte_length: usize) -> TotpResult<String> {
    SecretGenerator::new().generate(byte_length)
}
