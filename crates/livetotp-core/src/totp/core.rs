//! Core OTP derivation — RFC 4226 (HOTP) and RFC 6238 (TOTP), HMAC-SHA1.
//!
//! Every call is a pure function of (secret, time step, timestamp); the
//! engine holds only its configuration and hash provider.

use zeroize::Zeroizing;

use crate::totp::base32;
use crate::totp::provider::{HmacSha1, KeyedHasher};
use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Dynamic truncation (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Returns `(offset, truncated)`: the low nibble of the last digest byte and
/// the 31-bit big-endian value read from the four bytes at that offset.
pub fn dynamic_truncate(digest: &HmacDigest) -> (usize, u32) {
    let offset = (digest[DIGEST_LEN - 1] & 0x0f) as usize;
    let truncated = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    (offset, truncated)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `floor(unix_millis / 1000 / period)`.
pub fn time_counter_at(unix_millis: u64, period: u64) -> TotpResult<u64> {
    if period == 0 {
        return Err(TotpError::invalid_period(period));
    }
    Ok(unix_millis / 1000 / period)
}

/// Seconds until the current step expires, in `1..=period`.
pub fn seconds_remaining_at(unix_seconds: u64, period: u64) -> TotpResult<u64> {
    if period == 0 {
        return Err(TotpError::invalid_period(period));
    }
    Ok(period - (unix_seconds % period))
}

/// Elapsed fraction of the current step (0.0 = fresh code, approaching 1.0 = about to expire).
pub fn progress_fraction_at(unix_seconds: u64, period: u64) -> TotpResult<f64> {
    if period == 0 {
        return Err(TotpError::invalid_period(period));
    }
    Ok((unix_seconds % period) as f64 / period as f64)
}

/// Current unix timestamp in milliseconds.
pub fn current_unix_millis() -> u64 {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Output of one HOTP evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotpOutput {
    pub digest: HmacDigest,
    pub offset: usize,
    pub truncated: u32,
    pub code: OtpCode,
}

/// Derives six-digit codes from Base32 secrets.
#[derive(Debug, Clone, Default)]
pub struct TotpEngine<H = HmacSha1> {
    hasher: H,
    config: TotpConfig,
}

impl TotpEngine<HmacSha1> {
    /// Engine with default configuration and the RustCrypto HMAC-SHA1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: KeyedHasher> TotpEngine<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            hasher,
            config: TotpConfig::default(),
        }
    }

    /// Builder: replace the configuration.
    pub fn with_config(mut self, config: TotpConfig) -> TotpResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &TotpConfig {
        &self.config
    }

    /// Decode a secret according to the configured strictness. The key is
    /// wiped when dropped.
    pub fn decode_secret(&self, secret: &str) -> TotpResult<Zeroizing<Vec<u8>>> {
        let key = Zeroizing::new(if self.config.strict_decode {
            base32::decode_strict(secret)?
        } else {
            base32::decode(secret)
        });
        if key.is_empty() {
            if self.config.reject_empty_secret {
                return Err(TotpError::new(
                    TotpErrorKind::EmptySecret,
                    "Secret decodes to zero bytes",
                ));
            }
            log::warn!("Keying HMAC with an empty secret");
        }
        Ok(key)
    }

    /// RFC 4226 HOTP for raw key bytes and an explicit counter.
    pub fn hotp(&self, key: &[u8], counter: u64) -> TotpResult<HotpOutput> {
        let digest = self.hasher.hmac_sha1(key, &counter.to_be_bytes())?;
        let (offset, truncated) = dynamic_truncate(&digest);
        Ok(HotpOutput {
            digest,
            offset,
            truncated,
            code: OtpCode::from_truncated(truncated),
        })
    }

    /// Code for `secret` at `at_unix_millis` with an explicit time step.
    pub fn compute_code(
        &self,
        secret: &str,
        period: u64,
        at_unix_millis: u64,
    ) -> TotpResult<OtpCode> {
        let key = self.decode_secret(secret)?;
        let counter = time_counter_at(at_unix_millis, period)?;
        Ok(self.hotp(&key, counter)?.code)
    }

    /// Like [`compute_code`](Self::compute_code), also returning every
    /// intermediate value.
    pub fn compute_code_traced(
        &self,
        secret: &str,
        period: u64,
        at_unix_millis: u64,
    ) -> TotpResult<(OtpCode, ComputationTrace)> {
        let key = self.decode_secret(secret)?;
        let counter = time_counter_at(at_unix_millis, period)?;
        log::debug!("Tracing derivation at counter {} (step {}s)", counter, period);
        let out = self.hotp(&key, counter)?;
        let trace = ComputationTrace::new(
            at_unix_millis,
            period,
            counter,
            key.len(),
            out.digest,
            out.offset,
            out.truncated,
            &out.code,
        );
        Ok((out.code, trace))
    }

    /// Code at an explicit timestamp using the configured time step.
    pub fn code_at(&self, secret: &str, at_unix_millis: u64) -> TotpResult<OtpCode> {
        self.compute_code(secret, self.config.period, at_unix_millis)
    }

    /// Code for the current wall-clock time using the configured time step.
    pub fn current_code(&self, secret: &str) -> TotpResult<OtpCode> {
        self.code_at(secret, current_unix_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── RFC 4226 / 6238 test vectors ─────────────────────────────
    // Secret: "12345678901234567890" (ASCII) → base32: GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ

    const RFC_KEY: &[u8] = b"12345678901234567890";
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc4226_hotp_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        let engine = TotpEngine::new();
        for (counter, exp) in expected.iter().enumerate() {
            let out = engine.hotp(RFC_KEY, counter as u64).unwrap();
            assert_eq!(out.code.as_str(), *exp, "HOTP mismatch at counter {}", counter);
        }
    }

    #[test]
    fn rfc4226_intermediate_values() {
        // Appendix D: counter 0 → truncated 0x4c93cf18.
        let out = TotpEngine::new().hotp(RFC_KEY, 0).unwrap();
        assert_eq!(hex::encode(out.digest), "cc93cf18508d94934c64b65d8ba7667fb7cde4b0");
        assert_eq!(out.truncated, 0x4c93cf18);
        assert_eq!(out.offset, 0);
    }

    #[test]
    fn rfc6238_sha1_at_59() {
        let code = TotpEngine::new().compute_code(RFC_SECRET, 30, 59_000).unwrap();
        assert_eq!(code.as_str(), "287082");
    }

    #[test]
    fn rfc6238_sha1_large_times() {
        // Six-digit suffixes of the RFC 6238 Appendix B eight-digit codes.
        let engine = TotpEngine::new();
        let cases = [
            (1_111_111_109u64, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
            (20_000_000_000, "353130"),
        ];
        for (secs, exp) in cases {
            let code = engine.compute_code(RFC_SECRET, 30, secs * 1000).unwrap();
            assert_eq!(code.as_str(), exp, "TOTP mismatch at T={}", secs);
        }
    }

    #[test]
    fn counter_beyond_32_bits() {
        // 2^32 * 30 seconds: counter needs the high word.
        let secs = (1u64 << 32) * 30;
        assert_eq!(time_counter_at(secs * 1000, 30).unwrap(), 1u64 << 32);
        let (_, trace) = TotpEngine::new()
            .compute_code_traced(RFC_SECRET, 30, secs * 1000)
            .unwrap();
        assert_eq!(trace.counter_bytes(), [0, 0, 0, 1, 0, 0, 0, 0]);
    }

    // ── Time helpers ─────────────────────────────────────────────

    #[test]
    fn time_counter_calculation() {
        assert_eq!(time_counter_at(0, 30).unwrap(), 0);
        assert_eq!(time_counter_at(29_999, 30).unwrap(), 0);
        assert_eq!(time_counter_at(30_000, 30).unwrap(), 1);
        assert_eq!(time_counter_at(59_999, 30).unwrap(), 1);
        assert_eq!(time_counter_at(60_000, 60).unwrap(), 1);
    }

    #[test]
    fn zero_period_rejected() {
        assert_eq!(time_counter_at(1, 0).unwrap_err().kind, TotpErrorKind::InvalidPeriod);
        assert!(seconds_remaining_at(1, 0).is_err());
        assert!(progress_fraction_at(1, 0).is_err());
        let err = TotpEngine::new().compute_code(RFC_SECRET, 0, 59_000).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidPeriod);
    }

    #[test]
    fn seconds_remaining_calculation() {
        assert_eq!(seconds_remaining_at(0, 30).unwrap(), 30);
        assert_eq!(seconds_remaining_at(1, 30).unwrap(), 29);
        assert_eq!(seconds_remaining_at(29, 30).unwrap(), 1);
        assert_eq!(seconds_remaining_at(30, 30).unwrap(), 30);
    }

    #[test]
    fn progress_fraction_calculation() {
        let p = progress_fraction_at(0, 30).unwrap();
        assert!(p.abs() < 1e-9);
        let p = progress_fraction_at(15, 30).unwrap();
        assert!((p - 0.5).abs() < 1e-9);
    }

    // ── Trace ────────────────────────────────────────────────────

    #[test]
    fn trace_matches_code() {
        let engine = TotpEngine::new();
        let (code, trace) = engine.compute_code_traced(RFC_SECRET, 30, 59_000).unwrap();
        assert_eq!(code.as_str(), "287082");
        assert_eq!(trace.code(), &code);
        assert_eq!(trace.display_code(), "287 082");
        assert_eq!(trace.unix_millis(), 59_000);
        assert_eq!(trace.unix_time(), 59);
        assert_eq!(trace.time_counter(), 1);
        assert_eq!(trace.period(), 30);
        assert_eq!(trace.secret_bytes(), 20);
        assert_eq!(trace.hmac_hex(), hex::encode(trace.digest()));
        assert!(trace.offset() <= 15);
        assert_eq!(trace.truncated_code() % 1_000_000, 287_082);

        let plain = engine.compute_code(RFC_SECRET, 30, 59_000).unwrap();
        assert_eq!(plain, code);
    }

    // ── Secret handling ──────────────────────────────────────────

    #[test]
    fn empty_secret_is_keyed() {
        let code = TotpEngine::new().compute_code("", 30, 59_000).unwrap();
        assert_eq!(code.as_str().len(), 6);
    }

    #[test]
    fn empty_secret_rejected_when_configured() {
        let engine = TotpEngine::new()
            .with_config(TotpConfig::new().reject_empty_secret())
            .unwrap();
        let err = engine.compute_code("!!!", 30, 59_000).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::EmptySecret);
    }

    #[test]
    fn decoded_key_is_wiped_on_drop() {
        let key: Zeroizing<Vec<u8>> = TotpEngine::new().decode_secret(RFC_SECRET).unwrap();
        assert_eq!(key.as_slice(), RFC_KEY);
    }

    #[test]
    fn lenient_secret_decoding() {
        let engine = TotpEngine::new();
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(
            engine.compute_code(spaced, 30, 59_000).unwrap(),
            engine.compute_code(RFC_SECRET, 30, 59_000).unwrap()
        );
    }

    #[test]
    fn strict_secret_decoding() {
        let engine = TotpEngine::new().with_config(TotpConfig::new().strict()).unwrap();
        assert!(engine.compute_code(RFC_SECRET, 30, 59_000).is_ok());
        let err = engine.compute_code("GEZD-GNBV", 30, 59_000).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::MalformedSecret);
    }

    #[test]
    fn invalid_config_rejected() {
        let err = TotpEngine::new()
            .with_config(TotpConfig::new().with_period(0))
            .unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidPeriod);
    }

    #[test]
    fn configured_period_used() {
        let engine = TotpEngine::new()
            .with_config(TotpConfig::new().with_period(60))
            .unwrap();
        // 119 s at 60 s steps → counter 1 → same as 59 s at 30 s steps.
        assert_eq!(engine.code_at(RFC_SECRET, 119_000).unwrap().as_str(), "287082");
    }

    #[test]
    fn current_code_is_six_digits() {
        let code = TotpEngine::new().current_code(RFC_SECRET).unwrap();
        assert_eq!(code.as_str().len(), 6);
        assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
    }

    // ── Injected providers ───────────────────────────────────────

    struct FixedHasher(HmacDigest);

    impl KeyedHasher for FixedHasher {
        fn hmac_sha1(&self, _key: &[u8], _message: &[u8]) -> TotpResult<HmacDigest> {
            Ok(self.0)
        }
    }

    struct FailingHasher;

    impl KeyedHasher for FailingHasher {
        fn hmac_sha1(&self, _key: &[u8], _message: &[u8]) -> TotpResult<HmacDigest> {
            Err(TotpError::crypto_failure("HMAC unavailable"))
        }
    }

    #[test]
    fn truncation_at_max_offset() {
        let mut digest = [0u8; DIGEST_LEN];
        digest[15..19].copy_from_slice(&[0xff, 0x00, 0x00, 0x01]);
        digest[19] = 0x0f;
        let engine = TotpEngine::with_hasher(FixedHasher(digest));
        let out = engine.hotp(b"k", 0).unwrap();
        assert_eq!(out.offset, 15);
        // High bit of the first byte is masked off.
        assert_eq!(out.truncated, 0x7f00_0001);
        assert_eq!(out.code.as_str(), (0x7f00_0001u32 % 1_000_000).to_string());
    }

    #[test]
    fn small_truncated_value_zero_padded() {
        let mut digest = [0u8; DIGEST_LEN];
        digest[3] = 0x2a;
        let engine = TotpEngine::with_hasher(FixedHasher(digest));
        assert_eq!(engine.hotp(b"k", 0).unwrap().code.as_str(), "000042");
    }

    #[test]
    fn hash_failure_propagates() {
        let engine = TotpEngine::with_hasher(FailingHasher);
        let err = engine.compute_code(RFC_SECRET, 30, 0).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::CryptoPrimitiveFailure);
        assert!(engine.compute_code_traced(RFC_SECRET, 30, 0).is_err());
    }

    // ── Laws ─────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn same_step_same_code(step in 0u64..100_000_000, a in 0u64..30_000, b in 0u64..30_000) {
            let engine = TotpEngine::new();
            let base = step * 30_000;
            prop_assert_eq!(
                engine.compute_code(RFC_SECRET, 30, base + a).unwrap(),
                engine.compute_code(RFC_SECRET, 30, base + b).unwrap()
            );
        }

        #[test]
        fn code_format(millis in any::<u64>(), period in 1u64..3600) {
            let code = TotpEngine::new().compute_code(RFC_SECRET, period, millis).unwrap();
            prop_assert_eq!(code.as_str().len(), 6);
            prop_assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        }

        #[test]
        fn offset_in_bounds(digest in any::<[u8; 20]>()) {
            let (offset, truncated) = dynamic_truncate(&digest);
            prop_assert!(offset <= 15);
            prop_assert!(truncated <= 0x7fff_ffff);
        }
    }
}
