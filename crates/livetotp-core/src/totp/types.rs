//! Core types for the TOTP core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default byte length of a generated secret.
pub const DEFAULT_SECRET_BYTES: usize = 32;
/// Default time step in seconds (RFC 6238 §5.2).
pub const DEFAULT_PERIOD: u64 = 30;
/// Number of decimal digits in a code.
pub const CODE_DIGITS: usize = 6;
/// `10^CODE_DIGITS`.
pub const CODE_MODULUS: u32 = 1_000_000;
/// HMAC-SHA1 output size.
pub const DIGEST_LEN: usize = 20;

/// Raw HMAC-SHA1 output.
pub type HmacDigest = [u8; DIGEST_LEN];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    /// The secure random source is missing or failed.
    RandomSourceUnavailable,
    /// The HMAC primitive could not be keyed or run.
    CryptoPrimitiveFailure,
    /// Strict decoding met a character outside the Base32 alphabet.
    MalformedSecret,
    /// The secret decoded to zero bytes and empty secrets are rejected.
    EmptySecret,
    /// Time step of zero seconds.
    InvalidPeriod,
    /// Configuration or other caller input could not be parsed.
    InvalidInput,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

pub type TotpResult<T> = Result<T, TotpError>;

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn random_unavailable(msg: impl Into<String>) -> Self {
        Self::new(TotpErrorKind::RandomSourceUnavailable, msg)
    }

    pub fn crypto_failure(msg: impl Into<String>) -> Self {
        Self::new(TotpErrorKind::CryptoPrimitiveFailure, msg)
    }

    pub fn malformed_secret(msg: impl Into<String>) -> Self {
        Self::new(TotpErrorKind::MalformedSecret, msg)
    }

    pub fn invalid_period(period: u64) -> Self {
        Self::new(
            TotpErrorKind::InvalidPeriod,
            format!("Time step must be at least 1 second, got {}", period),
        )
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP code
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A six-digit, zero-padded one-time code.
///
/// The canonical value is the bare digit string; [`OtpCode::spaced`] is the
/// display variant with a space after the third digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Build a code from a truncated HOTP value (`value mod 10^6`, zero-padded).
    pub fn from_truncated(truncated: u32) -> Self {
        let code = truncated % CODE_MODULUS;
        Self(format!("{:0>width$}", code, width = CODE_DIGITS))
    }

    /// Canonical six-digit form, e.g. `"012345"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form, e.g. `"012 345"`.
    pub fn spaced(&self) -> String {
        let (head, tail) = self.0.split_at(CODE_DIGITS / 2);
        format!("{} {}", head, tail)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Computation trace
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot of every intermediate value of one code derivation.
///
/// Built once by the engine and never mutated; all fields are read-only
/// through the accessors so a rendered trace always matches its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationTrace {
    current_time: DateTime<Utc>,
    unix_millis: u64,
    unix_time: u64,
    period: u64,
    time_counter: u64,
    counter_bytes: [u8; 8],
    secret_bytes: usize,
    digest: HmacDigest,
    hmac: String,
    offset: usize,
    truncated_code: u32,
    raw_otp: OtpCode,
    otp: String,
}

impl ComputationTrace {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        unix_millis: u64,
        period: u64,
        time_counter: u64,
        secret_bytes: usize,
        digest: HmacDigest,
        offset: usize,
        truncated_code: u32,
        code: &OtpCode,
    ) -> Self {
        let current_time = i64::try_from(unix_millis)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            current_time,
            unix_millis,
            unix_time: unix_millis / 1000,
            period,
            time_counter,
            counter_bytes: time_counter.to_be_bytes(),
            secret_bytes,
            digest,
            hmac: hex::encode(digest),
            offset,
            truncated_code,
            raw_otp: code.clone(),
            otp: code.spaced(),
        }
    }

    /// Wall-clock instant the code was derived for.
    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    pub fn unix_millis(&self) -> u64 {
        self.unix_millis
    }

    pub fn unix_time(&self) -> u64 {
        self.unix_time
    }

    /// Time step in seconds.
    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn time_counter(&self) -> u64 {
        self.time_counter
    }

    /// Big-endian HOTP message.
    pub fn counter_bytes(&self) -> [u8; 8] {
        self.counter_bytes
    }

    /// Length of the decoded secret in bytes.
    pub fn secret_bytes(&self) -> usize {
        self.secret_bytes
    }

    pub fn digest(&self) -> &HmacDigest {
        &self.digest
    }

    /// Lowercase hex of the digest.
    pub fn hmac_hex(&self) -> &str {
        &self.hmac
    }

    /// Dynamic-truncation offset, always in `0..=15`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 31-bit value before the modulo.
    pub fn truncated_code(&self) -> u32 {
        self.truncated_code
    }

    pub fn code(&self) -> &OtpCode {
        &self.raw_otp
    }

    /// Spaced display form of the code.
    pub fn display_code(&self) -> &str {
        &self.otp
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tunables shared by the generator and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TotpConfig {
    /// Time step in seconds. Default: 30.
    pub period: u64,
    /// Byte length of generated secrets. Default: 32.
    pub secret_bytes: usize,
    /// Reject secrets containing characters outside `A–Z2–7`.
    pub strict_decode: bool,
    /// Reject secrets that decode to zero bytes.
    pub reject_empty_secret: bool,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            secret_bytes: DEFAULT_SECRET_BYTES,
            strict_decode: false,
            reject_empty_secret: false,
        }
    }
}

impl TotpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set time step.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Builder: set generated secret length.
    pub fn with_secret_bytes(mut self, secret_bytes: usize) -> Self {
        self.secret_bytes = secret_bytes;
        self
    }

    /// Builder: enable strict Base32 decoding.
    pub fn strict(mut self) -> Self {
        self.strict_decode = true;
        self
    }

    /// Builder: reject secrets that decode to nothing.
    pub fn reject_empty_secret(mut self) -> Self {
        self.reject_empty_secret = true;
        self
    }

    pub fn validate(&self) -> TotpResult<()> {
        if self.period == 0 {
            return Err(TotpError::invalid_period(self.period));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> TotpResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidInput, "Invalid TOTP config JSON")
                .with_detail(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Command response
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of `totp_compute_code`: a bare code, or a code with its trace.
///
/// Serialises untagged, i.e. as `"123456"` or `{"code": "123456", "trace": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeResponse {
    Traced { code: String, trace: ComputationTrace },
    Code(String),
}

impl CodeResponse {
    pub fn code(&self) -> &str {
        match self {
            Self::Code(code) | Self::Traced { code, .. } => code,
        }
    }

    pub fn trace(&self) -> Option<&ComputationTrace> {
        match self {
            Self::Code(_) => None,
            Self::Traced { trace, .. } => Some(trace),
        }
    }
}
