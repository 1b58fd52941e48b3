//! Library-level command surface for display layers.
//!
//! Thin wrappers with optional arguments that fill in the defaults and
//! delegate to the generator and the engine.

use crate::totp::core::{current_unix_millis, TotpEngine};
use crate::totp::secret::SecretGenerator;
use crate::totp::types::*;

/// Generate a new Base32 secret (default 32 random bytes).
pub fn totp_generate_secret(byte_length: Option<usize>) -> TotpResult<String> {
    SecretGenerator::new().generate(byte_length.unwrap_or(DEFAULT_SECRET_BYTES))
}

/// Compute the code for `secret`.
///
/// `step_seconds` defaults to 30 and `at_unix_millis` to now. With `trace`
/// set, the response carries the full computation trace. The returned code
/// is always the canonical six-digit form.
pub fn totp_compute_code(
    secret: &str,
    step_seconds: Option<u64>,
    at_unix_millis: Option<u64>,
    trace: bool,
) -> TotpResult<CodeResponse> {
    let engine = TotpEngine::new();
    let period = step_seconds.unwrap_or(DEFAULT_PERIOD);
    let at = at_unix_millis.unwrap_or_else(current_unix_millis);
    if trace {
        let (code, trace) = engine.compute_code_traced(secret, period, at)?;
        Ok(CodeResponse::Traced {
            code: code.into_string(),
            trace,
        })
    } else {
        let code = engine.compute_code(secret, period, at)?;
        Ok(CodeResponse::Code(code.into_string()))
    }
}
