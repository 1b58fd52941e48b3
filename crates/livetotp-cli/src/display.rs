//! Text rendering: enrollment URIs, the derivation walkthrough, and the
//! countdown line.

use livetotp_core::totp::{ComputationTrace, DIGEST_LEN};
use url::Url;

use crate::watch::WatchFrame;

/// Width of the countdown bar in cells.
const BAR_WIDTH: usize = 30;

/// `otpauth://totp/<label>?secret=<secret>&issuer=<issuer>` for authenticator apps.
pub fn enrollment_uri(label: &str, issuer: &str, secret: &str) -> Result<String, url::ParseError> {
    let mut uri = Url::parse("otpauth://totp/")?;
    uri.set_path(&format!("/{}", label));
    uri.query_pairs_mut()
        .append_pair("secret", secret)
        .append_pair("issuer", issuer);
    Ok(uri.into())
}

/// Multi-line walkthrough of one derivation.
pub fn render_trace(secret: &str, trace: &ComputationTrace) -> String {
    let offset = trace.offset();
    // A trace deserialised from JSON may carry an offset past the digest.
    let window = trace
        .digest()
        .get(offset..)
        .and_then(|rest| rest.get(..4))
        .map(hex::encode)
        .unwrap_or_else(|| "????????".to_string());
    let lines = [
        format!("Current time   {}", trace.current_time().to_rfc3339()),
        format!("Unix time      {} s ({} ms)", trace.unix_time(), trace.unix_millis()),
        format!(
            "Time counter   floor({} / {}) = {}",
            trace.unix_time(),
            trace.period(),
            trace.time_counter()
        ),
        format!("Counter bytes  {}", hex::encode(trace.counter_bytes())),
        format!("Secret         {} ({} bytes)", secret, trace.secret_bytes()),
        format!("HMAC-SHA1      {}", trace.hmac_hex()),
        format!(
            "Offset         digest[{}] & 0x0f = {}",
            DIGEST_LEN - 1,
            offset
        ),
        format!(
            "Truncated      {} & 0x7fffffff = {}",
            window,
            trace.truncated_code()
        ),
        format!(
            "Code           {} mod 1000000 = {} ({})",
            trace.truncated_code(),
            trace.code(),
            trace.display_code()
        ),
    ];
    lines.join("\n")
}

/// One countdown line, e.g. `287 082  [██████░░░░]  12s`.
pub fn render_frame(frame: &WatchFrame) -> String {
    let filled = ((1.0 - frame.progress) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{}  [{}{}]  {:>2}s",
        frame.code.spaced(),
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        frame.remaining
    )
}
