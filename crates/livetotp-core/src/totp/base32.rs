//! RFC 4648 Base32 secrets without padding.
//!
//! Encoding and the bit work of decoding go through the `base32` crate.
//! Decoding is lenient by default: characters outside the alphabet are
//! filtered out before the crate sees the text, and trailing bits that do not
//! fill a byte are dropped. [`decode_strict`] is the opt-in variant that
//! refuses foreign characters.

use base32::Alphabet;

use crate::totp::types::*;

/// The 32-symbol RFC 4648 alphabet.
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const RFC4648: Alphabet = Alphabet::Rfc4648 { padding: false };

/// Number of symbols produced for `byte_len` input bytes (`ceil(8n / 5)`).
pub fn encoded_len(byte_len: usize) -> usize {
    (byte_len * 8 + 4) / 5
}

/// Encode bytes as unpadded uppercase Base32.
pub fn encode(bytes: &[u8]) -> String {
    base32::encode(RFC4648, bytes)
}

/// `true` for `A–Z`, `a–z`, `2–7`.
fn is_symbol(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A'..='Z' | '2'..='7')
}

/// Lenient decode: unknown characters (padding, spaces, dashes, anything
/// else) are ignored. Never fails.
pub fn decode(text: &str) -> Vec<u8> {
    let cleaned: String = text
        .chars()
        .filter(|&c| is_symbol(c))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let skipped = text.chars().count() - cleaned.len();
    if skipped > 0 {
        log::warn!("Base32 decode skipped {} character(s) outside the alphabet", skipped);
    }
    decode_clean(&cleaned)
}

/// Strict decode: any character outside `A–Z`, `a–z`, `2–7` is an error.
pub fn decode_strict(text: &str) -> TotpResult<Vec<u8>> {
    if let Some((pos, c)) = text.char_indices().find(|&(_, c)| !is_symbol(c)) {
        return Err(TotpError::malformed_secret("Secret contains a non-Base32 character")
            .with_detail(format!("{:?} at byte {}", c, pos)));
    }
    Ok(decode_clean(&text.to_ascii_uppercase()))
}

/// `true` if every character is in the alphabet (case-insensitive) and the
/// text is non-empty.
pub fn is_valid_base32(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_symbol)
}

/// `cleaned` holds only uppercase alphabet symbols, which the crate always
/// accepts without padding.
fn decode_clean(cleaned: &str) -> Vec<u8> {
    base32::decode(RFC4648, cleaned).unwrap_or_default()
}
