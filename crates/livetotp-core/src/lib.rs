//! # LiveTOTP – Core
//!
//! Pure, stateless time-based one-time password core:
//!
//! - **Base32** – RFC 4648 alphabet, no padding, lenient (or opt-in strict) decoding
//! - **Secrets** – cryptographically random keys from an injectable random source
//! - **RFC 4226 / 6238** – HMAC-SHA1 HOTP with dynamic truncation, keyed by a time counter
//! - **Computation trace** – every intermediate value of a derivation, for explanatory display
//! - **Commands** – the library-level contract consumed by display layers
//!
//! The core owns no clock loop and no state between calls; periodic refresh is
//! the caller's job.

pub mod totp;
