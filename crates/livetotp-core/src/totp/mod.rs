//! TOTP crate: sub-modules.

pub mod types;
pub mod base32;
pub mod provider;
pub mod secret;
pub mod core;
pub mod commands;

// Re-export top-level items for convenience.
pub use types::*;
pub use provider::{HmacSha1, KeyedHasher, OsRandom, RandomSource};
pub use secret::{generate_secret, SecretGenerator};
pub use self::core::TotpEngine;
pub use commands::*;
