//! Command-line surface and configuration resolution.
//!
//! Precedence: flags, then `LIVETOTP_*` environment variables, then the JSON
//! config file, then built-in defaults.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use livetotp_core::totp::{TotpConfig, TotpError, TotpErrorKind, TotpResult};

pub const DEFAULT_ISSUER: &str = "LiveTOTP";
pub const DEFAULT_LABEL: &str = "LiveTOTP";

#[derive(Debug, Parser)]
#[command(name = "livetotp")]
#[command(about = "Time-based one-time passwords (RFC 6238)", long_about = None, version)]
pub struct Cli {
    /// JSON config file (`period`, `secretBytes`, `strictDecode`, `rejectEmptySecret`)
    #[arg(long, global = true, env = "LIVETOTP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Time step in seconds
    #[arg(long, global = true, env = "LIVETOTP_PERIOD")]
    pub period: Option<u64>,

    /// Reject secrets containing characters outside A-Z2-7
    #[arg(long, global = true)]
    pub strict: bool,

    /// Reject secrets that decode to zero bytes
    #[arg(long, global = true)]
    pub reject_empty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new secret and print its enrollment URI
    Generate(EnrollArgs),
    /// Print the code for a secret
    Code {
        #[arg(env = "LIVETOTP_SECRET")]
        secret: String,
        /// Unix time in milliseconds (default: now)
        #[arg(long)]
        at: Option<u64>,
        /// Print as "123 456"
        #[arg(long)]
        spaced: bool,
    },
    /// Walk through every step of the code derivation
    Explain {
        #[arg(env = "LIVETOTP_SECRET")]
        secret: String,
        /// Unix time in milliseconds (default: now)
        #[arg(long)]
        at: Option<u64>,
        /// Emit `{code, trace}` as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the live code with a countdown until Ctrl-C
    Watch {
        /// Existing secret (a new one is generated when omitted)
        #[arg(env = "LIVETOTP_SECRET")]
        secret: Option<String>,
        #[command(flatten)]
        enroll: EnrollArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EnrollArgs {
    /// Secret length in random bytes
    #[arg(long, env = "LIVETOTP_SECRET_BYTES")]
    pub bytes: Option<usize>,

    /// Account label in the otpauth URI
    #[arg(long, env = "LIVETOTP_LABEL", default_value = DEFAULT_LABEL)]
    pub label: String,

    /// Issuer in the otpauth URI
    #[arg(long, env = "LIVETOTP_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,
}

impl Cli {
    /// Build the effective core configuration.
    pub fn resolve_config(&self) -> TotpResult<TotpConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => TotpConfig::default(),
        };
        if let Some(period) = self.period {
            config.period = period;
        }
        if self.strict {
            config.strict_decode = true;
        }
        if self.reject_empty {
            config.reject_empty_secret = true;
        }
        if let Command::Generate(enroll) | Command::Watch { enroll, .. } = &self.command {
            if let Some(bytes) = enroll.bytes {
                config.secret_bytes = bytes;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config_file(path: &Path) -> TotpResult<TotpConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        TotpError::new(
            TotpErrorKind::InvalidInput,
            format!("Cannot read config {}", path.display()),
        )
        .with_detail(e.to_string())
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    TotpConfig::from_json(&text)
}
