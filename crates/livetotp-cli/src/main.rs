mod cli;
mod display;
mod watch;

use std::process::ExitCode;

use clap::Parser;
use livetotp_core::totp::core::current_unix_millis;
use livetotp_core::totp::{
    CodeResponse, SecretGenerator, TotpConfig, TotpEngine, TotpError, TotpErrorKind, TotpResult,
};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, EnrollArgs};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs to stderr, `RUST_LOG`-controlled, defaulting to `info`. Records from
/// the core's `log` calls are bridged in.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> TotpResult<()> {
    let config = cli.resolve_config()?;
    let engine = TotpEngine::new().with_config(config.clone())?;

    match cli.command {
        Command::Generate(enroll) => {
            let secret = new_secret(&config)?;
            print_enrollment(&enroll, &secret)?;
        }
        Command::Code { secret, at, spaced } => {
            let at = at.unwrap_or_else(current_unix_millis);
            let code = engine.code_at(&secret, at)?;
            if spaced {
                println!("{}", code.spaced());
            } else {
                println!("{}", code);
            }
        }
        Command::Explain { secret, at, json } => {
            let at = at.unwrap_or_else(current_unix_millis);
            let (code, trace) = engine.compute_code_traced(&secret, config.period, at)?;
            if json {
                let resp = CodeResponse::Traced {
                    code: code.into_string(),
                    trace,
                };
                let text = serde_json::to_string_pretty(&resp).map_err(|e| {
                    TotpError::new(TotpErrorKind::InvalidInput, "Cannot serialise trace")
                        .with_detail(e.to_string())
                })?;
                println!("{}", text);
            } else {
                println!("{}", display::render_trace(&secret, &trace));
            }
        }
        Command::Watch { secret, enroll } => {
            let secret = match secret {
                Some(secret) => secret,
                None => {
                    let secret = new_secret(&config)?;
                    print_enrollment(&enroll, &secret)?;
                    secret
                }
            };
            watch::run(&engine, &secret).await?;
        }
    }
    Ok(())
}

fn new_secret(config: &TotpConfig) -> TotpResult<String> {
    let secret = SecretGenerator::new().generate_with(config)?;
    tracing::info!(bytes = config.secret_bytes, "generated new secret");
    Ok(secret)
}

fn print_enrollment(enroll: &EnrollArgs, secret: &str) -> TotpResult<()> {
    let uri = display::enrollment_uri(&enroll.label, &enroll.issuer, secret).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidInput, "Cannot build otpauth URI")
            .with_detail(e.to_string())
    })?;
    println!("Secret: {}", secret);
    println!("URI:    {}", uri);
    Ok(())
}
