//! Periodic refresh loop.
//!
//! The core has no clock; this module polls once per second, recomputes the
//! code only when the time counter moves, and stops on Ctrl-C.

use std::io::Write;
use std::time::Duration;

use livetotp_core::totp::core::{
    current_unix_millis, progress_fraction_at, seconds_remaining_at, time_counter_at,
};
use livetotp_core::totp::{KeyedHasher, OtpCode, TotpEngine, TotpResult};
use tokio::time::MissedTickBehavior;

use crate::display;

/// What to show for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchFrame {
    pub code: OtpCode,
    /// Seconds until the code changes, `1..=period`.
    pub remaining: u64,
    /// Elapsed fraction of the current step.
    pub progress: f64,
    /// The code was recomputed on this tick.
    pub refreshed: bool,
}

/// Caches the code for the current step and recomputes it on step change.
pub struct Ticker<'a, H> {
    engine: &'a TotpEngine<H>,
    secret: &'a str,
    current: Option<(u64, OtpCode)>,
}

impl<'a, H: KeyedHasher> Ticker<'a, H> {
    pub fn new(engine: &'a TotpEngine<H>, secret: &'a str) -> Self {
        Self {
            engine,
            secret,
            current: None,
        }
    }

    pub fn frame_at(&mut self, unix_millis: u64) -> TotpResult<WatchFrame> {
        let period = self.engine.config().period;
        let counter = time_counter_at(unix_millis, period)?;
        let unix_seconds = unix_millis / 1000;

        let cached = match &self.current {
            Some((cached, code)) if *cached == counter => Some(code.clone()),
            _ => None,
        };
        let (code, refreshed) = match cached {
            Some(code) => (code, false),
            None => {
                let code = self.engine.compute_code(self.secret, period, unix_millis)?;
                tracing::debug!(counter, "code refreshed");
                self.current = Some((counter, code.clone()));
                (code, true)
            }
        };

        Ok(WatchFrame {
            code,
            remaining: seconds_remaining_at(unix_seconds, period)?,
            progress: progress_fraction_at(unix_seconds, period)?,
            refreshed,
        })
    }
}

/// Redraw the countdown every second until Ctrl-C.
pub async fn run<H: KeyedHasher>(engine: &TotpEngine<H>, secret: &str) -> TotpResult<()> {
    let mut ticker = Ticker::new(engine, secret);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(period = engine.config().period, "watching; press Ctrl-C to stop");
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let frame = ticker.frame_at(current_unix_millis())?;
                // Write failures (closed pipe) end the loop like Ctrl-C.
                if write!(stdout, "\r{}", display::render_frame(&frame))
                    .and_then(|()| stdout.flush())
                    .is_err()
                {
                    break;
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }
    let _ = writeln!(stdout);
    tracing::info!("stopped");
    Ok(())
}
