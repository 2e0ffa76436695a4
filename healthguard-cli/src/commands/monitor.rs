//! Live vitals: start the device simulation, poll, stop on exit

use super::enter;
use crate::display;
use anyhow::Result;
use healthguard_client::{AppContext, Route};
use std::time::Duration;
use tracing::warn;

/// Runs until `seconds` elapse (forever when `None`) or Ctrl-C
pub async fn run(ctx: &AppContext, seconds: Option<u64>) -> Result<()> {
    if !enter(ctx, Route::Monitor) {
        return Ok(());
    }
    display::section("Real-time Monitor");
    display::vital_ranges();

    let mut monitor = ctx.monitor();
    if let Err(e) = monitor.start().await {
        display::error(&format!("Could not start monitoring: {}", e));
        return Err(super::Reported(e).into());
    }
    display::success("Monitoring started, press Ctrl-C to stop");

    let handle = monitor.handle();
    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    let mut ticker = tokio::time::interval(ctx.config.monitor.interval());
    let mut last_seen = (0, 0);

    loop {
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = handle.snapshot();
                let seen = (snapshot.cycles_ok, snapshot.cycles_failed);
                if seen != last_seen {
                    last_seen = seen;
                    display::vitals_row(&snapshot);
                }
            }
            _ = expired => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let failed = monitor.snapshot().cycles_failed;
    if let Err(e) = monitor.stop().await {
        warn!("device stop failed: {}", e);
        display::warning("Polling stopped, but the device did not confirm");
    } else {
        display::info("Monitoring stopped");
    }
    if failed > 0 {
        display::warning(&format!("{} polls failed during this session", failed));
    }
    Ok(())
}
