//! Daily reset scheduler
//!
//! The day rolls over at a configured local hour (06:00 by default), not
//! midnight. When the boundary fires on date D, the cycle that just ended
//! is calendar day D-1: users with a completion dated D-1 extend their
//! streak, everyone else breaks it. A missed boundary (daemon was down) is
//! caught up once at startup.

use crate::server::AppState;
use chrono::{Duration, Local, NaiveDate, NaiveTime, Timelike};
use std::sync::Arc;
use tracing::{error, info};

/// Date of the most recently *finished* cycle as of `now`: yesterday once
/// the reset hour has passed, the day before otherwise.
fn finished_cycle_day(now: chrono::DateTime<Local>, reset_hour: u32) -> NaiveDate {
    let today = now.date_naive();
    if now.time().hour() >= reset_hour {
        today - Duration::days(1)
    } else {
        today - Duration::days(2)
    }
}

/// Seconds until the next reset boundary.
fn until_next_boundary(now: chrono::DateTime<Local>, reset_hour: u32) -> std::time::Duration {
    // Clamp out-of-range config values; from_hms_opt is total after that.
    let boundary_time = NaiveTime::from_hms_opt(reset_hour.min(23), 0, 0).unwrap_or_default();
    let today_boundary = now.date_naive().and_time(boundary_time);
    let next = if now.naive_local() < today_boundary {
        today_boundary
    } else {
        today_boundary + Duration::days(1)
    };
    (next - now.naive_local())
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60))
}

/// Run the reset loop forever. Spawned as a background task.
pub async fn run(state: Arc<AppState>, reset_hour: u32) {
    // Catch up a boundary missed while the daemon was down.
    catch_up(&state, reset_hour).await;

    loop {
        let sleep_for = until_next_boundary(Local::now(), reset_hour);
        info!("Next daily reset in {}s", sleep_for.as_secs());
        tokio::time::sleep(sleep_for).await;

        let cycle_day = finished_cycle_day(Local::now(), reset_hour);
        let mut store = state.store.lock().await;
        match store.run_daily_reset(cycle_day) {
            Ok(extended) => info!("Reset done for {}: {} streaks extended", cycle_day, extended),
            Err(e) => error!("Daily reset failed for {}: {}", cycle_day, e),
        }
    }
}

async fn catch_up(state: &Arc<AppState>, reset_hour: u32) {
    let expected = finished_cycle_day(Local::now(), reset_hour);
    let mut store = state.store.lock().await;
    match store.last_reset_date() {
        Ok(last) if last < Some(expected) => {
            info!("Catching up missed reset for {}", expected);
            if let Err(e) = store.run_daily_reset(expected) {
                error!("Catch-up reset failed: {}", e);
            }
        }
        Ok(_) => {}
        Err(e) => error!("Cannot read last reset date: {}", e),
    }
}
