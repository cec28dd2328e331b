use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use tracing::{error, info};

use backend_application::commands::retention_commands::{cleanup_inventory, cleanup_location};
use backend_application::AppState;

/// Runs the retention sweep every day at the configured local time.
pub async fn schedule_retention(state: AppState) {
    loop {
        let next = next_run_time(
            Local::now(),
            state.config.retention_hour,
            state.config.retention_minute,
        );
        let duration = next.signed_duration_since(Local::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        if let Err(err) = run_retention_sweep(&state).await {
            error!("retention sweep failed: {}", err);
        }
    }
}

/// Deletes expired rows in every known domain and returns the total removed.
/// A failing domain is logged and skipped.
pub async fn run_retention_sweep(state: &AppState) -> Result<u64> {
    let now = state.clock.now();
    let location_cutoff = now - Duration::days(i64::from(state.config.location_retention_days));
    let inventory_cutoff = now - Duration::days(i64::from(state.config.inventory_retention_days));

    let domains = state.association_repo.list_domains().await?;
    let mut deleted = 0;
    let mut failed = 0;
    for domain in &domains {
        match cleanup_location(state, domain, location_cutoff).await {
            Ok(result) => deleted += result.deleted,
            Err(err) => {
                failed += 1;
                error!(domain = %domain, "location retention failed: {}", err);
            }
        }
        match cleanup_inventory(state, domain, inventory_cutoff).await {
            Ok(result) => deleted += result.deleted,
            Err(err) => {
                failed += 1;
                error!(domain = %domain, "inventory retention failed: {}", err);
            }
        }
    }
    info!(
        "retention sweep finished: {} domains, {} rows deleted, {} failures",
        domains.len(),
        deleted,
        failed
    );
    Ok(deleted)
}

/// First occurrence of `hour:minute` strictly after `now`.
pub fn next_run_time(now: DateTime<Local>, hour: u32, minute: u32) -> DateTime<Local> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let mut day = now.date_naive();
    // Bounded: a local time missing on one day exists on the next.
    for _ in 0..3 {
        if let Some(candidate) = Local.from_local_datetime(&day.and_time(time)).earliest() {
            if candidate > now {
                return candidate;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    now + Duration::days(1)
}
