//! Background periodic refresh.

use std::sync::Arc;
use std::time::Duration;

use orbitwatch_core::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::state::AppState;

/// Start the periodic refresh task if an interval is configured.
pub fn start_refresh_worker(state: Arc<AppState>) {
    let secs = state.config.refresh_interval_secs;
    if secs == 0 {
        info!("Periodic refresh disabled");
        return;
    }

    tokio::spawn(async move {
        info!("Periodic refresh worker started (every {}s)", secs);
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already loaded the store.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let limits = state.orchestrator.default_limits();
            match state.orchestrator.refresh(&limits).await {
                Ok(report) => info!(
                    "Periodic refresh stored {} objects (snapshot {})",
                    report.stored, report.snapshot.version
                ),
                Err(Error::RefreshInProgress) => {
                    info!("Periodic refresh skipped: another refresh is running")
                }
                Err(e) => error!("Periodic refresh failed: {}", e),
            }
        }
    });
}
