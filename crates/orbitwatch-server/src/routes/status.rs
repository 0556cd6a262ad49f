//! Service status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/status — snapshot identity, catalog size, refresh state.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.orchestrator.snapshots().current();

    let store = state.store.clone();
    let stats = match tokio::task::spawn_blocking(move || store.get_stats()).await {
        Ok(Ok(stats)) => Some(stats),
        Ok(Err(e)) => {
            warn!("Failed to read catalog stats: {}", e);
            None
        }
        Err(e) => {
            warn!("Catalog stats task failed: {}", e);
            None
        }
    };

    Json(serde_json::json!({
        "snapshot": {
            "version": snapshot.version(),
            "epoch": snapshot.epoch().to_rfc3339(),
            "objects": snapshot.len(),
        },
        "catalog": stats,
        "refreshRunning": state.orchestrator.is_running(),
        "refreshIntervalSecs": state.config.refresh_interval_secs,
        "lastRefresh": state.orchestrator.last_report(),
    }))
}
